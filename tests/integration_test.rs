use particle_field::benchmark::{BenchmarkHarness, BenchmarkSettings};
use particle_field::config::AppConfig;
use particle_field::particles::{SimulationState, Theme};
use particle_field::render::{DrawCommand, RasterSurface, RecordingSurface};
use particle_field::runtime::{FrameLoop, ParticleField};
use particle_field_hardware::{
    AdaptiveConfigFactory, CapabilityTier, DeviceDetector, FakeHost, FeatureSupport,
};
use particle_field_profiling::{AdaptationSuggestion, UnavailableMemoryProbe};
use std::sync::Arc;
use std::time::Duration;

fn desktop_host() -> FakeHost {
    FakeHost::bare()
        .with_cores(8)
        .with_memory_gb(16.0)
        .with_gpu("RTX 3080")
        .with_screen(3840, 2160, 1.0)
        .with_features(FeatureSupport {
            webgl: true,
            webgl2: true,
            ..FeatureSupport::default()
        })
}

fn laptop_host() -> FakeHost {
    FakeHost::bare().with_cores(2).with_memory_gb(2.0).with_gpu("Intel HD")
}

fn seeded_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.simulation.seed = Some(42);
    config
}

#[test]
fn test_desktop_detects_high_tier() {
    let detector = DeviceDetector::new(Box::new(desktop_host()));
    assert_eq!(detector.tier(), CapabilityTier::High);

    let config = AdaptiveConfigFactory::new().with_conditions(detector.tier(), &detector.runtime_conditions());
    assert_eq!(config.particles.max_count, 150);
    assert_eq!(config.rendering.target_fps, 60);
}

#[test]
fn test_laptop_detects_low_tier() {
    let detector = DeviceDetector::new(Box::new(laptop_host()));
    assert_eq!(detector.tier(), CapabilityTier::Low);

    let config = AdaptiveConfigFactory::new().config_for(detector.tier());
    assert_eq!(config.particles.max_count, 25);
    assert!(config.rendering.target_fps <= 30);
}

#[test]
fn test_async_detection_matches_sync() {
    let detector = Arc::new(DeviceDetector::new(Box::new(desktop_host())));
    let info = Arc::clone(&detector).detect_async().wait().unwrap();
    assert_eq!(&info, detector.detect());
}

#[test]
fn test_field_renders_every_particle() {
    let mut field = ParticleField::new(DeviceDetector::new(Box::new(desktop_host())), &seeded_config());
    let mut surface = RecordingSurface::new(400, 300);
    field.initialize(400, 300).unwrap();
    field.start().unwrap();
    field.pointer().move_to(200.0, 150.0);

    let frames = FrameLoop::new().run(&mut field, &mut surface, Some(5));
    assert_eq!(frames, 5);

    let particles = field.simulation().particles().len();
    assert_eq!(particles, 150);
    let circles = surface
        .last_frame()
        .iter()
        .filter(|command| matches!(command, DrawCommand::FillCircle { .. }))
        .count();
    // 发光开启时每个粒子两个圆
    let per_particle = if field.config().effects.glow { 2 } else { 1 };
    assert_eq!(circles, particles * per_particle);

    for particle in field.simulation().particles() {
        assert!(particle.position.x >= particle.radius && particle.position.x <= 400.0 - particle.radius);
        assert!(particle.position.y >= particle.radius && particle.position.y <= 300.0 - particle.radius);
    }
}

#[test]
fn test_raster_snapshot_has_particles() {
    let mut config = seeded_config();
    config.simulation.theme = Theme::Ember;
    let mut field = ParticleField::new(DeviceDetector::new(Box::new(laptop_host())), &config);
    let mut surface = RasterSurface::new(160, 120);
    field.initialize(160, 120).unwrap();
    field.start().unwrap();
    FrameLoop::new().run(&mut field, &mut surface, Some(3));
    field.stop();

    assert!(surface.painted_pixels() > 0);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("field.png");
    surface.save_png(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_sustained_slow_frames_walk_down_the_tiers() {
    let mut config = seeded_config();
    config.adaptation.cooldown_frames = 10;
    let mut field = ParticleField::with_memory_probe(
        DeviceDetector::new(Box::new(desktop_host())),
        &config,
        Box::new(UnavailableMemoryProbe),
    );
    let mut surface = RecordingSurface::new(320, 240);
    field.initialize(320, 240).unwrap();
    field.start().unwrap();

    let mut tiers = vec![field.tier()];
    for _ in 0..40 {
        // 10fps，远低于任何档位的帧预算
        field.frame_with_time(&mut surface, Duration::from_millis(100)).unwrap();
        if tiers.last() != Some(&field.tier()) {
            tiers.push(field.tier());
        }
    }

    assert_eq!(tiers, vec![CapabilityTier::High, CapabilityTier::Medium, CapabilityTier::Low]);
    // 最低档后继续叠加变换
    assert!(field.adjustments() >= 3);
    assert!(field.config().particles.max_count < 25);
    assert!(!field.simulation().physics().interactive);
    assert_eq!(field.simulation().state(), SimulationState::Running);
}

#[test]
fn test_monitor_suggestions_are_advisory() {
    let mut config = seeded_config();
    config.adaptation.enabled = false;
    let mut field = ParticleField::with_memory_probe(
        DeviceDetector::new(Box::new(desktop_host())),
        &config,
        Box::new(UnavailableMemoryProbe),
    );
    let mut surface = RecordingSurface::new(200, 200);
    field.initialize(200, 200).unwrap();
    field.start().unwrap();
    for _ in 0..10 {
        field.frame_with_time(&mut surface, Duration::from_millis(25)).unwrap();
    }

    let suggestions = field.monitor().suggestions();
    assert!(suggestions
        .iter()
        .any(|s| matches!(s, AdaptationSuggestion::ReduceParticles { .. })));
    assert_eq!(field.tier(), CapabilityTier::High);
    assert_eq!(field.config().particles.max_count, 150);
}

#[test]
fn test_benchmark_leaves_live_field_untouched() {
    let mut field = ParticleField::new(DeviceDetector::new(Box::new(desktop_host())), &seeded_config());
    let mut surface = RecordingSurface::new(300, 200);
    field.initialize(300, 200).unwrap();
    field.start().unwrap();
    FrameLoop::new().run(&mut field, &mut surface, Some(2));
    let before: Vec<_> = field.simulation().particles().to_vec();

    let settings = BenchmarkSettings {
        particle_counts: vec![20],
        themes: vec![Theme::Ocean],
        duration_ms: 50,
        warmup_frames: 0,
        surface_width: 120,
        surface_height: 90,
        ..BenchmarkSettings::default()
    };
    let harness = BenchmarkHarness::new(settings)
        .with_surface_factory(|width, height| Box::new(RecordingSurface::new(width, height)));
    let results = harness.run_benchmark();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_success());

    assert_eq!(field.simulation().particles(), before.as_slice());
    assert_eq!(field.simulation().frame_count(), 2);
    assert_eq!(field.simulation().state(), SimulationState::Running);
}

#[test]
fn test_config_file_drives_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("particle_field.toml");
    std::fs::write(
        &path,
        r#"
[surface]
width = 256
height = 128

[simulation]
theme = "forest"
interactive = false
seed = 9

[adaptation]
cooldown_frames = 30
"#,
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.simulation.theme, Theme::Forest);

    let mut field = ParticleField::new(DeviceDetector::new(Box::new(desktop_host())), &config);
    field.initialize(config.surface.width, config.surface.height).unwrap();
    assert_eq!(field.simulation().size(), (256, 128));
    assert!(!field.simulation().physics().interactive);
}
