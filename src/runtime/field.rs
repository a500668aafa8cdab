//! 粒子场组合根

use super::ApplySuggestion;
use crate::config::{AdaptationConfig, AppConfig};
use crate::core::FieldResult;
use crate::particles::{FrameTiming, ParticleSimulation, PointerHandle};
use crate::render::RenderSurface;
use particle_field_hardware::{AdaptiveConfig, AdaptiveConfigFactory, CapabilityTier, DeviceDetector, DeviceInfo};
use particle_field_profiling::{
    AdaptationSuggestion, MemoryProbe, MonitorSettings, PerformanceMetrics, PerformanceMonitor,
};
use std::sync::Arc;
use std::time::Duration;

/// 粒子场
///
/// 持有检测器、配置工厂、模拟与监控器。监控建议只是建议，
/// 由这里决定何时以及如何回灌：先逐级降档，已是最低档再叠加变换。
pub struct ParticleField {
    detector: Arc<DeviceDetector>,
    factory: AdaptiveConfigFactory,
    simulation: ParticleSimulation,
    monitor: PerformanceMonitor,
    adaptation: AdaptationConfig,
    tier: CapabilityTier,
    frames_since_adjustment: u32,
    adjustments: u32,
}

impl ParticleField {
    pub fn new(detector: DeviceDetector, config: &AppConfig) -> Self {
        let monitor = PerformanceMonitor::new(config.monitor.clone());
        Self::with_monitor(Arc::new(detector), config, monitor)
    }

    /// 在后台线程完成设备检测后构造
    ///
    /// 检测线程失败时返回 [`FieldError::Hardware`](crate::core::FieldError::Hardware)。
    pub fn detect_in_background(detector: Arc<DeviceDetector>, config: &AppConfig) -> FieldResult<Self> {
        let task = Arc::clone(&detector).detect_async();
        let info = task.wait()?;
        tracing::debug!(
            target: "field",
            tier = %info.tier,
            elapsed_ms = task.elapsed().as_secs_f64() * 1000.0,
            "后台检测完成"
        );
        let monitor = PerformanceMonitor::new(config.monitor.clone());
        Ok(Self::with_monitor(detector, config, monitor))
    }

    /// 使用指定内存探针
    pub fn with_memory_probe(detector: DeviceDetector, config: &AppConfig, probe: Box<dyn MemoryProbe>) -> Self {
        let monitor = PerformanceMonitor::with_probe(config.monitor.clone(), probe);
        Self::with_monitor(Arc::new(detector), config, monitor)
    }

    fn with_monitor(detector: Arc<DeviceDetector>, config: &AppConfig, mut monitor: PerformanceMonitor) -> Self {
        let factory = AdaptiveConfigFactory::new();
        let tier = detector.tier();
        let adaptive = factory.with_conditions(tier, &detector.runtime_conditions());
        monitor.set_target_fps(adaptive.rendering.target_fps);

        tracing::info!(
            target: "field",
            tier = %tier,
            max_particles = adaptive.particles.max_count,
            target_fps = adaptive.rendering.target_fps,
            "自适应配置已生成"
        );

        Self {
            simulation: ParticleSimulation::new(adaptive, config.simulation.clone()),
            detector,
            factory,
            monitor,
            adaptation: config.adaptation.clone(),
            tier,
            frames_since_adjustment: 0,
            adjustments: 0,
        }
    }

    /// 指定档位（缺省为检测档位）的配置，叠加当前运行时条件
    pub fn adaptive_config(&self, tier: Option<CapabilityTier>) -> AdaptiveConfig {
        let tier = tier.unwrap_or_else(|| self.detector.tier());
        self.factory.with_conditions(tier, &self.detector.runtime_conditions())
    }

    pub fn initialize(&mut self, width: u32, height: u32) -> FieldResult<()> {
        self.simulation.initialize(width, height)
    }

    pub fn start(&mut self) -> FieldResult<()> {
        self.simulation.start()?;
        self.monitor.start();
        self.frames_since_adjustment = 0;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.simulation.stop();
        self.monitor.stop();
    }

    /// 执行一帧并按墙钟采样
    pub fn frame(&mut self, surface: &mut dyn RenderSurface) -> Option<FrameTiming> {
        let timing = self.simulation.tick(surface)?;
        if self.monitor.frame() {
            self.adapt();
        }
        Some(timing)
    }

    /// 执行一帧，帧时间由宿主给出
    pub fn frame_with_time(&mut self, surface: &mut dyn RenderSurface, frame_time: Duration) -> Option<FrameTiming> {
        let timing = self.simulation.tick(surface)?;
        if self.monitor.record_frame(frame_time) {
            self.adapt();
        }
        Some(timing)
    }

    fn adapt(&mut self) {
        if !self.adaptation.enabled {
            return;
        }
        self.frames_since_adjustment = self.frames_since_adjustment.saturating_add(1);
        if self.frames_since_adjustment < self.adaptation.cooldown_frames {
            return;
        }

        let suggestions = self.monitor.suggestions();
        if suggestions.is_empty() {
            return;
        }

        let (tier, next) = self.adapted_config(&suggestions);
        if tier == self.tier && &next == self.simulation.config() {
            // 已无可降之处
            return;
        }

        let target_fps = next.rendering.target_fps;
        let max_particles = next.particles.max_count;
        if let Err(e) = self.simulation.reconfigure(next) {
            tracing::warn!(target: "field", error = %e, "应用降级配置失败");
            return;
        }

        tracing::info!(
            target: "field",
            from = %self.tier,
            to = %tier,
            max_particles,
            suggestions = suggestions.len(),
            "按监控建议调整配置"
        );

        self.tier = tier;
        self.adjustments += 1;
        self.frames_since_adjustment = 0;
        self.monitor.reset();
        self.monitor.set_target_fps(target_fps);
    }

    fn adapted_config(&self, suggestions: &[AdaptationSuggestion]) -> (CapabilityTier, AdaptiveConfig) {
        let wants_reduction = suggestions
            .iter()
            .any(|s| matches!(s, AdaptationSuggestion::ReduceParticles { .. }));

        if wants_reduction {
            if let Some(lower) = self.tier.lower() {
                return (lower, self.adaptive_config(Some(lower)));
            }
        }

        let next = suggestions.iter().fold(self.simulation.config().clone(), |config, suggestion| {
            self.factory.apply_suggestion(&config, suggestion)
        });
        (self.tier, next)
    }

    /// 表面尺寸变化
    pub fn resize(&mut self, width: u32, height: u32) -> FieldResult<()> {
        self.simulation.resize(width, height)
    }

    pub fn pointer(&self) -> PointerHandle {
        self.simulation.pointer()
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.monitor.metrics()
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn monitor_settings(&self) -> &MonitorSettings {
        self.monitor.settings()
    }

    /// 当前生效的配置
    pub fn config(&self) -> &AdaptiveConfig {
        self.simulation.config()
    }

    /// 当前档位（可能已低于检测档位）
    pub fn tier(&self) -> CapabilityTier {
        self.tier
    }

    /// 已执行的调整次数
    pub fn adjustments(&self) -> u32 {
        self.adjustments
    }

    pub fn device(&self) -> &DeviceInfo {
        self.detector.detect()
    }

    pub fn simulation(&self) -> &ParticleSimulation {
        &self.simulation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::SimulationState;
    use crate::render::RecordingSurface;
    use particle_field_hardware::{FakeHost, FeatureSupport};
    use particle_field_profiling::UnavailableMemoryProbe;

    fn high_end_host() -> FakeHost {
        FakeHost::bare()
            .with_cores(16)
            .with_memory_gb(32.0)
            .with_gpu("NVIDIA GeForce RTX 4090")
            .with_features(FeatureSupport {
                webgl: true,
                webgl2: true,
                background_workers: true,
                intersection_observer: true,
            })
    }

    fn app_config(cooldown_frames: u32) -> AppConfig {
        let mut config = AppConfig::default();
        config.simulation.seed = Some(7);
        config.adaptation.cooldown_frames = cooldown_frames;
        config
    }

    fn field(host: FakeHost, cooldown_frames: u32) -> ParticleField {
        ParticleField::with_memory_probe(
            DeviceDetector::new(Box::new(host)),
            &app_config(cooldown_frames),
            Box::new(UnavailableMemoryProbe),
        )
    }

    #[test]
    fn test_background_detection_warms_cache() {
        let detector = Arc::new(DeviceDetector::new(Box::new(high_end_host())));
        let field = ParticleField::detect_in_background(Arc::clone(&detector), &app_config(10)).unwrap();
        assert!(detector.is_cached());
        assert_eq!(field.tier(), CapabilityTier::High);
        assert_eq!(field.device(), detector.detect());
    }

    #[test]
    fn test_configured_from_detected_tier() {
        let field = field(high_end_host(), 10);
        assert_eq!(field.tier(), CapabilityTier::High);
        assert_eq!(field.config().particles.max_count, 150);
        assert_eq!(field.monitor_settings().target_fps, 60);
        assert_eq!(field.device().tier, CapabilityTier::High);
    }

    #[test]
    fn test_low_battery_applies_on_construction() {
        let field = field(high_end_host().with_battery(0.1), 10);
        assert_eq!(field.config().particles.max_count, 45);
        assert_eq!(field.monitor_settings().target_fps, 15);
    }

    #[test]
    fn test_adaptive_config_accepts_explicit_tier() {
        let field = field(high_end_host(), 10);
        assert_eq!(field.adaptive_config(Some(CapabilityTier::Low)).particles.max_count, 25);
        assert_eq!(field.adaptive_config(None).tier, CapabilityTier::High);
    }

    #[test]
    fn test_slow_frames_downgrade_tier_after_cooldown() {
        let mut field = field(high_end_host(), 10);
        let mut surface = RecordingSurface::new(320, 240);
        field.initialize(320, 240).unwrap();
        field.start().unwrap();
        assert_eq!(field.simulation().particles().len(), 150);

        for _ in 0..9 {
            field.frame_with_time(&mut surface, Duration::from_millis(25)).unwrap();
        }
        assert_eq!(field.tier(), CapabilityTier::High);

        field.frame_with_time(&mut surface, Duration::from_millis(25)).unwrap();
        assert_eq!(field.tier(), CapabilityTier::Medium);
        assert_eq!(field.adjustments(), 1);
        assert_eq!(field.simulation().particles().len(), 45);
        assert_eq!(field.metrics().frame_count, 0);
        assert_eq!(field.simulation().state(), SimulationState::Running);
    }

    #[test]
    fn test_lowest_tier_applies_transforms() {
        let mut field = field(FakeHost::bare().with_cores(1), 5);
        assert_eq!(field.tier(), CapabilityTier::Low);
        let mut surface = RecordingSurface::new(320, 240);
        field.initialize(320, 240).unwrap();
        field.start().unwrap();

        // 10fps 持续低于临界值
        for _ in 0..10 {
            field.frame_with_time(&mut surface, Duration::from_millis(100)).unwrap();
        }
        assert_eq!(field.tier(), CapabilityTier::Low);
        assert!(field.adjustments() >= 1);
        let config = field.config();
        assert!(config.particles.max_count < 25);
        assert!(!config.particles.physics_enabled);
        assert!(!config.effects.gradient);
        assert!(!field.simulation().physics().interactive);
    }

    #[test]
    fn test_healthy_frames_leave_config_alone() {
        let mut field = field(high_end_host(), 1);
        let mut surface = RecordingSurface::new(200, 200);
        field.initialize(200, 200).unwrap();
        field.start().unwrap();
        for _ in 0..30 {
            field.frame_with_time(&mut surface, Duration::from_millis(16)).unwrap();
        }
        assert_eq!(field.adjustments(), 0);
        assert_eq!(field.tier(), CapabilityTier::High);
    }

    #[test]
    fn test_disabled_adaptation() {
        let mut config = app_config(1);
        config.adaptation.enabled = false;
        let mut field = ParticleField::with_memory_probe(
            DeviceDetector::new(Box::new(high_end_host())),
            &config,
            Box::new(UnavailableMemoryProbe),
        );
        let mut surface = RecordingSurface::new(200, 200);
        field.initialize(200, 200).unwrap();
        field.start().unwrap();
        for _ in 0..20 {
            field.frame_with_time(&mut surface, Duration::from_millis(40)).unwrap();
        }
        assert_eq!(field.adjustments(), 0);
        assert!(field.metrics().frame_drops >= 20);
    }

    #[test]
    fn test_stop_halts_frames() {
        let mut field = field(high_end_host(), 10);
        let mut surface = RecordingSurface::new(200, 200);
        field.initialize(200, 200).unwrap();
        field.start().unwrap();
        assert!(field.frame(&mut surface).is_some());
        field.stop();
        assert!(field.frame(&mut surface).is_none());
        assert!(!field.monitor().is_running());
    }
}
