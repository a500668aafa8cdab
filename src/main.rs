//! Particle field CLI
//!
//! Subcommands:
//!   detect     Detect the host tier and print the adaptive configuration
//!   run        Run the field headless for a number of frames, optionally saving a PNG snapshot
//!   benchmark  Run the (particle count × theme) benchmark matrix
//!   quick      Single short trial with a recommendation
//!   stress     Ramp the particle count until frames exceed the threshold
//!
//! Example:
//!   cargo run -- run --frames 300 --snapshot field.png --theme ember

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use particle_field::benchmark::{BenchmarkHarness, StressSettings};
use particle_field::config::AppConfig;
use particle_field::particles::Theme;
use particle_field::render::RasterSurface;
use particle_field::runtime::{FrameLoop, ParticleField};
use particle_field_hardware::{AdaptiveConfigFactory, CapabilityTier, DeviceDetector, ScreenGeometry, SystemHost};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Device-adaptive particle field", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON); defaults to ./particle_field.toml or ./particle_field.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect the host capability tier
    Detect(DetectArgs),
    /// Run the field headless
    Run(RunArgs),
    /// Run the benchmark matrix
    Benchmark(BenchmarkArgs),
    /// Quick performance test
    Quick,
    /// Stress test
    Stress(StressArgs),
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Print the configuration for this tier instead of the detected one
    #[arg(long)]
    tier: Option<CapabilityTier>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long, default_value_t = 600)]
    frames: u64,
    #[arg(long)]
    theme: Option<Theme>,
    /// Sleep to the configured frame budget between frames
    #[arg(long)]
    paced: bool,
    /// Keep the pointer at the surface centre
    #[arg(long)]
    pointer: bool,
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BenchmarkArgs {
    #[arg(long, value_delimiter = ',')]
    counts: Vec<u32>,
    #[arg(long, value_delimiter = ',')]
    themes: Vec<Theme>,
    #[arg(long)]
    duration_ms: Option<u64>,
    #[arg(long)]
    offload: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct StressArgs {
    #[arg(long, default_value_t = 100)]
    start: u32,
    #[arg(long, default_value_t = 100)]
    step: u32,
    #[arg(long, default_value_t = 5000)]
    max: u32,
    #[arg(long, default_value_t = 30)]
    frames_per_step: u32,
    #[arg(long)]
    json: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::load_or_default(),
    };
    config.apply_env_overrides();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn initialize_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.logging.with_target)
        .try_init();
}

fn detector(config: &AppConfig) -> DeviceDetector {
    let surface = &config.surface;
    let screen = ScreenGeometry::new(surface.width, surface.height, surface.pixel_ratio);
    DeviceDetector::new(Box::new(SystemHost::new(screen)))
}

fn cmd_detect(config: &AppConfig, args: DetectArgs) -> Result<()> {
    let detector = Arc::new(detector(config));
    let info = Arc::clone(&detector).detect_async().wait()?;
    let tier = args.tier.unwrap_or(info.tier);
    let adaptive = AdaptiveConfigFactory::new().with_conditions(tier, &detector.runtime_conditions());

    if args.json {
        let out = serde_json::json!({ "device": info, "config": adaptive });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        info.print();
        println!("=== 自适应配置 ({}) ===", adaptive.tier);
        println!("{}", toml::to_string_pretty(&adaptive)?);
    }
    Ok(())
}

fn cmd_run(mut config: AppConfig, args: RunArgs) -> Result<()> {
    if let Some(theme) = args.theme {
        config.simulation.theme = theme;
    }
    let (width, height) = (config.surface.width, config.surface.height);
    let mut field = ParticleField::detect_in_background(Arc::new(detector(&config)), &config)?;
    let mut surface = RasterSurface::new(width, height);

    field.initialize(width, height)?;
    field.start()?;
    if args.pointer {
        field.pointer().move_to(width as f32 / 2.0, height as f32 / 2.0);
    }

    let frame_loop = if args.paced {
        FrameLoop::paced(field.config().rendering.target_fps)
    } else {
        FrameLoop::new()
    };
    let frames = frame_loop.run(&mut field, &mut surface, Some(args.frames));
    field.stop();

    let report = field.monitor().report();
    println!(
        "frames {frames}  tier {}  particles {}  fps {:.1}  avg {:.2}ms  p99 {}  drops {}  adjustments {}",
        field.tier(),
        field.simulation().particles().len(),
        report.current_fps,
        report.average_frame_time_ms,
        report.p99_frame_time_ms.map_or("n/a".to_string(), |ms| format!("{ms:.2}ms")),
        report.frame_drops,
        field.adjustments(),
    );

    if let Some(path) = args.snapshot {
        surface.save_png(&path)?;
        println!("Saved snapshot: {}", path.display());
    }
    Ok(())
}

fn cmd_benchmark(config: &AppConfig, args: BenchmarkArgs) -> Result<()> {
    let mut settings = config.benchmark.clone();
    if !args.counts.is_empty() {
        settings.particle_counts = args.counts;
    }
    if !args.themes.is_empty() {
        settings.themes = args.themes;
    }
    if let Some(duration_ms) = args.duration_ms {
        settings.duration_ms = duration_ms;
    }
    settings.use_offload |= args.offload;
    settings.validate()?;

    let results = BenchmarkHarness::new(settings).run_benchmark();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{result}");
        }
    }
    Ok(())
}

fn cmd_quick(config: &AppConfig) -> Result<()> {
    let quick = BenchmarkHarness::new(config.benchmark.clone()).quick_performance_test();
    println!("{}", quick.trial);
    println!(
        "recommended: {} particles, tier {}, worker {}",
        quick.recommended_particle_count,
        quick.recommended_tier,
        if quick.use_worker { "yes" } else { "no" }
    );
    Ok(())
}

fn cmd_stress(config: &AppConfig, args: StressArgs) -> Result<()> {
    if args.start == 0 || args.start > args.max {
        anyhow::bail!("--start must be in 1..=--max");
    }
    let stress = StressSettings {
        start_count: args.start,
        step: args.step,
        max_count: args.max,
        frames_per_step: args.frames_per_step,
        failure_frame_ms: config.benchmark.frame_budget_ms(),
        theme: config.simulation.theme,
    };
    let result = BenchmarkHarness::new(config.benchmark.clone()).stress_test(&stress);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for step in &result.steps {
            println!(
                "{:>6} particles  {:>7.3}ms  {}",
                step.particle_count,
                step.average_frame_ms,
                if step.passed { "ok" } else { "over budget" }
            );
        }
        println!(
            "max sustainable {}  breaking point {}{}  memory ceiling {}",
            result.max_sustainable_count,
            result.breaking_point,
            if result.breaking_point_observed { "" } else { " (extrapolated)" },
            result.memory_ceiling_mb.map_or("n/a".to_string(), |mb| format!("{mb:.1} MB")),
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    initialize_logging(&config);

    match cli.command {
        Commands::Detect(args) => cmd_detect(&config, args),
        Commands::Run(args) => cmd_run(config, args),
        Commands::Benchmark(args) => cmd_benchmark(&config, args),
        Commands::Quick => cmd_quick(&config),
        Commands::Stress(args) => cmd_stress(&config, args),
    }
}
