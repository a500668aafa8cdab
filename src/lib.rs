//! # Particle Field
//!
//! A device-adaptive, pointer-reactive particle field with a closed performance feedback loop.
//!
//! ## Features
//!
//! - **Capability detection**: one-shot host scoring into a `high` / `medium` / `low` tier
//!   (see [`particle_field_hardware`])
//! - **Adaptive configuration**: per-tier presets with reduced-motion and low-battery overrides
//! - **Particle simulation**: pointer attraction, friction, bouncing walls, optional worker thread
//! - **Performance monitoring**: rolling FPS, frame drops, memory and advisory suggestions
//!   (see [`particle_field_profiling`])
//! - **Benchmarking**: isolated (count × theme) matrix, quick test and stress test
//!
//! ## Architecture Design
//!
//! ```text
//! DeviceDetector ──► AdaptiveConfigFactory ──► ParticleSimulation ──► RenderSurface
//!                            ▲                        │
//!                            │                        ▼
//!                     ParticleField ◄──────── PerformanceMonitor
//!                   (cooldown, downgrade)       (suggestions)
//! ```
//!
//! ### Example
//!
//! ```rust
//! use particle_field::config::AppConfig;
//! use particle_field::render::RecordingSurface;
//! use particle_field::runtime::ParticleField;
//! use particle_field_hardware::{DeviceDetector, FakeHost};
//!
//! let detector = DeviceDetector::new(Box::new(FakeHost::bare().with_cores(8)));
//! let mut field = ParticleField::new(detector, &AppConfig::default());
//! let mut surface = RecordingSurface::new(640, 480);
//!
//! field.initialize(640, 480).unwrap();
//! field.start().unwrap();
//! field.pointer().move_to(320.0, 240.0);
//! field.frame(&mut surface);
//! field.stop();
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Errors and shared macros
//! - [`config`]: Application configuration (TOML/JSON, environment overrides)
//! - [`particles`]: Particle physics and the simulation state machine
//! - [`render`]: Render surface contract and software surfaces
//! - [`runtime`]: Composition root and frame loop
//! - [`benchmark`]: Benchmark harness and scoring

/// Errors and shared macros
pub mod core;
/// Application configuration
pub mod config;
/// Particle simulation
pub mod particles;
/// Render surfaces
pub mod render;
/// Composition root and frame loop
pub mod runtime;
/// Benchmark harness
pub mod benchmark;

pub use crate::core::{FieldError, FieldResult};
pub use benchmark::{BenchmarkHarness, BenchmarkResult, BenchmarkSettings};
pub use config::AppConfig;
pub use particles::{ParticleSimulation, SimulationOptions, Theme};
pub use render::{RasterSurface, RecordingSurface, RenderSurface};
pub use runtime::{ApplySuggestion, FrameLoop, ParticleField, StopHandle};
