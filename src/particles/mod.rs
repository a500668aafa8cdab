//! 粒子模拟模块
//!
//! ## 架构设计
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            ParticleSimulation                 │
//! ├──────────────────────────────────────────────┤
//! │  1. Physics (PhysicsStepper)                  │
//! │     - 指针吸引 / 摩擦 / 欧拉积分                │
//! │     - InlineStepper 或 OffloadedStepper       │
//! │  2. Boundary (主线程)                          │
//! │     - 两轴独立反弹，速度保留 0.8                 │
//! │  3. Render (RenderSurface)                    │
//! │     - 全屏清除 + 径向渐变圆                      │
//! └──────────────────────────────────────────────┘
//! ```

pub mod particle;
pub mod physics;
pub mod pointer;
pub mod simulation;
pub mod stepper;
pub mod theme;

pub use particle::Particle;
pub use physics::{magnetic_force, resolve_boundary, step_all, step_particle, PhysicsParams, BOUNCE_DAMPING};
pub use pointer::PointerHandle;
pub use simulation::{FrameTiming, ParticleSimulation, SimulationOptions, SimulationState};
pub use stepper::{InlineStepper, OffloadedStepper, PhysicsStepper, StepperKind};
pub use theme::{Theme, ThemeParams, ValueRange};
