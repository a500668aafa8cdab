//! 粒子模拟
//!
//! 状态机：`Uninitialized → Initialized → Running → Stopped`。
//! 每个 tick 先完成全部物理计算，再清屏并绘制，两者不交错。

use super::particle::Particle;
use super::physics::{resolve_boundary, step_all, PhysicsParams};
use super::pointer::PointerHandle;
use super::stepper::{InlineStepper, OffloadedStepper, PhysicsStepper, StepperKind};
use super::theme::{Theme, ThemeParams};
use crate::core::{FieldError, FieldResult};
use crate::impl_default;
use crate::render::{Color, Fill, RenderStyle, RenderSurface};
use glam::Vec2;
use particle_field_hardware::AdaptiveConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// 模拟状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

impl SimulationState {
    pub fn as_str(self) -> &'static str {
        match self {
            SimulationState::Uninitialized => "uninitialized",
            SimulationState::Initialized => "initialized",
            SimulationState::Running => "running",
            SimulationState::Stopped => "stopped",
        }
    }
}

/// 模拟选项（构造时确定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    pub theme: Theme,
    /// 是否响应指针
    pub interactive: bool,
    /// 尝试把物理计算交给后台线程
    pub offload: bool,
    /// 后台线程响应超时（毫秒）
    pub worker_timeout_ms: u64,
    /// 随机种子，`None` 时取系统熵
    pub seed: Option<u64>,
}

impl_default!(SimulationOptions {
    theme: Theme::Nebula,
    interactive: true,
    offload: false,
    worker_timeout_ms: 50,
    seed: None,
});

/// 单帧耗时
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    pub physics: Duration,
    pub render: Duration,
}

impl FrameTiming {
    pub fn total(&self) -> Duration {
        self.physics + self.render
    }
}

/// 粒子模拟
pub struct ParticleSimulation {
    config: AdaptiveConfig,
    options: SimulationOptions,
    theme: ThemeParams,
    palette: Vec<Color>,
    physics: PhysicsParams,
    style: RenderStyle,
    particles: Vec<Particle>,
    size: (u32, u32),
    state: SimulationState,
    stepper: Box<dyn PhysicsStepper>,
    offload_failed: bool,
    pointer: PointerHandle,
    rng: StdRng,
    frames: u64,
}

impl ParticleSimulation {
    pub fn new(config: AdaptiveConfig, options: SimulationOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let theme = options.theme.params();
        let palette = options.theme.colors().unwrap_or_else(|e| {
            tracing::warn!(target: "simulation", theme = %options.theme, error = %e, "调色板无效，使用白色");
            vec![Color::rgb(255, 255, 255)]
        });

        Self {
            physics: Self::physics_params(&config, &options, &theme),
            style: RenderStyle::from_effects(&config.effects),
            config,
            options,
            theme,
            palette,
            particles: Vec::new(),
            size: (0, 0),
            state: SimulationState::Uninitialized,
            stepper: Box::new(InlineStepper),
            offload_failed: false,
            pointer: PointerHandle::new(),
            rng,
            frames: 0,
        }
    }

    /// 使用固定种子构造，结果可复现
    pub fn with_seed(config: AdaptiveConfig, mut options: SimulationOptions, seed: u64) -> Self {
        options.seed = Some(seed);
        Self::new(config, options)
    }

    /// 吸引半径取主题值，不超过档位上限
    fn physics_params(config: &AdaptiveConfig, options: &SimulationOptions, theme: &ThemeParams) -> PhysicsParams {
        PhysicsParams {
            interaction_radius: theme.interaction_radius.min(config.particles.interaction_radius),
            magnetic_force: theme.magnetic_force,
            friction: theme.friction,
            interactive: config.particles.physics_enabled && options.interactive,
        }
    }

    /// 实际生成的粒子数：配置上限再乘以档位系数
    pub fn particle_target(config: &AdaptiveConfig) -> usize {
        (config.particles.max_count as f32 * config.tier.particle_multiplier()).floor() as usize
    }

    /// 绑定表面尺寸并播种粒子
    pub fn initialize(&mut self, width: u32, height: u32) -> FieldResult<()> {
        if width == 0 || height == 0 {
            return Err(FieldError::InvalidSurface { width, height });
        }
        if self.state == SimulationState::Running {
            self.stop();
        }

        self.size = (width, height);
        let bounds = self.bounds();
        let count = Self::particle_target(&self.config);
        let (rng, theme, palette) = (&mut self.rng, &self.theme, &self.palette);
        self.particles = (0..count as u64)
            .map(|id| Particle {
                id,
                ..Particle::random(&mut *rng, bounds, theme, palette)
            })
            .collect();
        self.state = SimulationState::Initialized;

        tracing::info!(
            target: "simulation",
            width,
            height,
            particles = count,
            tier = %self.config.tier,
            theme = %self.options.theme,
            "粒子已初始化"
        );
        Ok(())
    }

    /// 开始逐帧运行
    pub fn start(&mut self) -> FieldResult<()> {
        match self.state {
            SimulationState::Uninitialized => Err(FieldError::InvalidState {
                from: SimulationState::Uninitialized.as_str(),
                to: SimulationState::Running.as_str(),
            }),
            SimulationState::Running => Ok(()),
            SimulationState::Initialized | SimulationState::Stopped => {
                self.ensure_stepper();
                self.state = SimulationState::Running;
                Ok(())
            }
        }
    }

    /// 停止；返回后不会再有 tick 执行，后台线程被释放
    pub fn stop(&mut self) {
        if matches!(self.state, SimulationState::Running | SimulationState::Initialized) {
            self.state = SimulationState::Stopped;
            if self.stepper.kind() != StepperKind::Inline {
                self.stepper = Box::new(InlineStepper);
            }
            tracing::debug!(target: "simulation", frames = self.frames, "模拟已停止");
        }
    }

    fn ensure_stepper(&mut self) {
        if !self.options.offload || self.offload_failed || self.stepper.kind() != StepperKind::Inline {
            return;
        }
        let timeout = Duration::from_millis(self.options.worker_timeout_ms.max(1));
        match OffloadedStepper::spawn(timeout) {
            Ok(stepper) => self.stepper = Box::new(stepper),
            Err(e) => {
                tracing::warn!(target: "simulation", error = %e, "后台物理线程不可用，使用主线程");
                self.offload_failed = true;
            }
        }
    }

    /// 替换步进策略
    pub fn set_stepper(&mut self, stepper: Box<dyn PhysicsStepper>) {
        self.stepper = stepper;
    }

    /// 执行一帧；未运行时返回 `None`
    ///
    /// 表面尺寸变化时先重新播种。
    pub fn tick(&mut self, surface: &mut dyn RenderSurface) -> Option<FrameTiming> {
        if self.state != SimulationState::Running {
            return None;
        }
        let surface_size = (surface.width(), surface.height());
        if surface_size != self.size {
            if let Err(e) = self.resize(surface_size.0, surface_size.1) {
                tracing::warn!(target: "simulation", error = %e, "表面尺寸无效，跳过本帧");
                return None;
            }
        }

        let physics_start = Instant::now();
        self.step_physics();
        let physics = physics_start.elapsed();

        let render_start = Instant::now();
        self.render(surface);
        let render = render_start.elapsed();

        self.frames += 1;
        Some(FrameTiming { physics, render })
    }

    fn step_physics(&mut self) {
        let pointer = if self.physics.interactive {
            self.pointer.position()
        } else {
            None
        };

        if let Err(e) = self.stepper.step(&mut self.particles, pointer, &self.physics) {
            tracing::warn!(target: "simulation", error = %e, "后台物理线程失败，回退到主线程");
            self.stepper = Box::new(InlineStepper);
            self.offload_failed = true;
            step_all(&mut self.particles, pointer, &self.physics);
        }

        let bounds = self.bounds();
        for particle in self.particles.iter_mut() {
            resolve_boundary(particle, bounds);
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        surface.clear();
        for particle in &self.particles {
            if self.style.glow {
                surface.fill_circle(
                    particle.position,
                    particle.radius * RenderStyle::GLOW_SCALE,
                    Fill::RadialGradient {
                        color: particle.color,
                        alpha: particle.opacity * RenderStyle::GLOW_ALPHA,
                    },
                );
            }
            surface.fill_circle(
                particle.position,
                particle.radius,
                self.style.body_fill(particle.color, particle.opacity),
            );
        }
    }

    /// 表面尺寸变化：完全重新播种
    pub fn resize(&mut self, width: u32, height: u32) -> FieldResult<()> {
        if self.state != SimulationState::Uninitialized && self.size == (width, height) {
            return Ok(());
        }
        let was_running = self.state == SimulationState::Running;
        self.initialize(width, height)?;
        if was_running {
            self.start()?;
        }
        Ok(())
    }

    /// 切换到新配置；已初始化时按当前尺寸重新播种
    pub fn reconfigure(&mut self, config: AdaptiveConfig) -> FieldResult<()> {
        self.physics = Self::physics_params(&config, &self.options, &self.theme);
        self.style = RenderStyle::from_effects(&config.effects);
        self.config = config;

        if self.state == SimulationState::Uninitialized {
            return Ok(());
        }
        let was_running = self.state == SimulationState::Running;
        let (width, height) = self.size;
        self.initialize(width, height)?;
        if was_running {
            self.start()?;
        }
        Ok(())
    }

    /// 指针句柄，交给事件处理方写入
    pub fn pointer(&self) -> PointerHandle {
        self.pointer.clone()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    pub fn physics(&self) -> &PhysicsParams {
        &self.physics
    }

    pub fn render_style(&self) -> RenderStyle {
        self.style
    }

    pub fn stepper_kind(&self) -> StepperKind {
        self.stepper.kind()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    fn bounds(&self) -> Vec2 {
        Vec2::new(self.size.0 as f32, self.size.1 as f32)
    }
}

impl Drop for ParticleSimulation {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingSurface};
    use particle_field_hardware::{AdaptiveConfigFactory, CapabilityTier};
    use std::collections::HashSet;
    use std::thread;

    fn config(tier: CapabilityTier) -> AdaptiveConfig {
        AdaptiveConfigFactory::new().config_for(tier)
    }

    fn simulation(tier: CapabilityTier) -> ParticleSimulation {
        ParticleSimulation::with_seed(config(tier), SimulationOptions::default(), 42)
    }

    fn assert_in_bounds(sim: &ParticleSimulation) {
        let (width, height) = sim.size();
        for p in sim.particles() {
            assert!(p.position.x >= p.radius && p.position.x <= width as f32 - p.radius, "{p:?}");
            assert!(p.position.y >= p.radius && p.position.y <= height as f32 - p.radius, "{p:?}");
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut sim = simulation(CapabilityTier::High);
        assert_eq!(sim.state(), SimulationState::Uninitialized);
        assert!(matches!(sim.start(), Err(FieldError::InvalidState { .. })));
        assert!(matches!(sim.initialize(0, 100), Err(FieldError::InvalidSurface { .. })));

        sim.initialize(320, 240).unwrap();
        assert_eq!(sim.state(), SimulationState::Initialized);
        sim.start().unwrap();
        assert_eq!(sim.state(), SimulationState::Running);
        sim.stop();
        assert_eq!(sim.state(), SimulationState::Stopped);
        sim.start().unwrap();
        assert_eq!(sim.state(), SimulationState::Running);
    }

    #[test]
    fn test_particle_count_applies_tier_multiplier() {
        for (tier, expected) in [
            (CapabilityTier::High, 150),
            (CapabilityTier::Medium, 45),
            (CapabilityTier::Low, 7),
        ] {
            let mut sim = simulation(tier);
            sim.initialize(640, 480).unwrap();
            assert_eq!(sim.particles().len(), expected, "{tier}");
        }
    }

    #[test]
    fn test_seeding_respects_bounds_and_ranges() {
        let mut sim = simulation(CapabilityTier::High);
        sim.initialize(200, 100).unwrap();
        assert_in_bounds(&sim);

        let params = Theme::Nebula.params();
        let palette = Theme::Nebula.colors().unwrap();
        for p in sim.particles() {
            assert!(params.size.contains(p.radius));
            assert!(params.opacity.contains(p.opacity));
            assert!(p.velocity.length() <= params.speed.max + 1e-4);
            assert!(palette.contains(&p.color));
            assert!(p.max_life > 0.0 && p.life == p.max_life);
        }

        let ids: HashSet<u64> = sim.particles().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), sim.particles().len());
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let mut a = simulation(CapabilityTier::Medium);
        let mut b = simulation(CapabilityTier::Medium);
        a.initialize(300, 300).unwrap();
        b.initialize(300, 300).unwrap();
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_tick_renders_after_physics() {
        let mut sim = simulation(CapabilityTier::Medium);
        let mut surface = RecordingSurface::new(320, 240);
        assert!(sim.tick(&mut surface).is_none());

        sim.initialize(320, 240).unwrap();
        sim.start().unwrap();
        let timing = sim.tick(&mut surface).unwrap();
        assert!(timing.total() >= timing.physics);

        let frame = surface.last_frame();
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(frame.len(), sim.particles().len());
        assert!(frame
            .iter()
            .all(|cmd| matches!(cmd, DrawCommand::FillCircle { fill: Fill::RadialGradient { .. }, .. })));
    }

    #[test]
    fn test_glow_draws_halo() {
        let mut sim = simulation(CapabilityTier::High);
        let mut surface = RecordingSurface::new(320, 240);
        sim.initialize(320, 240).unwrap();
        sim.start().unwrap();
        sim.tick(&mut surface).unwrap();
        assert_eq!(surface.last_frame().len(), sim.particles().len() * 2);
    }

    #[test]
    fn test_no_ticks_after_stop() {
        let mut sim = simulation(CapabilityTier::Low);
        let mut surface = RecordingSurface::new(100, 100);
        sim.initialize(100, 100).unwrap();
        sim.start().unwrap();
        sim.tick(&mut surface).unwrap();
        sim.stop();

        let recorded = surface.commands().len();
        assert!(sim.tick(&mut surface).is_none());
        assert_eq!(surface.commands().len(), recorded);
        assert_eq!(sim.frame_count(), 1);
    }

    #[test]
    fn test_particles_stay_in_bounds_with_pointer() {
        let mut sim = simulation(CapabilityTier::High);
        let mut surface = RecordingSurface::new(160, 120);
        sim.initialize(160, 120).unwrap();
        sim.start().unwrap();
        let pointer = sim.pointer();

        for frame in 0..300 {
            pointer.move_to((frame % 160) as f32, 60.0);
            sim.tick(&mut surface).unwrap();
            assert_in_bounds(&sim);
        }
    }

    #[test]
    fn test_low_tier_disables_interaction() {
        let sim = simulation(CapabilityTier::Low);
        assert!(!sim.physics().interactive);

        let options = SimulationOptions {
            interactive: false,
            ..SimulationOptions::default()
        };
        let sim = ParticleSimulation::with_seed(config(CapabilityTier::High), options, 1);
        assert!(!sim.physics().interactive);
        assert_eq!(sim.physics().interaction_radius, 100.0);
    }

    #[test]
    fn test_interaction_radius_follows_theme_within_tier_cap() {
        let radius = |tier, theme| {
            let options = SimulationOptions {
                theme,
                ..SimulationOptions::default()
            };
            ParticleSimulation::with_seed(config(tier), options, 1).physics().interaction_radius
        };

        // Nebula 120 被高档 100 截断，Ember 80 保持
        assert_eq!(radius(CapabilityTier::High, Theme::Nebula), 100.0);
        assert_eq!(radius(CapabilityTier::High, Theme::Ember), 80.0);
        assert_eq!(radius(CapabilityTier::High, Theme::Forest), 90.0);
        assert_eq!(radius(CapabilityTier::Low, Theme::Ember), 50.0);
    }

    #[test]
    fn test_resize_reseeds() {
        let mut sim = simulation(CapabilityTier::High);
        sim.initialize(800, 600).unwrap();
        sim.start().unwrap();
        let before = sim.particles().to_vec();

        let mut small = RecordingSurface::new(120, 80);
        sim.tick(&mut small).unwrap();
        assert_eq!(sim.size(), (120, 80));
        assert_eq!(sim.state(), SimulationState::Running);
        assert_ne!(sim.particles(), &before[..]);
        assert_in_bounds(&sim);

        assert!(sim.resize(0, 80).is_err());
    }

    #[test]
    fn test_reconfigure_changes_budget() {
        let mut sim = simulation(CapabilityTier::High);
        sim.initialize(400, 300).unwrap();
        sim.start().unwrap();

        sim.reconfigure(config(CapabilityTier::Low)).unwrap();
        assert_eq!(sim.particles().len(), 7);
        assert_eq!(sim.state(), SimulationState::Running);
        assert!(sim.render_style().gradient);
        assert!(!sim.render_style().glow);
    }

    #[test]
    fn test_offload_runs_on_worker() {
        let options = SimulationOptions {
            offload: true,
            worker_timeout_ms: 2000,
            ..SimulationOptions::default()
        };
        let mut sim = ParticleSimulation::with_seed(config(CapabilityTier::High), options, 9);
        let mut surface = RecordingSurface::new(300, 200);
        sim.initialize(300, 200).unwrap();
        sim.start().unwrap();
        assert_eq!(sim.stepper_kind(), StepperKind::Offloaded);

        sim.tick(&mut surface).unwrap();
        assert_eq!(sim.stepper_kind(), StepperKind::Offloaded);
        sim.stop();
        assert_eq!(sim.stepper_kind(), StepperKind::Inline);
    }

    #[test]
    fn test_unresponsive_worker_falls_back_transparently() {
        let mut reference = simulation(CapabilityTier::High);
        let mut sim = simulation(CapabilityTier::High);
        let mut surface = RecordingSurface::new(300, 200);
        for s in [&mut reference, &mut sim] {
            s.initialize(300, 200).unwrap();
            s.start().unwrap();
        }

        let hung = OffloadedStepper::spawn_with(Duration::from_millis(5), |_, _, _| {
            thread::sleep(Duration::from_millis(200));
        })
        .unwrap();
        sim.set_stepper(Box::new(hung));

        reference.tick(&mut surface).unwrap();
        sim.tick(&mut surface).unwrap();

        assert_eq!(sim.stepper_kind(), StepperKind::Inline);
        assert_eq!(sim.particles(), reference.particles());
    }
}
