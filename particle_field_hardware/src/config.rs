/// 自适应配置
///
/// 根据能力档位生成完整的参数包；无障碍与电池覆盖都是对基础包的纯变换，
/// 每次调用都产生新值，从不原地修改已返回的配置。

use crate::capability::CapabilityTier;
use serde::{Deserialize, Serialize};

/// 动画复杂度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnimationComplexity {
    Minimal,
    Reduced,
    Full,
}

/// 缓动曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseOut,
    EaseInOut,
}

/// 动画设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSettings {
    pub enabled: bool,
    pub complexity: AnimationComplexity,
    pub duration_ms: u32,
    pub easing: Easing,
}

/// 粒子预算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleBudget {
    pub max_count: u32,
    pub interaction_radius: f32,
    /// 是否启用指针磁力物理
    pub physics_enabled: bool,
}

/// 特效开关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectToggles {
    pub blur: bool,
    pub shadow: bool,
    pub gradient: bool,
    pub glow: bool,
}

/// 渲染目标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderTarget {
    pub target_fps: u32,
    pub gpu_acceleration: bool,
    pub webgl: bool,
}

impl RenderTarget {
    /// 帧预算（毫秒）
    pub fn frame_budget_ms(&self) -> f32 {
        1000.0 / self.target_fps.max(1) as f32
    }
}

/// 自适应配置包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    pub tier: CapabilityTier,
    pub animations: AnimationSettings,
    pub particles: ParticleBudget,
    pub effects: EffectToggles,
    pub rendering: RenderTarget,
}

/// 运行时条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConditions {
    pub reduced_motion: bool,
    /// 电池电量（0.0-1.0）
    pub battery_level: Option<f32>,
}

/// 运行时降级建议对应的配置变换
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConfigAdjustment {
    /// 粒子预算乘以系数
    ScaleParticles(f32),
    /// 关闭指针交互
    DisableInteraction,
    /// 关闭渐变、模糊、发光、阴影
    SimplifyRendering,
}

/// 自适应配置工厂
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveConfigFactory;

impl AdaptiveConfigFactory {
    /// 减少动画时的粒子上限
    pub const REDUCED_MOTION_MAX_PARTICLES: u32 = 10;
    /// 低电量阈值
    pub const LOW_BATTERY_THRESHOLD: f32 = 0.20;
    /// 低电量时的粒子比例
    pub const LOW_BATTERY_PARTICLE_SCALE: f32 = 0.3;
    /// 低电量时的帧率上限
    pub const LOW_BATTERY_MAX_FPS: u32 = 15;
    /// 建议变换后粒子数下限
    pub const MIN_PARTICLES: u32 = 1;

    pub fn new() -> Self {
        Self
    }

    /// 档位对应的基础配置
    pub fn config_for(&self, tier: CapabilityTier) -> AdaptiveConfig {
        match tier {
            CapabilityTier::High => Self::high_preset(),
            CapabilityTier::Medium => Self::medium_preset(),
            CapabilityTier::Low => Self::low_preset(),
        }
    }

    /// 基础配置叠加运行时条件
    pub fn with_conditions(&self, tier: CapabilityTier, conditions: &RuntimeConditions) -> AdaptiveConfig {
        let mut config = self.config_for(tier);
        if let Some(level) = conditions.battery_level {
            if level < Self::LOW_BATTERY_THRESHOLD {
                config = Self::apply_low_battery(&config);
            }
        }
        if conditions.reduced_motion {
            config = Self::apply_reduced_motion(&config);
        }
        config
    }

    /// 减少动画覆盖
    pub fn apply_reduced_motion(base: &AdaptiveConfig) -> AdaptiveConfig {
        let mut config = base.clone();
        config.animations.enabled = false;
        config.particles.max_count = config.particles.max_count.min(Self::REDUCED_MOTION_MAX_PARTICLES);
        config.effects.blur = false;
        config.effects.glow = false;
        config
    }

    /// 低电量覆盖
    pub fn apply_low_battery(base: &AdaptiveConfig) -> AdaptiveConfig {
        let mut config = base.clone();
        config.particles.max_count =
            (config.particles.max_count as f32 * Self::LOW_BATTERY_PARTICLE_SCALE).floor() as u32;
        config.animations.duration_ms /= 2;
        config.effects.blur = false;
        config.effects.glow = false;
        config.rendering.target_fps = config.rendering.target_fps.min(Self::LOW_BATTERY_MAX_FPS);
        config
    }

    /// 应用降级变换，返回新配置
    pub fn apply_adjustment(&self, base: &AdaptiveConfig, adjustment: ConfigAdjustment) -> AdaptiveConfig {
        let mut config = base.clone();
        match adjustment {
            ConfigAdjustment::ScaleParticles(factor) => {
                let scaled = (config.particles.max_count as f32 * factor.clamp(0.0, 1.0)).floor() as u32;
                config.particles.max_count = scaled.max(Self::MIN_PARTICLES);
            }
            ConfigAdjustment::DisableInteraction => {
                config.particles.physics_enabled = false;
            }
            ConfigAdjustment::SimplifyRendering => {
                config.effects.gradient = false;
                config.effects.blur = false;
                config.effects.glow = false;
                config.effects.shadow = false;
            }
        }
        config
    }

    fn high_preset() -> AdaptiveConfig {
        AdaptiveConfig {
            tier: CapabilityTier::High,
            animations: AnimationSettings {
                enabled: true,
                complexity: AnimationComplexity::Full,
                duration_ms: 300,
                easing: Easing::EaseInOut,
            },
            particles: ParticleBudget {
                max_count: 150,
                interaction_radius: 100.0,
                physics_enabled: true,
            },
            effects: EffectToggles {
                blur: true,
                shadow: true,
                gradient: true,
                glow: true,
            },
            rendering: RenderTarget {
                target_fps: 60,
                gpu_acceleration: true,
                webgl: true,
            },
        }
    }

    fn medium_preset() -> AdaptiveConfig {
        AdaptiveConfig {
            tier: CapabilityTier::Medium,
            animations: AnimationSettings {
                enabled: true,
                complexity: AnimationComplexity::Reduced,
                duration_ms: 200,
                easing: Easing::EaseOut,
            },
            particles: ParticleBudget {
                max_count: 75,
                interaction_radius: 75.0,
                physics_enabled: true,
            },
            effects: EffectToggles {
                blur: true,
                shadow: true,
                gradient: true,
                glow: false,
            },
            rendering: RenderTarget {
                target_fps: 30,
                gpu_acceleration: true,
                webgl: true,
            },
        }
    }

    fn low_preset() -> AdaptiveConfig {
        AdaptiveConfig {
            tier: CapabilityTier::Low,
            animations: AnimationSettings {
                enabled: true,
                complexity: AnimationComplexity::Minimal,
                duration_ms: 150,
                easing: Easing::Linear,
            },
            particles: ParticleBudget {
                max_count: 25,
                interaction_radius: 50.0,
                physics_enabled: false,
            },
            effects: EffectToggles {
                blur: false,
                shadow: false,
                gradient: true,
                glow: false,
            },
            rendering: RenderTarget {
                target_fps: 30,
                gpu_acceleration: false,
                webgl: false,
            },
        }
    }
}
