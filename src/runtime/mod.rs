//! 运行时组合根
//!
//! 检测器 → 配置工厂 → 模拟 → 监控器，监控建议按冷却帧数回灌到配置。
//!
//! - `field` - [`ParticleField`] 持有全部子系统
//! - `frame_loop` - 可跨线程停止的帧驱动

pub mod field;
pub mod frame_loop;

pub use field::ParticleField;
pub use frame_loop::{FrameLoop, StopHandle};

use particle_field_hardware::{AdaptiveConfig, AdaptiveConfigFactory, ConfigAdjustment};
use particle_field_profiling::AdaptationSuggestion;

/// 把监控建议折算为配置变换
pub trait ApplySuggestion {
    /// 返回新配置，原配置不变
    fn apply_suggestion(&self, base: &AdaptiveConfig, suggestion: &AdaptationSuggestion) -> AdaptiveConfig;
}

impl ApplySuggestion for AdaptiveConfigFactory {
    fn apply_suggestion(&self, base: &AdaptiveConfig, suggestion: &AdaptationSuggestion) -> AdaptiveConfig {
        match *suggestion {
            AdaptationSuggestion::ReduceParticles { factor, .. } => {
                self.apply_adjustment(base, ConfigAdjustment::ScaleParticles(factor))
            }
            AdaptationSuggestion::DisableInteraction => {
                self.apply_adjustment(base, ConfigAdjustment::DisableInteraction)
            }
            AdaptationSuggestion::SimplifyRendering => {
                self.apply_adjustment(base, ConfigAdjustment::SimplifyRendering)
            }
            // 配置不变，由调用方重新播种释放旧粒子
            AdaptationSuggestion::ReleaseMemory => base.clone(),
        }
    }
}
