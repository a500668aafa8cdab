//! 自适应降级策略
//!
//! 根据指标快照给出建议，是否采纳由宿主决定。

use crate::monitoring::{MonitorSettings, PerformanceMetrics};
use serde::{Deserialize, Serialize};

/// 降级原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationReason {
    /// 连续超出帧预算
    SustainedFrameDrops,
    /// 平滑FPS持续低于阈值
    SustainedLowFps,
    /// 内存超出阈值
    MemoryPressure,
}

/// 降级建议
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdaptationSuggestion {
    /// 按比例减少粒子数
    ReduceParticles { factor: f32, reason: AdaptationReason },
    /// 关闭指针交互
    DisableInteraction,
    /// 去掉渐变和模糊等效果
    SimplifyRendering,
    /// 释放缓存
    ReleaseMemory,
}

/// 降级策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationPolicy {
    pub low_fps: f32,
    pub critical_fps: f32,
    pub sustained_samples: u32,
    pub memory_threshold_mb: f32,
    /// 帧率不足时的粒子缩减比例
    pub reduction_factor: f32,
    /// 内存压力下的粒子缩减比例
    pub memory_reduction_factor: f32,
}

crate::impl_default!(AdaptationPolicy {
    low_fps: 30.0,
    critical_fps: 20.0,
    sustained_samples: 10,
    memory_threshold_mb: 100.0,
    reduction_factor: 0.5,
    memory_reduction_factor: 0.75,
});

impl AdaptationPolicy {
    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self {
            low_fps: settings.throttle_fps,
            critical_fps: settings.critical_fps,
            sustained_samples: settings.sustained_samples.max(1),
            memory_threshold_mb: settings.memory_threshold_mb,
            ..Self::default()
        }
    }

    /// 评估指标快照，返回去重后的建议
    pub fn evaluate(&self, metrics: &PerformanceMetrics) -> Vec<AdaptationSuggestion> {
        let mut suggestions = Vec::new();
        let sustained_low_fps = metrics.low_fps_streak >= self.sustained_samples;
        let sustained_drops = metrics.consecutive_drops >= self.sustained_samples;

        if sustained_low_fps {
            push_unique(
                &mut suggestions,
                AdaptationSuggestion::ReduceParticles {
                    factor: self.reduction_factor,
                    reason: AdaptationReason::SustainedLowFps,
                },
            );
            push_unique(&mut suggestions, AdaptationSuggestion::DisableInteraction);
            if metrics.fps < self.critical_fps {
                push_unique(&mut suggestions, AdaptationSuggestion::SimplifyRendering);
            }
        } else if sustained_drops {
            push_unique(
                &mut suggestions,
                AdaptationSuggestion::ReduceParticles {
                    factor: self.reduction_factor,
                    reason: AdaptationReason::SustainedFrameDrops,
                },
            );
        }

        if let Some(memory_mb) = metrics.memory_usage_mb {
            if memory_mb > self.memory_threshold_mb {
                push_unique(&mut suggestions, AdaptationSuggestion::ReleaseMemory);
                push_unique(
                    &mut suggestions,
                    AdaptationSuggestion::ReduceParticles {
                        factor: self.memory_reduction_factor,
                        reason: AdaptationReason::MemoryPressure,
                    },
                );
            }
        }

        if !suggestions.is_empty() {
            tracing::debug!(target: "monitor", count = suggestions.len(), fps = metrics.fps, "生成降级建议");
        }
        suggestions
    }
}

/// 同一类建议只保留第一条
fn push_unique(suggestions: &mut Vec<AdaptationSuggestion>, suggestion: AdaptationSuggestion) {
    let duplicate = suggestions
        .iter()
        .any(|existing| std::mem::discriminant(existing) == std::mem::discriminant(&suggestion));
    if !duplicate {
        suggestions.push(suggestion);
    }
}
