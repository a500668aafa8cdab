//! 评分与推荐

use particle_field_hardware::CapabilityTier;

const FPS_WEIGHT: f32 = 0.6;
const DROP_WEIGHT: f32 = 0.25;
const STABILITY_WEIGHT: f32 = 0.15;

/// 0–100 性能分
///
/// 综合达成帧率、掉帧比例和帧时间变异系数。
pub fn performance_score(
    average_fps: f32,
    target_fps: u32,
    frame_drops: u64,
    frames: u64,
    std_dev_ms: f32,
    average_frame_ms: f32,
) -> f32 {
    if frames == 0 || target_fps == 0 {
        return 0.0;
    }
    let fps_ratio = (average_fps / target_fps as f32).clamp(0.0, 1.0);
    let drop_ratio = (frame_drops as f32 / frames as f32).clamp(0.0, 1.0);
    let variation = if average_frame_ms > 0.0 {
        (std_dev_ms / average_frame_ms).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let score = 100.0
        * (FPS_WEIGHT * fps_ratio + DROP_WEIGHT * (1.0 - drop_ratio) + STABILITY_WEIGHT * (1.0 - variation));
    score.clamp(0.0, 100.0)
}

/// 按得分缩减粒子数
pub fn recommended_particle_count(particle_count: u32, score: f32) -> u32 {
    let factor = if score >= 80.0 {
        1.0
    } else if score >= 60.0 {
        0.75
    } else if score >= 40.0 {
        0.5
    } else {
        0.25
    };
    ((particle_count as f32 * factor).floor() as u32).max(1)
}

/// 按得分推荐档位
pub fn recommended_tier(score: f32) -> CapabilityTier {
    if score >= 80.0 {
        CapabilityTier::High
    } else if score >= 50.0 {
        CapabilityTier::Medium
    } else {
        CapabilityTier::Low
    }
}
