//! 基准测试
//!
//! 在一次性的模拟实例上运行 (粒子数 × 主题) 矩阵，给出 0–100 分和推荐配置。
//! 基准从不触碰线上模拟实例。

pub mod harness;
pub mod score;

pub use harness::{BenchmarkHarness, SurfaceFactory};
pub use score::{performance_score, recommended_particle_count, recommended_tier};

use crate::config::{ConfigError, ConfigResult};
use crate::impl_default;
use crate::particles::Theme;
use particle_field_hardware::CapabilityTier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 基准矩阵设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// 候选粒子数
    pub particle_counts: Vec<u32>,
    /// 候选主题
    pub themes: Vec<Theme>,
    /// 每个单元的模拟时长（毫秒，按帧预算折算为帧数）
    pub duration_ms: u64,
    /// 是否模拟指针交互
    pub include_interaction: bool,
    /// 是否尝试后台物理线程
    pub use_offload: bool,
    pub target_fps: u32,
    /// 预热帧数（不计入统计）
    pub warmup_frames: u32,
    pub surface_width: u32,
    pub surface_height: u32,
}

impl_default!(BenchmarkSettings {
    particle_counts: vec![50, 100, 200, 400],
    themes: vec![Theme::Nebula, Theme::Ember],
    duration_ms: 1000,
    include_interaction: true,
    use_offload: false,
    target_fps: 60,
    warmup_frames: 5,
    surface_width: 800,
    surface_height: 600,
});

impl BenchmarkSettings {
    /// 帧预算（毫秒）
    pub fn frame_budget_ms(&self) -> f32 {
        1000.0 / self.target_fps.max(1) as f32
    }

    /// 每个单元计入统计的帧数
    pub fn frames_per_trial(&self) -> u32 {
        ((self.duration_ms as f32 / self.frame_budget_ms()).ceil() as u32).max(1)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.particle_counts.is_empty() || self.particle_counts.contains(&0) {
            return Err(ConfigError::ValidationError(
                "Benchmark particle counts must be non-empty and positive".to_string(),
            ));
        }
        if self.themes.is_empty() {
            return Err(ConfigError::ValidationError("Benchmark needs at least one theme".to_string()));
        }
        if self.duration_ms == 0 || self.target_fps == 0 {
            return Err(ConfigError::ValidationError(
                "Benchmark duration and target FPS must be positive".to_string(),
            ));
        }
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(ConfigError::ValidationError("Invalid benchmark surface".to_string()));
        }
        Ok(())
    }
}

/// 单个矩阵单元的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub particle_count: u32,
    pub theme: Theme,
    pub average_fps: f32,
    /// 每帧物理耗时（毫秒）
    pub physics_time_ms: f32,
    /// 每帧渲染耗时（毫秒）
    pub render_time_ms: f32,
    pub frame_time_std_dev_ms: f32,
    pub frame_drops: u64,
    pub frames: u64,
    pub memory_mb: Option<f32>,
    /// 0–100
    pub score: f32,
    pub recommended_particle_count: u32,
    /// 失败原因，成功时为 `None`
    pub error: Option<String>,
}

impl BenchmarkResult {
    /// 失败单元：零分
    pub fn failed(particle_count: u32, theme: Theme, error: String) -> Self {
        Self {
            particle_count,
            theme,
            average_fps: 0.0,
            physics_time_ms: 0.0,
            render_time_ms: 0.0,
            frame_time_std_dev_ms: 0.0,
            frame_drops: 0,
            frames: 0,
            memory_mb: None,
            score: 0.0,
            recommended_particle_count: 0,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{:>6} × {:<7} FAILED: {}", self.particle_count, self.theme, error),
            None => write!(
                f,
                "{:>6} × {:<7} fps {:>6.1}  physics {:>7.3}ms  render {:>7.3}ms  drops {:>4}  score {:>5.1}  → {}",
                self.particle_count,
                self.theme,
                self.average_fps,
                self.physics_time_ms,
                self.render_time_ms,
                self.frame_drops,
                self.score,
                self.recommended_particle_count,
            ),
        }
    }
}

/// 快速测试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickTestResult {
    pub recommended_particle_count: u32,
    pub recommended_tier: CapabilityTier,
    /// 是否建议使用后台物理线程
    pub use_worker: bool,
    pub trial: BenchmarkResult,
}

/// 压力测试设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressSettings {
    pub start_count: u32,
    pub step: u32,
    pub max_count: u32,
    pub frames_per_step: u32,
    /// 平均帧耗时超过该值即视为失败（毫秒）
    pub failure_frame_ms: f32,
    pub theme: Theme,
}

impl_default!(StressSettings {
    start_count: 100,
    step: 100,
    max_count: 5000,
    frames_per_step: 30,
    failure_frame_ms: 1000.0 / 60.0,
    theme: Theme::Nebula,
});

/// 压力测试单步
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressStep {
    pub particle_count: u32,
    pub average_frame_ms: f32,
    pub memory_mb: Option<f32>,
    pub passed: bool,
}

/// 压力测试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestResult {
    /// 最大可持续粒子数，首步即失败时为 0
    pub max_sustainable_count: u32,
    /// 崩溃点：实测值或按最后一步线性外推
    pub breaking_point: u32,
    /// 崩溃点是否实测得到
    pub breaking_point_observed: bool,
    /// 近似内存上限（MB）
    pub memory_ceiling_mb: Option<f32>,
    pub steps: Vec<StressStep>,
}
