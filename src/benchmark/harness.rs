//! 基准测试执行器
//!
//! 帧时间按模拟垂直同步折算：`max(实际耗时, 帧预算)`，不真正休眠。
//! 单个单元失败（返回错误或 panic）只记为零分，不影响其余单元。

use super::score::{performance_score, recommended_particle_count, recommended_tier};
use super::{BenchmarkResult, BenchmarkSettings, QuickTestResult, StressSettings, StressStep, StressTestResult};
use crate::core::{FieldError, FieldResult};
use crate::particles::{FrameTiming, ParticleSimulation, SimulationOptions, Theme};
use crate::render::{RasterSurface, RenderSurface};
use glam::Vec2;
use particle_field_hardware::{AdaptiveConfigFactory, CapabilityTier};
use particle_field_profiling::{platform_probe, MonitorSettings, PerformanceMonitor};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

/// 为每个单元创建一次性绘制表面
pub type SurfaceFactory = Box<dyn Fn(u32, u32) -> Box<dyn RenderSurface> + Send + Sync>;

/// 一次测量的原始数据
struct Measurement {
    timings: Vec<FrameTiming>,
    memory_mb: Option<f32>,
}

impl Measurement {
    fn average_ms(&self, pick: impl Fn(&FrameTiming) -> Duration) -> f32 {
        if self.timings.is_empty() {
            return 0.0;
        }
        let total: Duration = self.timings.iter().map(pick).sum();
        total.as_secs_f32() * 1000.0 / self.timings.len() as f32
    }
}

/// 基准测试执行器
pub struct BenchmarkHarness {
    settings: BenchmarkSettings,
    surface_factory: SurfaceFactory,
    available_cores: usize,
    seed: u64,
}

impl BenchmarkHarness {
    /// 快速测试的粒子数
    pub const QUICK_PARTICLE_COUNT: u32 = 100;
    /// 快速测试最长时长（毫秒）
    pub const QUICK_MAX_DURATION_MS: u64 = 500;
    /// 物理耗时超过帧预算的该比例时建议使用后台线程
    pub const WORKER_PHYSICS_SHARE: f32 = 0.25;
    /// 建议使用后台线程的最少核心数
    pub const WORKER_MIN_CORES: usize = 4;

    pub fn new(settings: BenchmarkSettings) -> Self {
        Self {
            settings,
            surface_factory: Box::new(|width, height| Box::new(RasterSurface::new(width, height))),
            available_cores: num_cpus::get(),
            seed: 0x5EED,
        }
    }

    /// 替换绘制表面工厂
    pub fn with_surface_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(u32, u32) -> Box<dyn RenderSurface> + Send + Sync + 'static,
    {
        self.surface_factory = Box::new(factory);
        self
    }

    pub fn with_available_cores(mut self, cores: usize) -> Self {
        self.available_cores = cores;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn settings(&self) -> &BenchmarkSettings {
        &self.settings
    }

    /// 运行设置中的完整矩阵
    pub fn run_benchmark(&self) -> Vec<BenchmarkResult> {
        self.run_matrix(&self.settings.particle_counts, &self.settings.themes)
    }

    /// 运行指定矩阵
    pub fn run_matrix(&self, particle_counts: &[u32], themes: &[Theme]) -> Vec<BenchmarkResult> {
        let mut results = Vec::with_capacity(particle_counts.len() * themes.len());
        for &theme in themes {
            for &count in particle_counts {
                let result = self.run_cell(count, theme, self.settings.duration_ms);
                match &result.error {
                    Some(error) => {
                        tracing::warn!(target: "benchmark", count, theme = %theme, error = %error, "基准单元失败")
                    }
                    None => tracing::info!(
                        target: "benchmark",
                        count,
                        theme = %theme,
                        fps = result.average_fps,
                        score = result.score,
                        "基准单元完成"
                    ),
                }
                results.push(result);
            }
        }
        results
    }

    /// 单次短测：推荐粒子数、档位，以及是否使用后台线程
    pub fn quick_performance_test(&self) -> QuickTestResult {
        let theme = self.settings.themes.first().copied().unwrap_or_default();
        let duration_ms = self.settings.duration_ms.min(Self::QUICK_MAX_DURATION_MS);
        let trial = self.run_cell(Self::QUICK_PARTICLE_COUNT, theme, duration_ms);

        if !trial.is_success() {
            let fallback = AdaptiveConfigFactory::new().config_for(CapabilityTier::Low);
            return QuickTestResult {
                recommended_particle_count: fallback.particles.max_count,
                recommended_tier: CapabilityTier::Low,
                use_worker: false,
                trial,
            };
        }

        let physics_budget = self.settings.frame_budget_ms() * Self::WORKER_PHYSICS_SHARE;
        let use_worker =
            self.available_cores >= Self::WORKER_MIN_CORES && trial.physics_time_ms >= physics_budget;

        QuickTestResult {
            recommended_particle_count: trial.recommended_particle_count,
            recommended_tier: recommended_tier(trial.score),
            use_worker,
            trial,
        }
    }

    /// 逐步增加粒子数直到平均帧耗时超过阈值
    pub fn stress_test(&self, stress: &StressSettings) -> StressTestResult {
        let step = stress.step.max(1);
        let frames = stress.frames_per_step.max(1);
        let mut steps = Vec::new();
        let mut max_sustainable_count = 0;
        let mut breaking_point = None;
        let mut memory_ceiling_mb: Option<f32> = None;

        let mut count = stress.start_count.max(1);
        while count <= stress.max_count {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                self.measure(count, stress.theme, frames, 0, false, false)
            }));
            let measurement = match outcome {
                Ok(Ok(measurement)) => measurement,
                Ok(Err(e)) => {
                    tracing::warn!(target: "benchmark", count, error = %e, "压力测试步骤失败");
                    breaking_point = Some(count);
                    break;
                }
                Err(panic) => {
                    tracing::warn!(target: "benchmark", count, error = %panic_message(&panic), "压力测试步骤崩溃");
                    breaking_point = Some(count);
                    break;
                }
            };

            let average_frame_ms = measurement.average_ms(FrameTiming::total);
            if let Some(memory) = measurement.memory_mb {
                memory_ceiling_mb = Some(memory_ceiling_mb.map_or(memory, |peak| peak.max(memory)));
            }
            let passed = average_frame_ms <= stress.failure_frame_ms;
            steps.push(StressStep {
                particle_count: count,
                average_frame_ms,
                memory_mb: measurement.memory_mb,
                passed,
            });
            tracing::debug!(target: "benchmark", count, average_frame_ms, passed, "压力测试步骤");

            if !passed {
                breaking_point = Some(count);
                break;
            }
            max_sustainable_count = count;
            count = match count.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }

        let (breaking_point, breaking_point_observed) = match breaking_point {
            Some(point) => (point, true),
            None => (Self::extrapolate_breaking_point(&steps, stress.failure_frame_ms), false),
        };

        tracing::info!(
            target: "benchmark",
            max_sustainable_count,
            breaking_point,
            breaking_point_observed,
            "压力测试完成"
        );

        StressTestResult {
            max_sustainable_count,
            breaking_point,
            breaking_point_observed,
            memory_ceiling_mb,
            steps,
        }
    }

    /// 按最后一步的每粒子耗时线性外推
    fn extrapolate_breaking_point(steps: &[StressStep], failure_frame_ms: f32) -> u32 {
        match steps.last() {
            Some(last) if last.average_frame_ms > 0.0 => {
                let estimate = last.particle_count as f32 * failure_frame_ms / last.average_frame_ms;
                (estimate.floor() as u32).max(last.particle_count + 1)
            }
            Some(last) => last.particle_count.saturating_add(1),
            None => 0,
        }
    }

    fn run_cell(&self, count: u32, theme: Theme, duration_ms: u64) -> BenchmarkResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.run_trial(count, theme, duration_ms)));
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => BenchmarkResult::failed(count, theme, e.to_string()),
            Err(panic) => BenchmarkResult::failed(count, theme, panic_message(&panic)),
        }
    }

    fn run_trial(&self, count: u32, theme: Theme, duration_ms: u64) -> FieldResult<BenchmarkResult> {
        let settings = &self.settings;
        let budget_ms = settings.frame_budget_ms();
        let frames = ((duration_ms as f32 / budget_ms).ceil() as u32).max(1);

        let measurement = self.measure(
            count,
            theme,
            frames,
            settings.warmup_frames,
            settings.include_interaction,
            settings.use_offload,
        )?;

        let monitor_settings = MonitorSettings {
            target_fps: settings.target_fps,
            sample_window: frames as usize,
            ..MonitorSettings::default()
        };
        let mut monitor = PerformanceMonitor::new(monitor_settings);
        monitor.start();
        // 向下取整到微秒，恰好在预算内的帧不算掉帧
        let budget = Duration::from_micros((budget_ms * 1000.0).floor() as u64);
        for timing in &measurement.timings {
            monitor.record_frame(timing.total().max(budget));
        }
        monitor.stop();

        let metrics = monitor.metrics();
        let report = monitor.report();
        let score = performance_score(
            metrics.fps,
            settings.target_fps,
            metrics.frame_drops,
            metrics.frame_count,
            report.frame_time_std_dev_ms,
            report.average_frame_time_ms,
        );

        Ok(BenchmarkResult {
            particle_count: count,
            theme,
            average_fps: metrics.fps,
            physics_time_ms: measurement.average_ms(|t| t.physics),
            render_time_ms: measurement.average_ms(|t| t.render),
            frame_time_std_dev_ms: report.frame_time_std_dev_ms,
            frame_drops: metrics.frame_drops,
            frames: metrics.frame_count,
            memory_mb: measurement.memory_mb.or(metrics.memory_usage_mb),
            score,
            recommended_particle_count: recommended_particle_count(count, score),
            error: None,
        })
    }

    /// 在一次性模拟实例上跑 `frames` 帧
    fn measure(
        &self,
        count: u32,
        theme: Theme,
        frames: u32,
        warmup_frames: u32,
        interaction: bool,
        offload: bool,
    ) -> FieldResult<Measurement> {
        let (width, height) = (self.settings.surface_width, self.settings.surface_height);

        let mut config = AdaptiveConfigFactory::new().config_for(CapabilityTier::High);
        config.particles.max_count = count;
        config.rendering.target_fps = self.settings.target_fps;
        let options = SimulationOptions {
            theme,
            interactive: interaction,
            offload,
            seed: Some(self.seed),
            ..SimulationOptions::default()
        };

        let mut simulation = ParticleSimulation::new(config, options);
        let mut surface = (self.surface_factory)(width, height);
        simulation.initialize(width, height)?;
        simulation.start()?;

        let pointer = simulation.pointer();
        let center = Vec2::new(width as f32, height as f32) * 0.5;
        let orbit = center.min_element() * 0.5;

        let mut timings = Vec::with_capacity(frames as usize);
        for frame in 0..(warmup_frames + frames) {
            if interaction {
                let position = center + Vec2::from_angle(frame as f32 * 0.1) * orbit;
                pointer.move_to(position.x, position.y);
            }
            let timing = simulation
                .tick(surface.as_mut())
                .ok_or_else(|| FieldError::General("trial simulation stopped unexpectedly".to_string()))?;
            if frame >= warmup_frames {
                timings.push(timing);
            }
        }
        simulation.stop();

        let memory_mb = platform_probe()
            .resident_bytes()
            .map(|bytes| bytes as f32 / (1024.0 * 1024.0));

        Ok(Measurement { timings, memory_mb })
    }
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new(BenchmarkSettings::default())
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
