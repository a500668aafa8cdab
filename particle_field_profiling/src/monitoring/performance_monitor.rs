//! 性能监控器
//!
//! 连续采样帧间隔，推导平滑FPS、掉帧计数和近似内存占用，
//! 每次采样后通知全部订阅者。监控器只提出建议，从不直接修改配置。

use super::memory::{platform_probe, MemoryProbe};
use super::sampler::{FrameTimeSampler, MemoryMonitor};
use super::subscribers::{SubscriberList, Subscription};
use crate::adaptation::{AdaptationPolicy, AdaptationSuggestion};
use crate::impl_default;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 监控器设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// 目标帧率，决定帧预算
    pub target_fps: u32,
    /// 平滑窗口大小（帧）
    pub sample_window: usize,
    /// 低于该FPS视为性能不足
    pub throttle_fps: f32,
    /// 低于该FPS时建议简化渲染
    pub critical_fps: f32,
    /// 连续多少个样本才算持续退化
    pub sustained_samples: u32,
    /// 内存告警阈值（MB）
    pub memory_threshold_mb: f32,
    /// 每隔多少帧采样一次内存
    pub memory_sample_interval: u32,
}

impl_default!(MonitorSettings {
    target_fps: 60,
    sample_window: 60,
    throttle_fps: 30.0,
    critical_fps: 20.0,
    sustained_samples: 10,
    memory_threshold_mb: 100.0,
    memory_sample_interval: 60,
});

impl MonitorSettings {
    /// 帧预算（毫秒）
    pub fn frame_budget_ms(&self) -> f32 {
        1000.0 / self.target_fps.max(1) as f32
    }
}

/// 性能指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 平滑FPS
    pub fps: f32,
    /// 最近一帧耗时（毫秒）
    pub frame_time_ms: f32,
    /// 累计掉帧数
    pub frame_drops: u64,
    /// 当前连续掉帧数
    pub consecutive_drops: u32,
    /// 当前连续低FPS样本数
    pub low_fps_streak: u32,
    /// 近似内存占用（MB），不可用时为 `None`
    pub memory_usage_mb: Option<f32>,
    /// 持续低于节流阈值
    pub is_throttled: bool,
    /// 已采样帧数
    pub frame_count: u64,
}

/// 监控报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorReport {
    pub current_fps: f32,
    pub average_frame_time_ms: f32,
    pub min_frame_time_ms: Option<f32>,
    pub max_frame_time_ms: Option<f32>,
    pub p99_frame_time_ms: Option<f32>,
    pub frame_time_std_dev_ms: f32,
    pub frame_drops: u64,
    pub frame_count: u64,
    pub peak_memory_mb: Option<f32>,
}

/// 性能监控器
pub struct PerformanceMonitor {
    settings: MonitorSettings,
    policy: AdaptationPolicy,
    sampler: FrameTimeSampler,
    memory: MemoryMonitor,
    probe: Box<dyn MemoryProbe>,
    metrics: PerformanceMetrics,
    subscribers: SubscriberList<PerformanceMetrics>,
    running: bool,
}

impl PerformanceMonitor {
    /// 使用平台默认内存探针
    pub fn new(settings: MonitorSettings) -> Self {
        Self::with_probe(settings, platform_probe())
    }

    pub fn with_probe(settings: MonitorSettings, probe: Box<dyn MemoryProbe>) -> Self {
        let policy = AdaptationPolicy::from_settings(&settings);
        Self {
            sampler: FrameTimeSampler::new(settings.sample_window),
            memory: MemoryMonitor::new(settings.sample_window),
            probe,
            policy,
            settings,
            metrics: PerformanceMetrics::default(),
            subscribers: SubscriberList::new(),
            running: false,
        }
    }

    /// 开始监控
    pub fn start(&mut self) {
        if !self.running {
            tracing::debug!(target: "monitor", target_fps = self.settings.target_fps, "开始监控");
        }
        self.running = true;
        self.sampler.restart_clock();
    }

    /// 停止监控，已有指标保留
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(target: "monitor", frames = self.metrics.frame_count, "停止监控");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 按墙钟记录一帧，宿主在每个动画帧调用
    pub fn frame(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match self.sampler.sample_frame() {
            Some(frame_time) => {
                self.process_sample(frame_time);
                true
            }
            None => false,
        }
    }

    /// 记录外部测得的帧时间
    ///
    /// 未启动时忽略，返回 `false`。
    pub fn record_frame(&mut self, frame_time: Duration) -> bool {
        if !self.running {
            return false;
        }
        self.sampler.push(frame_time);
        self.process_sample(frame_time);
        true
    }

    fn process_sample(&mut self, frame_time: Duration) {
        let frame_ms = frame_time.as_secs_f32() * 1000.0;
        let metrics = &mut self.metrics;

        metrics.frame_count += 1;
        metrics.frame_time_ms = frame_ms;
        metrics.fps = self.sampler.fps();

        if frame_ms > self.settings.frame_budget_ms() {
            metrics.frame_drops += 1;
            metrics.consecutive_drops += 1;
        } else {
            metrics.consecutive_drops = 0;
        }

        if metrics.fps < self.settings.throttle_fps {
            metrics.low_fps_streak += 1;
        } else {
            metrics.low_fps_streak = 0;
        }
        metrics.is_throttled = metrics.low_fps_streak >= self.settings.sustained_samples;

        let interval = self.settings.memory_sample_interval.max(1) as u64;
        if metrics.frame_count % interval == 1 || interval == 1 {
            if let Some(bytes) = self.probe.resident_bytes() {
                self.memory.sample_memory(bytes);
            }
            metrics.memory_usage_mb = self.memory.current_memory_mb();
        }

        let snapshot = *metrics;
        self.subscribers.notify(&snapshot);
    }

    /// 当前指标快照
    pub fn metrics(&self) -> PerformanceMetrics {
        self.metrics
    }

    /// 订阅每次采样
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&PerformanceMetrics) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// 基于当前指标的降级建议
    pub fn suggestions(&self) -> Vec<AdaptationSuggestion> {
        self.policy.evaluate(&self.metrics)
    }

    pub fn policy(&self) -> &AdaptationPolicy {
        &self.policy
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// 修改目标帧率（配置切换后由宿主调用）
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.settings.target_fps = target_fps.max(1);
        self.metrics.consecutive_drops = 0;
    }

    /// 清空指标与窗口
    pub fn reset(&mut self) {
        self.sampler.clear();
        self.memory.clear();
        self.metrics = PerformanceMetrics::default();
    }

    /// 生成报告
    pub fn report(&self) -> MonitorReport {
        MonitorReport {
            current_fps: self.metrics.fps,
            average_frame_time_ms: self.sampler.average_frame_time_ms(),
            min_frame_time_ms: self.sampler.min_frame_time_ms(),
            max_frame_time_ms: self.sampler.max_frame_time_ms(),
            p99_frame_time_ms: self.sampler.percentile_ms(99.0),
            frame_time_std_dev_ms: self.sampler.std_dev_ms(),
            frame_drops: self.metrics.frame_drops,
            frame_count: self.metrics.frame_count,
            peak_memory_mb: self.memory.peak_memory_mb(),
        }
    }
}
