//! 帧时间与内存采样器

use super::window::SampleWindow;
use std::time::{Duration, Instant};

/// 帧时间采样器
///
/// 在固定窗口内做简单平均得到平滑FPS。
#[derive(Debug, Clone)]
pub struct FrameTimeSampler {
    /// 帧时间窗口（毫秒）
    samples: SampleWindow,
    /// 上一帧时间戳，`None` 表示尚未开始计时
    last_frame: Option<Instant>,
}

impl FrameTimeSampler {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: SampleWindow::new(max_samples),
            last_frame: None,
        }
    }

    /// 按墙钟记录一帧
    ///
    /// 第一次调用只建立起点，返回 `None`。
    pub fn sample_frame(&mut self) -> Option<Duration> {
        let now = Instant::now();
        let frame_time = self.last_frame.map(|last| now.duration_since(last));
        self.last_frame = Some(now);

        if let Some(frame_time) = frame_time {
            self.push(frame_time);
        }
        frame_time
    }

    /// 记录外部测得的帧时间
    pub fn push(&mut self, frame_time: Duration) {
        self.samples.record(frame_time.as_secs_f32() * 1000.0);
    }

    /// 平均帧时间（毫秒）
    pub fn average_frame_time_ms(&self) -> f32 {
        self.samples.mean()
    }

    /// 平滑 FPS
    pub fn fps(&self) -> f32 {
        let avg = self.average_frame_time_ms();
        if avg <= 0.0 {
            0.0
        } else {
            1000.0 / avg
        }
    }

    pub fn min_frame_time_ms(&self) -> Option<f32> {
        self.samples.min()
    }

    pub fn max_frame_time_ms(&self) -> Option<f32> {
        self.samples.max()
    }

    pub fn std_dev_ms(&self) -> f32 {
        self.samples.std_dev()
    }

    pub fn percentile_ms(&self, p: f32) -> Option<f32> {
        self.samples.percentile(p)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 重新计时（不清空窗口）
    pub fn restart_clock(&mut self) {
        self.last_frame = None;
    }

    /// 清空采样
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_frame = None;
    }
}

/// 内存监控器
#[derive(Debug, Clone)]
pub struct MemoryMonitor {
    history: SampleWindow,
}

impl MemoryMonitor {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: SampleWindow::new(max_history),
        }
    }

    /// 记录内存使用（字节）
    pub fn sample_memory(&mut self, bytes: u64) {
        self.history.record(bytes as f32 / (1024.0 * 1024.0));
    }

    /// 当前内存使用 (MB)
    pub fn current_memory_mb(&self) -> Option<f32> {
        self.history.latest()
    }

    /// 峰值内存 (MB)
    pub fn peak_memory_mb(&self) -> Option<f32> {
        self.history.max()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_frame_sampler_wall_clock() {
        let mut sampler = FrameTimeSampler::new(10);

        assert!(sampler.sample_frame().is_none());
        for _ in 0..3 {
            thread::sleep(Duration::from_millis(5));
            assert!(sampler.sample_frame().is_some());
        }

        assert_eq!(sampler.len(), 3);
        assert!(sampler.fps() > 0.0);
        assert!(sampler.average_frame_time_ms() >= 5.0);
    }

    #[test]
    fn test_frame_sampler_synthetic() {
        let mut sampler = FrameTimeSampler::new(4);
        for ms in [10, 20, 30, 40, 50] {
            sampler.push(Duration::from_millis(ms));
        }
        assert_eq!(sampler.len(), 4);
        assert!((sampler.average_frame_time_ms() - 35.0).abs() < 1e-3);
        assert!((sampler.min_frame_time_ms().unwrap() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_memory_monitor() {
        let mut monitor = MemoryMonitor::new(10);
        assert_eq!(monitor.current_memory_mb(), None);

        monitor.sample_memory(3 * 1024 * 1024);
        monitor.sample_memory(1024 * 1024);

        assert_eq!(monitor.current_memory_mb(), Some(1.0));
        assert_eq!(monitor.peak_memory_mb(), Some(3.0));
    }
}
