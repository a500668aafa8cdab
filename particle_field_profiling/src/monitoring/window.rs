//! 滑动采样窗口
//!
//! 保存最近 N 个毫秒级样本，并维护累计和，均值查询为 O(1)。

use std::collections::VecDeque;

/// 固定长度的 `f32` 样本窗口
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f32>,
    limit: usize,
    sum: f64,
}

impl SampleWindow {
    /// 窗口长度至少为 1
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
            sum: 0.0,
        }
    }

    /// 写入样本，满时淘汰最旧的
    pub fn record(&mut self, sample: f32) {
        if self.samples.len() == self.limit {
            if let Some(evicted) = self.samples.pop_front() {
                self.sum -= evicted as f64;
            }
        }
        self.samples.push_back(sample);
        self.sum += sample as f64;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }

    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// 均值，空窗口为 0
    pub fn mean(&self) -> f32 {
        if self.samples.is_empty() {
            0.0
        } else {
            (self.sum / self.samples.len() as f64) as f32
        }
    }

    pub fn min(&self) -> Option<f32> {
        self.samples.iter().copied().reduce(f32::min)
    }

    pub fn max(&self) -> Option<f32> {
        self.samples.iter().copied().reduce(f32::max)
    }

    /// 总体标准差，少于两个样本时为 0
    pub fn std_dev(&self) -> f32 {
        let n = self.samples.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.sum / n as f64;
        let squares: f64 = self.samples.iter().map(|&s| (s as f64 - mean).powi(2)).sum();
        (squares / n as f64).sqrt() as f32
    }

    /// 最近邻秩百分位
    pub fn percentile(&self, p: f32) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<f32> = self.samples.iter().copied().collect();
        sorted.sort_by(f32::total_cmp);
        let rank = ((p.clamp(0.0, 100.0) / 100.0) * sorted.len() as f32).ceil() as usize;
        Some(sorted[rank.clamp(1, sorted.len()) - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_eviction_keeps_latest() {
        let mut window = SampleWindow::new(3);
        for sample in [10.0, 20.0, 30.0, 40.0] {
            window.record(sample);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.latest(), Some(40.0));
        assert_eq!(window.mean(), 30.0);
        assert_eq!(window.min(), Some(20.0));
        assert_eq!(window.max(), Some(40.0));
    }

    #[test]
    fn test_percentile_and_spread() {
        let mut window = SampleWindow::new(100);
        for i in 1..=100 {
            window.record(i as f32);
        }
        assert_eq!(window.percentile(50.0), Some(50.0));
        assert_eq!(window.percentile(0.0), Some(1.0));
        assert_eq!(window.percentile(100.0), Some(100.0));

        let mut steady = SampleWindow::new(10);
        for _ in 0..10 {
            steady.record(16.0);
        }
        assert_eq!(steady.std_dev(), 0.0);
    }

    #[test]
    fn test_empty_and_zero_limit() {
        let mut window = SampleWindow::new(0);
        assert_eq!(window.limit(), 1);
        assert_eq!(window.mean(), 0.0);
        assert_eq!(window.percentile(50.0), None);
        window.record(5.0);
        window.record(7.0);
        assert_eq!(window.len(), 1);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.mean(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_running_mean_matches_recomputed(
            limit in 1usize..32,
            samples in proptest::collection::vec(0.0f32..200.0, 0..100),
        ) {
            let mut window = SampleWindow::new(limit);
            for &sample in &samples {
                window.record(sample);
            }
            let kept = &samples[samples.len().saturating_sub(limit)..];
            let expected = if kept.is_empty() { 0.0 } else { kept.iter().sum::<f32>() / kept.len() as f32 };
            prop_assert!((window.mean() - expected).abs() < 1e-2);
            prop_assert!(window.len() <= limit);
        }
    }
}
