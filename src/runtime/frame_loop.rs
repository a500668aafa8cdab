//! 帧驱动

use super::ParticleField;
use crate::render::RenderSurface;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// 跨线程停止信号
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stop_flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求停止，当前帧结束后生效
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }
}

/// 帧循环
///
/// 每帧之前检查停止信号；收到信号后停止粒子场并返回，不再执行任何 tick。
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    stop: StopHandle,
    pacing: Option<Duration>,
}

impl FrameLoop {
    /// 不限速
    pub fn new() -> Self {
        Self::default()
    }

    /// 按目标帧率休眠补齐帧预算
    pub fn paced(target_fps: u32) -> Self {
        Self {
            stop: StopHandle::new(),
            pacing: Some(Duration::from_nanos(1_000_000_000 / target_fps.max(1) as u64)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn pacing(&self) -> Option<Duration> {
        self.pacing
    }

    /// 运行到停止信号、帧数上限或粒子场不再运行为止，返回执行的帧数
    pub fn run(&self, field: &mut ParticleField, surface: &mut dyn RenderSurface, max_frames: Option<u64>) -> u64 {
        let mut frames = 0u64;
        loop {
            if self.stop.is_stopped() {
                field.stop();
                break;
            }
            if max_frames.is_some_and(|max| frames >= max) {
                break;
            }

            let frame_start = Instant::now();
            if field.frame(surface).is_none() {
                break;
            }
            frames += 1;

            if let Some(budget) = self.pacing {
                let elapsed = frame_start.elapsed();
                if elapsed < budget {
                    thread::sleep(budget - elapsed);
                }
            }
        }

        tracing::debug!(target: "field", frames, stopped = self.stop.is_stopped(), "帧循环结束");
        frames
    }
}
