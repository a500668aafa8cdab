/// 异步设备检测
///
/// 在后台线程执行检测，避免阻塞主线程；结果仍写入检测器自身的缓存，
/// 因此重复调用是幂等的。

use crate::{DeviceDetector, DeviceInfo, HardwareError, HardwareResult};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// 检测状态
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionState {
    /// 检测中
    InProgress,
    /// 已完成
    Completed,
    /// 失败
    Failed(String),
}

/// 后台检测任务句柄
pub struct DetectionTask {
    receiver: Receiver<DeviceInfo>,
    result: Mutex<Option<HardwareResult<DeviceInfo>>>,
    started: Instant,
}

impl DetectionTask {
    fn resolve(&self, received: Result<DeviceInfo, HardwareError>) {
        if let Ok(mut slot) = self.result.lock() {
            if slot.is_none() {
                *slot = Some(received);
            }
        }
    }

    fn cached(&self) -> Option<HardwareResult<DeviceInfo>> {
        self.result.lock().ok().and_then(|slot| slot.clone())
    }

    /// 当前状态
    pub fn state(&self) -> DetectionState {
        let _ = self.try_get();
        match self.cached() {
            None => DetectionState::InProgress,
            Some(Ok(_)) => DetectionState::Completed,
            Some(Err(e)) => DetectionState::Failed(e.to_string()),
        }
    }

    /// 获取结果（非阻塞）
    pub fn try_get(&self) -> Option<HardwareResult<DeviceInfo>> {
        if let Some(result) = self.cached() {
            return Some(result);
        }
        match self.receiver.try_recv() {
            Ok(info) => self.resolve(Ok(info)),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => self.resolve(Err(HardwareError::DetectionThread(
                "检测线程提前退出".to_string(),
            ))),
        }
        self.cached()
    }

    /// 等待结果（阻塞）
    pub fn wait(&self) -> HardwareResult<DeviceInfo> {
        if let Some(result) = self.cached() {
            return result;
        }
        let received = self
            .receiver
            .recv()
            .map_err(|_| HardwareError::DetectionThread("检测线程提前退出".to_string()));
        self.resolve(received);
        self.cached()
            .unwrap_or_else(|| Err(HardwareError::DetectionThread("结果丢失".to_string())))
    }

    /// 已等待时长
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl DeviceDetector {
    /// 在后台线程检测设备信息
    pub fn detect_async(self: Arc<Self>) -> DetectionTask {
        let (sender, receiver) = bounded(1);
        let started = Instant::now();

        let spawned = thread::Builder::new()
            .name("device-detect".to_string())
            .spawn(move || {
                let info = self.detect().clone();
                tracing::debug!(
                    target: "hardware",
                    "后台检测耗时 {:.2}ms",
                    started.elapsed().as_secs_f64() * 1000.0
                );
                let _ = sender.send(info);
            });

        let task = DetectionTask {
            receiver,
            result: Mutex::new(None),
            started,
        };

        if let Err(e) = spawned {
            tracing::warn!(target: "hardware", "无法启动检测线程: {}", e);
            task.resolve(Err(HardwareError::DetectionThread(e.to_string())));
        }

        task
    }
}
