//! 共享指针位置
//!
//! 事件处理方写入、物理步骤只读。两个坐标打包进一个 `AtomicU64`，读写都是单次原子操作。

use glam::Vec2;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const UNKNOWN: u64 = u64::MAX;

fn pack(position: Vec2) -> u64 {
    ((position.x.to_bits() as u64) << 32) | position.y.to_bits() as u64
}

fn unpack(bits: u64) -> Vec2 {
    Vec2::new(f32::from_bits((bits >> 32) as u32), f32::from_bits(bits as u32))
}

/// 指针位置句柄，可克隆后交给事件处理方
#[derive(Debug, Clone)]
pub struct PointerHandle {
    bits: Arc<AtomicU64>,
}

impl PointerHandle {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(UNKNOWN)),
        }
    }

    /// 指针移动到表面坐标 `(x, y)`，非有限值被忽略
    pub fn move_to(&self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.bits.store(pack(Vec2::new(x, y)), Ordering::Relaxed);
        }
    }

    /// 指针离开表面
    pub fn leave(&self) {
        self.bits.store(UNKNOWN, Ordering::Relaxed);
    }

    /// 最近一次已知位置
    pub fn position(&self) -> Option<Vec2> {
        match self.bits.load(Ordering::Relaxed) {
            UNKNOWN => None,
            bits => Some(unpack(bits)),
        }
    }
}

impl Default for PointerHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_round_trip() {
        let pointer = PointerHandle::new();
        assert_eq!(pointer.position(), None);

        pointer.move_to(12.5, -3.0);
        assert_eq!(pointer.position(), Some(Vec2::new(12.5, -3.0)));

        pointer.move_to(f32::NAN, 1.0);
        assert_eq!(pointer.position(), Some(Vec2::new(12.5, -3.0)));

        pointer.leave();
        assert_eq!(pointer.position(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let pointer = PointerHandle::new();
        let writer = pointer.clone();
        std::thread::spawn(move || writer.move_to(4.0, 8.0)).join().unwrap();
        assert_eq!(pointer.position(), Some(Vec2::new(4.0, 8.0)));
    }
}
