use super::theme::{ThemeParams, ValueRange};
use crate::render::Color;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// 粒子寿命范围（帧），淡出逻辑预留
pub const LIFE_RANGE: ValueRange = ValueRange::new(300.0, 900.0);

/// 粒子数据
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// 模拟内唯一编号，初始化时顺序分配
    pub id: u64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub opacity: f32,
    pub color: Color,
    /// 剩余寿命，当前不参与步进
    pub life: f32,
    pub max_life: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            id: 0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: 1.0,
            opacity: 1.0,
            color: Color::rgb(255, 255, 255),
            life: LIFE_RANGE.max,
            max_life: LIFE_RANGE.max,
        }
    }
}

impl Particle {
    /// 在给定表面内随机生成一个粒子
    ///
    /// 位置落在 `[radius, dimension - radius]` 内；表面小于直径时取中心。
    /// 编号为 0，由调用方分配。
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: Vec2, params: &ThemeParams, palette: &[Color]) -> Self {
        let radius = params.size.sample(rng);
        let axis = |rng: &mut R, extent: f32| {
            if extent > radius * 2.0 {
                rng.gen_range(radius..=extent - radius)
            } else {
                extent * 0.5
            }
        };
        let position = Vec2::new(axis(&mut *rng, bounds.x), axis(&mut *rng, bounds.y));

        let speed = params.speed.sample(rng);
        let angle = rng.gen_range(0.0..TAU);
        let velocity = Vec2::from_angle(angle) * speed;

        let color = if palette.is_empty() {
            Color::rgb(255, 255, 255)
        } else {
            palette[rng.gen_range(0..palette.len())]
        };

        let opacity = params.opacity.sample(rng);
        let max_life = LIFE_RANGE.sample(rng);

        Self {
            id: 0,
            position,
            velocity,
            radius,
            opacity,
            color,
            life: max_life,
            max_life,
        }
    }
}
