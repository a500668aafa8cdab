//! 渲染表面
//!
//! 模拟只依赖最小的二维光栅接口：清除矩形区域、填充圆形，以及径向渐变填充。
//!
//! - [`RasterSurface`] 软件光栅化到 RGBA8 缓冲区，可保存 PNG
//! - [`RecordingSurface`] 记录绘制命令，用于测试

pub mod raster;
pub mod recording;

pub use raster::RasterSurface;
pub use recording::{DrawCommand, RecordingSurface};

use crate::core::{FieldError, FieldResult};
use glam::Vec2;
use particle_field_hardware::EffectToggles;
use serde::{Deserialize, Serialize};

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 解析 `#RRGGBB` 或 `#RGB`
    pub fn from_hex(hex: &str) -> FieldResult<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || FieldError::InvalidColor(hex.to_string());
        if !digits.is_ascii() {
            return Err(invalid());
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// 填充方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    /// 纯色
    Solid { color: Color, alpha: f32 },
    /// 径向渐变：圆心为 `color` 全不透明，边缘透明，整体乘以 `alpha`
    RadialGradient { color: Color, alpha: f32 },
}

impl Fill {
    pub fn alpha(&self) -> f32 {
        match *self {
            Fill::Solid { alpha, .. } | Fill::RadialGradient { alpha, .. } => alpha,
        }
    }
}

/// 二维绘制表面
pub trait RenderSurface {
    /// 像素宽度
    fn width(&self) -> u32;

    /// 像素高度
    fn height(&self) -> u32;

    /// 清除矩形区域
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// 填充圆形
    fn fill_circle(&mut self, center: Vec2, radius: f32, fill: Fill);

    /// 清除整个表面
    fn clear(&mut self) {
        let (width, height) = (self.width() as f32, self.height() as f32);
        self.clear_rect(0.0, 0.0, width, height);
    }
}

/// 由效果开关推导的绘制风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStyle {
    /// 使用径向渐变，否则为纯色
    pub gradient: bool,
    /// 额外绘制一圈淡光晕
    pub glow: bool,
}

impl RenderStyle {
    /// 光晕半径倍数
    pub const GLOW_SCALE: f32 = 2.0;
    /// 光晕透明度倍数
    pub const GLOW_ALPHA: f32 = 0.25;

    pub fn from_effects(effects: &EffectToggles) -> Self {
        Self {
            gradient: effects.gradient,
            glow: effects.glow,
        }
    }

    /// 主体填充
    pub fn body_fill(&self, color: Color, alpha: f32) -> Fill {
        if self.gradient {
            Fill::RadialGradient { color, alpha }
        } else {
            Fill::Solid { color, alpha }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#8B5CF6").unwrap(), Color::rgb(0x8B, 0x5C, 0xF6));
        assert_eq!(Color::from_hex("fff").unwrap(), Color::rgb(255, 255, 255));
        assert!(matches!(Color::from_hex("#12345"), Err(FieldError::InvalidColor(_))));
        assert!(Color::from_hex("#GG0000").is_err());
    }

    #[test]
    fn test_render_style_from_effects() {
        let style = RenderStyle::from_effects(&EffectToggles {
            blur: true,
            shadow: true,
            gradient: false,
            glow: true,
        });
        assert!(!style.gradient);
        assert!(style.glow);
        assert!(matches!(style.body_fill(Color::rgb(1, 2, 3), 0.5), Fill::Solid { .. }));
    }
}
