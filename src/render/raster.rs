//! 软件光栅表面
//!
//! 以 `image::RgbaImage` 为后备缓冲，源覆盖（source-over）混合。

use super::{Color, Fill, RenderSurface};
use crate::core::FieldResult;
use glam::Vec2;
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;

/// 软件光栅表面
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    background: Rgba<u8>,
}

impl RasterSurface {
    /// 默认背景色
    pub const DEFAULT_BACKGROUND: Color = Color::rgb(0x0B, 0x0B, 0x14);

    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Self::DEFAULT_BACKGROUND)
    }

    pub fn with_background(width: u32, height: u32, background: Color) -> Self {
        let background = Rgba([background.r, background.g, background.b, 255]);
        Self {
            image: RgbaImage::from_pixel(width, height, background),
            background,
        }
    }

    /// 读取像素
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.image.width() && y < self.image.height() {
            Some(self.image.get_pixel(x, y).0)
        } else {
            None
        }
    }

    /// 与背景不同的像素数量
    pub fn painted_pixels(&self) -> usize {
        self.image.pixels().filter(|p| **p != self.background).count()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// 调整尺寸并清空
    pub fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::from_pixel(width, height, self.background);
    }

    /// 保存 PNG 快照
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> FieldResult<()> {
        self.image.save_with_format(path.as_ref(), ImageFormat::Png)?;
        tracing::debug!(target: "field", path = %path.as_ref().display(), "已保存快照");
        Ok(())
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x, y);
        let mix = |src: u8, dst: u8| -> u8 {
            (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8
        };
        let dst_alpha = dst.0[3] as f32 / 255.0;
        let out_alpha = alpha + dst_alpha * (1.0 - alpha);
        *dst = Rgba([
            mix(color.r, dst.0[0]),
            mix(color.g, dst.0[1]),
            mix(color.b, dst.0[2]),
            (out_alpha * 255.0).round() as u8,
        ]);
    }
}

impl RenderSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let x0 = x.max(0.0) as u32;
        let y0 = y.max(0.0) as u32;
        let x1 = ((x + width).max(0.0).ceil() as u32).min(self.image.width());
        let y1 = ((y + height).max(0.0).ceil() as u32).min(self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, self.background);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, fill: Fill) {
        if radius <= 0.0 || !center.is_finite() {
            return;
        }
        let (width, height) = (self.image.width() as f32, self.image.height() as f32);
        let x0 = (center.x - radius).floor().max(0.0) as u32;
        let y0 = (center.y - radius).floor().max(0.0) as u32;
        let x1 = (center.x + radius).ceil().min(width).max(0.0) as u32;
        let y1 = (center.y + radius).ceil().min(height).max(0.0) as u32;

        for py in y0..y1 {
            for px in x0..x1 {
                let sample = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let distance = sample.distance(center);
                if distance > radius {
                    continue;
                }
                let (color, alpha) = match fill {
                    Fill::Solid { color, alpha } => (color, alpha),
                    Fill::RadialGradient { color, alpha } => (color, alpha * (1.0 - distance / radius)),
                };
                self.blend(px, py, color, alpha);
            }
        }
    }
}
