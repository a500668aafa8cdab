use super::{Fill, RenderSurface};
use glam::Vec2;

/// 绘制命令
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    ClearRect { x: f32, y: f32, width: f32, height: f32 },
    FillCircle { center: Vec2, radius: f32, fill: Fill },
}

/// 只记录绘制命令的表面
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// 最近一次清除之后的命令
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|cmd| matches!(cmd, DrawCommand::ClearRect { .. }))
            .map_or(0, |index| index + 1);
        &self.commands[start..]
    }

    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::ClearRect { .. }))
            .count()
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::ClearRect { x, y, width, height });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, fill: Fill) {
        self.commands.push(DrawCommand::FillCircle { center, radius, fill });
    }
}
