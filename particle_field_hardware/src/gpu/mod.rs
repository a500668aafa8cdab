//! GPU识别模块

pub mod detect;

pub use detect::{classify_renderer, GpuClass, GpuTokenTable};
