//! 统一错误处理模块
//!
//! 粒子场范围内的错误类型定义。
//!
//! 运行期的大部分故障（信号缺失、后台线程超时、单个基准单元失败）都在内部降级，
//! 只有构造期误用和配置文件加载会以 `Err` 形式返回给调用方。

use crate::config::ConfigError;
use particle_field_hardware::HardwareError;
use thiserror::Error;

/// 粒子场核心错误类型
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidState { from: &'static str, to: &'static str },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Physics worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image encode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("General error: {0}")]
    General(String),
}

/// 后台物理线程错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Worker unavailable: {0}")]
    Unavailable(String),

    #[error("Worker timed out after {0}ms")]
    Timeout(u64),

    #[error("Worker disconnected")]
    Disconnected,

    #[error("Worker response out of sequence: expected {expected}, got {actual}")]
    OutOfSequence { expected: u64, actual: u64 },
}

/// 粒子场结果类型别名
pub type FieldResult<T> = Result<T, FieldError>;
pub type WorkerResult<T> = Result<T, WorkerError>;
