/// 硬件检测错误处理
///
/// 检测阶段的任何错误都只在内部流转，对外统一降级为保守默认值

use thiserror::Error;

/// 硬件检测错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareError {
    /// GPU探测失败（渲染上下文创建被阻止或返回空）
    #[error("GPU探测失败: {reason}。尝试的方法: {attempted_methods:?}")]
    GpuProbeFailed {
        reason: String,
        attempted_methods: Vec<String>,
    },

    /// 硬件信号不可用
    #[error("硬件信号不可用 ({signal}): {reason}")]
    SignalUnavailable {
        signal: String,
        reason: String,
    },

    /// 信号值无法解析
    #[error("信号解析失败 ({signal}): {value}")]
    InvalidSignal {
        signal: String,
        value: String,
    },

    /// 后台检测线程失败
    #[error("后台检测失败: {0}")]
    DetectionThread(String),

    /// 其他错误
    #[error("硬件检测错误: {0}")]
    Other(String),
}

/// 硬件检测结果类型
pub type HardwareResult<T> = Result<T, HardwareError>;

/// 错误上下文扩展
pub trait ErrorContext<T> {
    /// 添加上下文信息
    fn context(self, context: &str) -> HardwareResult<T>;
}

impl<T, E: std::error::Error + 'static> ErrorContext<T> for Result<T, E> {
    fn context(self, context: &str) -> HardwareResult<T> {
        self.map_err(|e| HardwareError::Other(format!("{}: {}", context, e)))
    }
}

/// 信号降级：记录错误并返回默认值
pub fn degrade<T>(result: HardwareResult<T>, signal: &str, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            tracing::debug!(target: "hardware", signal, "信号降级为默认值: {}", error);
            default
        }
    }
}
