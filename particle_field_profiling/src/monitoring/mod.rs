//! 性能监控
//!
//! - `sampler` - 帧时间与内存采样
//! - `memory` - 进程内存探针
//! - `subscribers` - 观察者列表
//! - `window` - 滑动采样窗口
//! - `performance_monitor` - 组合监控器

pub mod memory;
pub mod performance_monitor;
pub mod sampler;
pub mod subscribers;
pub mod window;

pub use memory::{platform_probe, MemoryProbe, ProcStatmProbe, UnavailableMemoryProbe};
pub use performance_monitor::{MonitorReport, MonitorSettings, PerformanceMetrics, PerformanceMonitor};
pub use window::SampleWindow;
pub use sampler::{FrameTimeSampler, MemoryMonitor};
pub use subscribers::{SubscriberList, Subscription};
