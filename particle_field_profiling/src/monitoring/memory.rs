//! 进程内存探针
//!
//! 宿主不提供内存信息时返回 `None`，绝不报错。

/// 内存探针
pub trait MemoryProbe: Send {
    /// 当前常驻内存（字节）
    fn resident_bytes(&self) -> Option<u64>;
}

/// 不可用的探针
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableMemoryProbe;

impl MemoryProbe for UnavailableMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}

/// 读取 `/proc/self/statm` 的探针
#[derive(Debug, Clone, Copy)]
pub struct ProcStatmProbe {
    page_size: u64,
}

impl ProcStatmProbe {
    /// 常见页大小
    pub const DEFAULT_PAGE_SIZE: u64 = 4096;

    pub fn new() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// 解析 statm 内容，第二列为常驻页数
    pub fn parse_statm(content: &str, page_size: u64) -> Option<u64> {
        content
            .split_whitespace()
            .nth(1)
            .and_then(|pages| pages.parse::<u64>().ok())
            .map(|pages| pages * page_size)
    }
}

impl Default for ProcStatmProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcStatmProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let content = std::fs::read_to_string("/proc/self/statm").ok()?;
        Self::parse_statm(&content, self.page_size)
    }
}

/// 当前平台的默认探针
pub fn platform_probe() -> Box<dyn MemoryProbe> {
    if cfg!(target_os = "linux") {
        Box::new(ProcStatmProbe::new())
    } else {
        Box::new(UnavailableMemoryProbe)
    }
}
