//! 宿主环境能力查询
//!
//! 所有硬件信号都经由 [`HostEnvironment`] 读取：
//! - [`SystemHost`] 读取真实系统（num_cpus、/proc、lspci、sysfs）
//! - [`FakeHost`] 完全确定，用于测试

use crate::error::{degrade, ErrorContext, HardwareError, HardwareResult};
use serde::{Deserialize, Serialize};

/// 屏幕几何信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl ScreenGeometry {
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// 像素预算（宽×高×像素比）
    pub fn pixel_budget(&self) -> f64 {
        self.width as f64 * self.height as f64 * self.pixel_ratio.max(0.0) as f64
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::new(1920, 1080, 1.0)
    }
}

/// 特性支持位集
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSupport {
    /// 基础加速渲染上下文
    pub webgl: bool,
    /// 新一代加速渲染上下文
    pub webgl2: bool,
    /// 后台工作线程
    pub background_workers: bool,
    /// 可见性观察接口
    pub intersection_observer: bool,
}

/// 宿主环境能力查询接口
///
/// 任何方法都不应 panic；不可用的信号返回 `None` 或 `Err`，
/// 由调用方降级为默认值。
pub trait HostEnvironment: Send + Sync {
    /// 逻辑核心数
    fn logical_cores(&self) -> Option<usize>;

    /// 设备内存估计（GB）
    fn device_memory_gb(&self) -> Option<f32>;

    /// 用一次性渲染上下文探测GPU标识
    ///
    /// `Err` 表示探测本身失败，`Ok(None)` 表示上下文返回空。
    fn probe_gpu_renderer(&self) -> HardwareResult<Option<String>>;

    /// 屏幕几何
    fn screen(&self) -> ScreenGeometry;

    /// 网络连接类别（例如 "4g"、"wifi"）
    fn connection_class(&self) -> Option<String>;

    /// 特性支持
    fn features(&self) -> FeatureSupport;

    /// 用户是否偏好减少动画
    fn prefers_reduced_motion(&self) -> bool;

    /// 电池电量（0.0-1.0），不可用时为 `None`
    fn battery_level(&self) -> Option<f32>;
}

/// 真实系统宿主
#[derive(Debug, Clone)]
pub struct SystemHost {
    screen: ScreenGeometry,
    reduced_motion: bool,
}

impl SystemHost {
    /// 环境变量：覆盖GPU标识
    pub const GPU_OVERRIDE_ENV: &'static str = "PARTICLE_FIELD_GPU";
    /// 环境变量：减少动画
    pub const REDUCED_MOTION_ENV: &'static str = "PARTICLE_FIELD_REDUCED_MOTION";
    /// 环境变量：网络类别
    pub const CONNECTION_ENV: &'static str = "PARTICLE_FIELD_CONNECTION";

    /// 创建系统宿主，屏幕几何由调用方提供（无窗口环境下无法查询）
    pub fn new(screen: ScreenGeometry) -> Self {
        let reduced_motion = std::env::var(Self::REDUCED_MOTION_ENV)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            screen,
            reduced_motion,
        }
    }

    /// 设置减少动画偏好
    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    #[cfg(target_os = "linux")]
    fn read_meminfo_gb() -> HardwareResult<f32> {
        let content = std::fs::read_to_string("/proc/meminfo").context("读取/proc/meminfo")?;
        for line in content.lines() {
            if line.starts_with("MemTotal:") {
                if let Some(kb) = line.split_whitespace().nth(1) {
                    let kb_val: u64 = kb.parse().map_err(|_| HardwareError::InvalidSignal {
                        signal: "MemTotal".to_string(),
                        value: kb.to_string(),
                    })?;
                    return Ok(kb_val as f32 / (1024.0 * 1024.0));
                }
            }
        }
        Err(HardwareError::SignalUnavailable {
            signal: "memory".to_string(),
            reason: "MemTotal 缺失".to_string(),
        })
    }

    #[cfg(target_os = "macos")]
    fn read_meminfo_gb() -> HardwareResult<f32> {
        use std::process::Command;
        let output = Command::new("sysctl")
            .arg("-n")
            .arg("hw.memsize")
            .output()
            .context("执行sysctl")?;
        let text = String::from_utf8_lossy(&output.stdout);
        let bytes: u64 = text.trim().parse().map_err(|_| HardwareError::InvalidSignal {
            signal: "hw.memsize".to_string(),
            value: text.trim().to_string(),
        })?;
        Ok(bytes as f32 / (1024.0 * 1024.0 * 1024.0))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fn read_meminfo_gb() -> HardwareResult<f32> {
        Err(HardwareError::SignalUnavailable {
            signal: "memory".to_string(),
            reason: "平台不支持".to_string(),
        })
    }

    #[cfg(target_os = "linux")]
    fn probe_gpu_system() -> HardwareResult<Option<String>> {
        use std::process::Command;

        let output = Command::new("lspci").output().map_err(|e| HardwareError::GpuProbeFailed {
            reason: e.to_string(),
            attempted_methods: vec!["lspci".to_string()],
        })?;
        let text = String::from_utf8_lossy(&output.stdout);
        let name = text
            .lines()
            .filter(|line| line.contains("VGA") || line.contains("3D"))
            .find_map(|line| line.splitn(3, ':').nth(2))
            .map(|name| name.trim().to_string());
        Ok(name)
    }

    #[cfg(not(target_os = "linux"))]
    fn probe_gpu_system() -> HardwareResult<Option<String>> {
        Err(HardwareError::GpuProbeFailed {
            reason: "平台不支持".to_string(),
            attempted_methods: vec![],
        })
    }

    #[cfg(target_os = "linux")]
    fn read_battery_level() -> Option<f32> {
        let entries = std::fs::read_dir("/sys/class/power_supply").ok()?;
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("BAT"))
            .find_map(|entry| {
                let capacity = std::fs::read_to_string(entry.path().join("capacity")).ok()?;
                capacity.trim().parse::<f32>().ok()
            })
            .map(|percent| (percent / 100.0).clamp(0.0, 1.0))
    }

    #[cfg(not(target_os = "linux"))]
    fn read_battery_level() -> Option<f32> {
        None
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new(ScreenGeometry::default())
    }
}

impl HostEnvironment for SystemHost {
    fn logical_cores(&self) -> Option<usize> {
        Some(num_cpus::get()).filter(|&n| n > 0)
    }

    fn device_memory_gb(&self) -> Option<f32> {
        degrade(Self::read_meminfo_gb().map(Some), "memory", None)
    }

    fn probe_gpu_renderer(&self) -> HardwareResult<Option<String>> {
        if let Ok(name) = std::env::var(Self::GPU_OVERRIDE_ENV) {
            return Ok(Some(name));
        }
        Self::probe_gpu_system()
    }

    fn screen(&self) -> ScreenGeometry {
        self.screen
    }

    fn connection_class(&self) -> Option<String> {
        std::env::var(Self::CONNECTION_ENV).ok()
    }

    fn features(&self) -> FeatureSupport {
        let gpu_available = matches!(self.probe_gpu_renderer(), Ok(Some(_)));
        FeatureSupport {
            webgl: gpu_available,
            webgl2: gpu_available,
            background_workers: num_cpus::get() > 1,
            intersection_observer: true,
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn battery_level(&self) -> Option<f32> {
        Self::read_battery_level()
    }
}

/// 确定性宿主，用于测试
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    pub cores: Option<usize>,
    pub memory_gb: Option<f32>,
    pub gpu: Option<String>,
    /// 为真时模拟渲染上下文创建失败
    pub gpu_probe_fails: bool,
    pub screen: ScreenGeometry,
    pub connection: Option<String>,
    pub features: FeatureSupport,
    pub reduced_motion: bool,
    pub battery: Option<f32>,
}

impl FakeHost {
    /// 所有信号缺失的宿主
    pub fn bare() -> Self {
        Self {
            screen: ScreenGeometry::new(0, 0, 1.0),
            ..Self::default()
        }
    }

    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = Some(cores);
        self
    }

    pub fn with_memory_gb(mut self, memory_gb: f32) -> Self {
        self.memory_gb = Some(memory_gb);
        self
    }

    pub fn with_gpu(mut self, gpu: &str) -> Self {
        self.gpu = Some(gpu.to_string());
        self
    }

    pub fn with_screen(mut self, width: u32, height: u32, pixel_ratio: f32) -> Self {
        self.screen = ScreenGeometry::new(width, height, pixel_ratio);
        self
    }

    pub fn with_connection(mut self, connection: &str) -> Self {
        self.connection = Some(connection.to_string());
        self
    }

    pub fn with_features(mut self, features: FeatureSupport) -> Self {
        self.features = features;
        self
    }

    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    pub fn with_battery(mut self, level: f32) -> Self {
        self.battery = Some(level);
        self
    }

    pub fn failing_gpu_probe(mut self) -> Self {
        self.gpu_probe_fails = true;
        self
    }
}

impl HostEnvironment for FakeHost {
    fn logical_cores(&self) -> Option<usize> {
        self.cores
    }

    fn device_memory_gb(&self) -> Option<f32> {
        self.memory_gb
    }

    fn probe_gpu_renderer(&self) -> HardwareResult<Option<String>> {
        if self.gpu_probe_fails {
            return Err(HardwareError::GpuProbeFailed {
                reason: "上下文创建被阻止".to_string(),
                attempted_methods: vec!["fake".to_string()],
            });
        }
        Ok(self.gpu.clone())
    }

    fn screen(&self) -> ScreenGeometry {
        self.screen
    }

    fn connection_class(&self) -> Option<String> {
        self.connection.clone()
    }

    fn features(&self) -> FeatureSupport {
        self.features
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn battery_level(&self) -> Option<f32> {
        self.battery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_budget() {
        let screen = ScreenGeometry::new(1920, 1080, 2.0);
        assert_eq!(screen.pixel_budget(), 1920.0 * 1080.0 * 2.0);
    }

    #[test]
    fn test_fake_host_probe_failure() {
        let host = FakeHost::default().with_gpu("RTX 3080").failing_gpu_probe();
        assert!(host.probe_gpu_renderer().is_err());
    }

    #[test]
    fn test_system_host_never_panics() {
        let host = SystemHost::default();
        assert!(host.logical_cores().unwrap_or(1) >= 1);
        let _ = host.device_memory_gb();
        let _ = host.probe_gpu_renderer();
        let _ = host.battery_level();
    }
}
