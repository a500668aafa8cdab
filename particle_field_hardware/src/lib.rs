//! 设备能力检测与自适应配置
//!
//! 一次性读取宿主硬件信号，评分为能力档位，并据此生成自适应配置。

pub mod async_detect;
pub mod capability;
pub mod config;
pub mod error;
pub mod gpu;
pub mod host;

// Re-export public API
pub use async_detect::{DetectionState, DetectionTask};
pub use capability::{CapabilityScorer, CapabilitySignals, CapabilityTier, ScoringThresholds};
pub use config::{
    AdaptiveConfig, AdaptiveConfigFactory, AnimationComplexity, AnimationSettings, ConfigAdjustment,
    Easing, EffectToggles, ParticleBudget, RenderTarget, RuntimeConditions,
};
pub use error::{HardwareError, HardwareResult};
pub use gpu::{classify_renderer, GpuClass};
pub use host::{FakeHost, FeatureSupport, HostEnvironment, ScreenGeometry, SystemHost};

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 设备信息快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub tier: CapabilityTier,
    pub score: u32,
    pub cores: usize,
    pub memory_gb: f32,
    pub gpu: String,
    pub gpu_class: GpuClass,
    pub connection: String,
    pub screen: ScreenGeometry,
    pub features: FeatureSupport,
}

impl DeviceInfo {
    /// 由信号计算设备信息
    pub fn from_signals(signals: &CapabilitySignals, scorer: &CapabilityScorer) -> Self {
        let score = scorer.score(signals);
        Self {
            tier: scorer.tier_for_score(score),
            score,
            cores: signals.cores,
            memory_gb: signals.memory_gb,
            gpu: signals.gpu.clone().unwrap_or_else(|| "unknown".to_string()),
            gpu_class: scorer.gpu_class(signals),
            connection: signals.connection.clone(),
            screen: signals.screen,
            features: signals.features,
        }
    }

    /// 打印设备信息
    pub fn print(&self) {
        println!("=== 设备信息 ===");
        println!("能力档位: {} (积分 {})", self.tier, self.score);
        println!("CPU核心数: {}", self.cores);
        println!("内存: {:.1} GB", self.memory_gb);
        println!("GPU: {} ({:?})", self.gpu, self.gpu_class);
        println!("网络: {}", self.connection);
        println!(
            "屏幕: {}x{} @{:.1}",
            self.screen.width, self.screen.height, self.screen.pixel_ratio
        );
        println!("特性: {:?}", self.features);
        println!();
    }
}

/// 设备检测服务
///
/// 由组合根显式构造并持有；结果缓存在实例内，`reset` 后下次访问重新检测。
pub struct DeviceDetector {
    host: Box<dyn HostEnvironment>,
    scorer: CapabilityScorer,
    cache: OnceLock<DeviceInfo>,
}

impl DeviceDetector {
    pub fn new(host: Box<dyn HostEnvironment>) -> Self {
        Self::with_scorer(host, CapabilityScorer::default())
    }

    pub fn with_scorer(host: Box<dyn HostEnvironment>, scorer: CapabilityScorer) -> Self {
        Self {
            host,
            scorer,
            cache: OnceLock::new(),
        }
    }

    /// 检测设备信息（缓存）
    pub fn detect(&self) -> &DeviceInfo {
        self.cache.get_or_init(|| {
            let signals = CapabilitySignals::read(self.host.as_ref());
            let info = DeviceInfo::from_signals(&signals, &self.scorer);
            tracing::info!(
                target: "hardware",
                tier = %info.tier,
                score = info.score,
                cores = info.cores,
                gpu = %info.gpu,
                "设备检测完成"
            );
            info
        })
    }

    /// 是否已有缓存
    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    /// 清除缓存
    pub fn reset(&mut self) {
        self.cache.take();
    }

    /// 当前能力档位
    pub fn tier(&self) -> CapabilityTier {
        self.detect().tier
    }

    /// 当前运行时条件（每次实时读取）
    pub fn runtime_conditions(&self) -> RuntimeConditions {
        RuntimeConditions {
            reduced_motion: self.host.prefers_reduced_motion(),
            battery_level: self.host.battery_level(),
        }
    }

    /// 宿主环境
    pub fn host(&self) -> &dyn HostEnvironment {
        self.host.as_ref()
    }
}
