/// 设备能力评分
///
/// 加权积分后映射为三档：`Low < Medium < High`。
/// 纯函数，无副作用：相同的信号向量总是得到相同的档位。

use crate::error::degrade;
use crate::gpu::{GpuClass, GpuTokenTable};
use crate::host::{FeatureSupport, HostEnvironment, ScreenGeometry};
use serde::{Deserialize, Serialize};

/// 能力档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityTier {
    Low,
    Medium,
    High,
}

impl CapabilityTier {
    /// 设备粒子数乘数
    pub fn particle_multiplier(self) -> f32 {
        match self {
            CapabilityTier::High => 1.0,
            CapabilityTier::Medium => 0.6,
            CapabilityTier::Low => 0.3,
        }
    }

    /// 低一档，已是最低档时返回 `None`
    pub fn lower(self) -> Option<CapabilityTier> {
        match self {
            CapabilityTier::High => Some(CapabilityTier::Medium),
            CapabilityTier::Medium => Some(CapabilityTier::Low),
            CapabilityTier::Low => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityTier::High => "high",
            CapabilityTier::Medium => "medium",
            CapabilityTier::Low => "low",
        }
    }
}

impl std::fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CapabilityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(CapabilityTier::High),
            "medium" => Ok(CapabilityTier::Medium),
            "low" => Ok(CapabilityTier::Low),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// 评分输入信号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySignals {
    pub cores: usize,
    pub memory_gb: f32,
    /// 渲染器标识，探测失败为 `None`
    pub gpu: Option<String>,
    pub screen: ScreenGeometry,
    pub connection: String,
    pub features: FeatureSupport,
}

impl CapabilitySignals {
    /// 缺失时的保守默认值
    pub const DEFAULT_CORES: usize = 2;
    pub const DEFAULT_MEMORY_GB: f32 = 4.0;

    /// 从宿主读取一次全部信号，缺失值回退为默认值
    pub fn read(host: &dyn HostEnvironment) -> Self {
        // 探测失败按 0 分处理
        let gpu = degrade(host.probe_gpu_renderer(), "gpu", None);

        Self {
            cores: host.logical_cores().unwrap_or(Self::DEFAULT_CORES),
            memory_gb: host.device_memory_gb().unwrap_or(Self::DEFAULT_MEMORY_GB),
            gpu,
            screen: host.screen(),
            connection: host.connection_class().unwrap_or_else(|| "unknown".to_string()),
            features: host.features(),
        }
    }
}

/// 评分阈值
///
/// 经验常数，可调。
#[derive(Debug, Clone, Copy)]
pub struct ScoringThresholds {
    /// (最少核心数, 分值)，从高到低
    pub cores: [(usize, u32); 4],
    /// (最少内存GB, 分值)，从高到低
    pub memory_gb: [(f32, u32); 4],
    /// 超过即 +2，约 4K
    pub uhd_pixels: f64,
    /// 超过即 +1，约 1080p
    pub fhd_pixels: f64,
    pub high_tier_score: u32,
    pub medium_tier_score: u32,
    pub gpu_tokens: GpuTokenTable,
}

impl ScoringThresholds {
    pub const DEFAULT: ScoringThresholds = ScoringThresholds {
        cores: [(8, 4), (6, 3), (4, 2), (2, 1)],
        memory_gb: [(16.0, 4), (8.0, 3), (4.0, 2), (2.0, 1)],
        uhd_pixels: 8_300_000.0,
        fhd_pixels: 2_100_000.0,
        high_tier_score: 12,
        medium_tier_score: 7,
        gpu_tokens: GpuTokenTable::DEFAULT,
    };
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 能力评分器
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityScorer {
    thresholds: ScoringThresholds,
}

impl CapabilityScorer {
    pub fn new(thresholds: ScoringThresholds) -> Self {
        Self { thresholds }
    }

    /// 累计积分
    pub fn score(&self, signals: &CapabilitySignals) -> u32 {
        let t = &self.thresholds;
        let mut score = 0;

        score += t
            .cores
            .iter()
            .find(|(min, _)| signals.cores >= *min)
            .map(|(_, points)| *points)
            .unwrap_or(0);

        score += t
            .memory_gb
            .iter()
            .find(|(min, _)| signals.memory_gb >= *min)
            .map(|(_, points)| *points)
            .unwrap_or(0);

        score += self.gpu_class(signals).points();

        let pixels = signals.screen.pixel_budget();
        if pixels > t.uhd_pixels {
            score += 2;
        } else if pixels > t.fhd_pixels {
            score += 1;
        }

        let connection = signals.connection.to_lowercase();
        if connection.contains("4g") || connection.contains("wifi") {
            score += 1;
        }

        if signals.features.webgl2 {
            score += 2;
        } else if signals.features.webgl {
            score += 1;
        }

        if signals.features.background_workers {
            score += 1;
        }
        if signals.features.intersection_observer {
            score += 1;
        }

        score
    }

    /// GPU档位
    pub fn gpu_class(&self, signals: &CapabilitySignals) -> GpuClass {
        signals
            .gpu
            .as_deref()
            .map(|name| self.thresholds.gpu_tokens.classify(name))
            .unwrap_or(GpuClass::Unknown)
    }

    /// 积分映射为档位
    pub fn tier_for_score(&self, score: u32) -> CapabilityTier {
        if score >= self.thresholds.high_tier_score {
            CapabilityTier::High
        } else if score >= self.thresholds.medium_tier_score {
            CapabilityTier::Medium
        } else {
            CapabilityTier::Low
        }
    }

    /// 信号直接映射为档位
    pub fn classify(&self, signals: &CapabilitySignals) -> CapabilityTier {
        self.tier_for_score(self.score(signals))
    }
}
