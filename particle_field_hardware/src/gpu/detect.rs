/// GPU识别模块
///
/// 通过渲染器标识字符串的子串匹配，把GPU粗分为四档

use serde::{Deserialize, Serialize};

/// GPU档位
///
/// 顺序即优先级，`Discrete`最高。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GpuClass {
    /// 无法识别或探测失败
    Unknown,
    /// 普通集显
    IntegratedGeneric,
    /// 高端集显
    IntegratedHigh,
    /// 中端独显
    MidTier,
    /// 游戏级独显
    Discrete,
}

impl GpuClass {
    /// 该档位贡献的能力分
    pub fn points(self) -> u32 {
        match self {
            GpuClass::Discrete => 4,
            GpuClass::MidTier => 3,
            GpuClass::IntegratedHigh => 2,
            GpuClass::IntegratedGeneric => 1,
            GpuClass::Unknown => 0,
        }
    }
}

/// 渲染器标识匹配表
///
/// 阈值为经验值，可调，不是正确性要求。
#[derive(Debug, Clone, Copy)]
pub struct GpuTokenTable {
    pub discrete: &'static [&'static str],
    pub mid_tier: &'static [&'static str],
    pub integrated_high: &'static [&'static str],
    pub integrated_generic: &'static [&'static str],
}

impl GpuTokenTable {
    /// 默认匹配表
    pub const DEFAULT: GpuTokenTable = GpuTokenTable {
        discrete: &["rtx", "gtx", "radeon rx", "radeon pro", "quadro"],
        mid_tier: &["geforce", "radeon", "arc", "apple m"],
        integrated_high: &["iris", "adreno", "apple gpu", "vega"],
        integrated_generic: &["intel", "uhd", "mali", "powervr", "llvmpipe", "swiftshader"],
    };

    /// 按优先级匹配档位
    pub fn classify(&self, renderer: &str) -> GpuClass {
        let name = renderer.to_lowercase();
        let tiers = [
            (self.discrete, GpuClass::Discrete),
            (self.mid_tier, GpuClass::MidTier),
            (self.integrated_high, GpuClass::IntegratedHigh),
            (self.integrated_generic, GpuClass::IntegratedGeneric),
        ];

        tiers
            .iter()
            .find(|(tokens, _)| tokens.iter().any(|token| name.contains(token)))
            .map(|(_, class)| *class)
            .unwrap_or(GpuClass::Unknown)
    }
}

impl Default for GpuTokenTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 识别渲染器字符串
///
/// 探测失败（`None`）时贡献0分，不报错。
pub fn classify_renderer(renderer: Option<&str>) -> GpuClass {
    renderer
        .map(|name| GpuTokenTable::DEFAULT.classify(name))
        .unwrap_or(GpuClass::Unknown)
}
