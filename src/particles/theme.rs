//! 主题参数表
//!
//! 四个固定主题，每个主题解析为一组纯数值参数。

use crate::core::FieldError;
use crate::render::Color;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 闭区间取值范围
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 区间内均匀采样，退化区间返回 `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// 主题
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Nebula,
    Ocean,
    Ember,
    Forest,
}

/// 主题参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThemeParams {
    /// 粒子半径范围
    pub size: ValueRange,
    /// 初速度大小范围
    pub speed: ValueRange,
    /// 调色板（十六进制）
    pub palette: [&'static str; 6],
    pub opacity: ValueRange,
    pub interaction_radius: f32,
    pub magnetic_force: f32,
    /// 摩擦系数，严格位于 (0.9, 1.0)
    pub friction: f32,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Nebula, Theme::Ocean, Theme::Ember, Theme::Forest];

    pub fn params(self) -> ThemeParams {
        match self {
            Theme::Nebula => ThemeParams {
                size: ValueRange::new(1.0, 4.0),
                speed: ValueRange::new(0.2, 1.0),
                palette: ["#8B5CF6", "#A78BFA", "#EC4899", "#6366F1", "#C4B5FD", "#F0ABFC"],
                opacity: ValueRange::new(0.3, 0.9),
                interaction_radius: 120.0,
                magnetic_force: 0.3,
                friction: 0.98,
            },
            Theme::Ocean => ThemeParams {
                size: ValueRange::new(1.5, 3.5),
                speed: ValueRange::new(0.1, 0.6),
                palette: ["#0EA5E9", "#38BDF8", "#06B6D4", "#22D3EE", "#0284C7", "#BAE6FD"],
                opacity: ValueRange::new(0.2, 0.7),
                interaction_radius: 100.0,
                magnetic_force: 0.2,
                friction: 0.985,
            },
            Theme::Ember => ThemeParams {
                size: ValueRange::new(1.0, 3.0),
                speed: ValueRange::new(0.5, 1.5),
                palette: ["#F97316", "#FB923C", "#EF4444", "#F59E0B", "#FCD34D", "#DC2626"],
                opacity: ValueRange::new(0.4, 1.0),
                interaction_radius: 80.0,
                magnetic_force: 0.5,
                friction: 0.95,
            },
            Theme::Forest => ThemeParams {
                size: ValueRange::new(2.0, 5.0),
                speed: ValueRange::new(0.1, 0.5),
                palette: ["#22C55E", "#4ADE80", "#16A34A", "#84CC16", "#A3E635", "#15803D"],
                opacity: ValueRange::new(0.3, 0.8),
                interaction_radius: 90.0,
                magnetic_force: 0.25,
                friction: 0.97,
            },
        }
    }

    /// 解析后的调色板
    pub fn colors(self) -> Result<Vec<Color>, FieldError> {
        self.params().palette.iter().map(|hex| Color::from_hex(hex)).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Nebula => "nebula",
            Theme::Ocean => "ocean",
            Theme::Ember => "ember",
            Theme::Forest => "forest",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FieldError::General(format!("unknown theme: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_theme_is_well_formed() {
        for theme in Theme::ALL {
            let params = theme.params();
            assert!(params.friction > 0.9 && params.friction < 1.0, "{theme}");
            assert!(params.size.min > 0.0 && params.size.min <= params.size.max);
            assert!(params.speed.min >= 0.0 && params.speed.min <= params.speed.max);
            assert!(params.opacity.min > 0.0 && params.opacity.max <= 1.0);
            assert!(params.interaction_radius > 0.0);
            assert_eq!(theme.colors().unwrap().len(), 6);
        }
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Ocean".parse::<Theme>().unwrap(), Theme::Ocean);
        assert_eq!(" ember ".parse::<Theme>().unwrap(), Theme::Ember);
        assert!("plasma".parse::<Theme>().is_err());
    }

    #[test]
    fn test_range_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = ValueRange::new(2.0, 3.0);
        for _ in 0..100 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        assert_eq!(ValueRange::new(1.5, 1.5).sample(&mut rng), 1.5);
    }
}
