/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和验证
use crate::benchmark::BenchmarkSettings;
use crate::impl_default;
use crate::particles::{SimulationOptions, Theme};
use particle_field_profiling::MonitorSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 渲染表面
    #[serde(default)]
    pub surface: SurfaceConfig,

    /// 模拟选项
    #[serde(default)]
    pub simulation: SimulationOptions,

    /// 性能监控
    #[serde(default)]
    pub monitor: MonitorSettings,

    /// 默认基准矩阵
    #[serde(default)]
    pub benchmark: BenchmarkSettings,

    /// 自适应反馈
    #[serde(default)]
    pub adaptation: AdaptationConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 配置文件查找顺序
    pub const SEARCH_PATHS: [&'static str; 2] = ["particle_field.toml", "particle_field.json"];

    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 按扩展名加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 从任意键值来源覆盖配置，无法解析的值被忽略
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            lookup(key).and_then(|value| value.trim().parse().ok())
        }
        let lookup: &dyn Fn(&str) -> Option<String> = &lookup;

        // 表面
        if let Some(width) = parsed(lookup, "PARTICLE_FIELD_WIDTH") {
            self.surface.width = width;
        }
        if let Some(height) = parsed(lookup, "PARTICLE_FIELD_HEIGHT") {
            self.surface.height = height;
        }

        // 模拟
        if let Some(theme) = parsed::<Theme>(lookup, "PARTICLE_FIELD_THEME") {
            self.simulation.theme = theme;
        }
        if let Some(interactive) = parsed(lookup, "PARTICLE_FIELD_INTERACTIVE") {
            self.simulation.interactive = interactive;
        }
        if let Some(offload) = parsed(lookup, "PARTICLE_FIELD_OFFLOAD") {
            self.simulation.offload = offload;
        }
        if let Some(seed) = parsed(lookup, "PARTICLE_FIELD_SEED") {
            self.simulation.seed = Some(seed);
        }

        // 监控
        if let Some(fps) = parsed(lookup, "PARTICLE_FIELD_TARGET_FPS") {
            self.monitor.target_fps = fps;
        }

        // 日志
        if let Some(level) = parsed(lookup, "PARTICLE_FIELD_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.surface.validate()?;
        validate_simulation(&self.simulation)?;
        validate_monitor(&self.monitor)?;
        self.benchmark.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./particle_field.toml
    /// 2. ./particle_field.json
    /// 3. 使用默认配置
    pub fn load_or_default() -> Self {
        for path in Self::SEARCH_PATHS {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!(target: "field", path, "已加载配置文件");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(target: "field", path, error = %e, "配置文件无效，已跳过");
                }
            }
        }

        tracing::info!(target: "field", "使用默认配置");
        Self::default()
    }
}

/// 渲染表面配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl_default!(SurfaceConfig {
    width: 800,
    height: 600,
    pixel_ratio: 1.0,
});

impl SurfaceConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid surface size {}x{}",
                self.width, self.height
            )));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(ConfigError::ValidationError("Invalid pixel ratio".to_string()));
        }
        Ok(())
    }
}

fn validate_simulation(options: &SimulationOptions) -> ConfigResult<()> {
    if options.worker_timeout_ms == 0 {
        return Err(ConfigError::ValidationError("Worker timeout must be positive".to_string()));
    }
    Ok(())
}

fn validate_monitor(settings: &MonitorSettings) -> ConfigResult<()> {
    if settings.target_fps == 0 || settings.target_fps > 1000 {
        return Err(ConfigError::ValidationError("Invalid target FPS".to_string()));
    }
    if settings.sample_window == 0 {
        return Err(ConfigError::ValidationError("Sample window must be positive".to_string()));
    }
    if settings.critical_fps > settings.throttle_fps {
        return Err(ConfigError::ValidationError(
            "Critical FPS must not exceed throttle FPS".to_string(),
        ));
    }
    Ok(())
}

/// 自适应反馈配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationConfig {
    /// 是否采纳监控建议
    pub enabled: bool,
    /// 两次调整之间至少间隔的帧数
    pub cooldown_frames: u32,
}

impl_default!(AdaptationConfig {
    enabled: true,
    cooldown_frames: 120,
});

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出 target
    pub with_target: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    with_target: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// `EnvFilter` 指令
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ParseError(format!("unknown log level: {other}"))),
        }
    }
}
