//! keyloader-config - 配置加载库
//!
//! 加载顺序：`default.toml` → `{APP_ENV}.toml` → `KEYLOADER_` 前缀环境变量
//! （嵌套字段用 `__` 分隔，例如 `KEYLOADER_VAULT__SECRET_ID`）

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use keyloader_adapter_vault::VaultConfig;
use keyloader_bulk::{LoaderConfig, TagFilter};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 选择哪些条目需要加载
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    /// 标签过滤，空表示全部
    #[serde(default)]
    pub tags: TagFilter,
    /// 是否加载 KV 密文
    #[serde(default = "default_true")]
    pub secrets: bool,
    /// 是否加载 transit 签名密钥
    #[serde(default)]
    pub keys: bool,
    /// 存在失败条目时以非零状态退出
    #[serde(default)]
    pub fail_on_error: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            tags: TagFilter::default(),
            secrets: true,
            keys: false,
            fail_on_error: false,
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 安装 Prometheus recorder
    #[serde(default)]
    pub metrics: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub vault: VaultConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("KEYLOADER_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vault.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("vault.endpoint must not be empty".to_string()));
        }
        if self.loader.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "loader.concurrency must be at least 1".to_string(),
            ));
        }
        if self.vault.page_size == 0 {
            return Err(ConfigError::Invalid("vault.page_size must be at least 1".to_string()));
        }
        if !self.selection.secrets && !self.selection.keys {
            return Err(ConfigError::Invalid(
                "selection must enable secrets, keys or both".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
