//! 运行时初始化

use keyloader_config::AppConfig;
use keyloader_errors::AppResult;
use keyloader_telemetry::{init_metrics, init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

/// 运行时配置
pub struct RuntimeConfig {
    pub config_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// 从 `KEYLOADER_CONFIG_DIR` 读取配置目录
    pub fn from_env() -> Self {
        match std::env::var("KEYLOADER_CONFIG_DIR") {
            Ok(config_dir) if !config_dir.is_empty() => Self { config_dir },
            _ => Self::default(),
        }
    }
}

/// 初始化日志与 metrics
///
/// 开启 metrics 时返回 Prometheus handle
pub fn init_runtime(config: &AppConfig) -> AppResult<Option<PrometheusHandle>> {
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    let metrics = if config.telemetry.metrics {
        Some(init_metrics()?)
    } else {
        None
    };

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        metrics = metrics.is_some(),
        "Runtime initialized"
    );

    Ok(metrics)
}
