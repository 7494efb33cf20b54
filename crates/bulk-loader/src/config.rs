//! Loader configuration

use std::time::Duration;

use serde::Deserialize;

/// Bulk loader configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Maximum number of items fetched and mapped at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-item fetch timeout in milliseconds, unset means wait indefinitely
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

fn default_concurrency() -> usize {
    8
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout_ms: None,
        }
    }
}

impl LoaderConfig {
    /// Set the worker limit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the per-item fetch timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Worker limit clamped to at least one
    pub(crate) fn worker_limit(&self) -> usize {
        self.concurrency.max(1)
    }
}
