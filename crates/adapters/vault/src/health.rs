//! Health check functionality for Vault

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::VaultClient;

/// Health check result
#[derive(Debug, Clone, Serialize)]
pub struct VaultHealthStatus {
    /// Whether Vault is accessible
    pub accessible: bool,

    /// Response time in milliseconds
    pub response_time_ms: Option<u64>,

    /// Error message if health check failed
    pub error: Option<String>,
}

impl VaultHealthStatus {
    /// Create a healthy status
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            accessible: true,
            response_time_ms: Some(response_time_ms),
            error: None,
        }
    }

    /// Create an unhealthy status with error
    pub fn unhealthy(error: String) -> Self {
        Self {
            accessible: false,
            response_time_ms: None,
            error: Some(error),
        }
    }

    /// Check if Vault is healthy
    pub fn is_healthy(&self) -> bool {
        self.accessible && self.error.is_none()
    }
}

/// Perform health check on Vault client
pub async fn check_vault_health(client: &VaultClient) -> VaultHealthStatus {
    debug!("Performing Vault health check");

    let start = std::time::Instant::now();

    match client.health_check().await {
        Ok(()) => {
            let response_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            debug!("Vault health check passed in {}ms", response_time_ms);
            VaultHealthStatus::healthy(response_time_ms)
        }
        Err(e) => {
            warn!("Vault health check failed: {}", e);
            VaultHealthStatus::unhealthy(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_status() {
        let status = VaultHealthStatus::healthy(12);
        assert!(status.is_healthy());
        assert_eq!(status.response_time_ms, Some(12));
        assert!(status.error.is_none());
    }

    #[test]
    fn test_unhealthy_status() {
        let status = VaultHealthStatus::unhealthy("Connection failed".to_string());
        assert!(!status.is_healthy());
        assert!(!status.accessible);
        assert_eq!(status.error.as_deref(), Some("Connection failed"));
    }

    #[test]
    fn test_status_serializes() {
        let json = serde_json::to_string(&VaultHealthStatus::healthy(5)).unwrap();
        assert!(json.contains("\"accessible\":true"));
    }
}
