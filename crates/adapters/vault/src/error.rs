//! Error types for Vault adapter

use keyloader_errors::AppError;

/// Convert vaultrs error to AppError
pub fn map_vault_error(err: impl std::fmt::Display, context: &str) -> AppError {
    let err_str = err.to_string();
    let lower = err_str.to_lowercase();

    if lower.contains("404") || lower.contains("not found") {
        AppError::not_found(format!("{}: {}", context, err_str))
    } else if lower.contains("403") || lower.contains("permission denied") {
        AppError::forbidden(format!("{}: {}", context, err_str))
    } else if lower.contains("401") || lower.contains("unauthorized") {
        AppError::unauthenticated(format!("{}: {}", context, err_str))
    } else {
        // connection, timeout, 5xx
        AppError::external_service(format!("{}: {}", context, err_str))
    }
}
