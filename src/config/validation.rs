//! Configuration validation.
//!
//! Semantic checks only; serde already handled the syntax. Every problem is
//! reported, not just the first.

use std::fmt;

use crate::config::schema::ShellConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check(errors: &mut Vec<ValidationError>, ok: bool, field: &'static str, message: &str) {
    if !ok {
        errors.push(ValidationError {
            field,
            message: message.to_string(),
        });
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ShellConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check(
        &mut errors,
        config.provider.rpc_url.parse::<url::Url>().is_ok(),
        "provider.rpc_url",
        "must be a valid URL",
    );
    for url in &config.provider.failover_urls {
        check(
            &mut errors,
            url.parse::<url::Url>().is_ok(),
            "provider.failover_urls",
            &format!("'{url}' is not a valid URL"),
        );
    }
    check(
        &mut errors,
        config.provider.event_poll_interval_ms > 0,
        "provider.event_poll_interval_ms",
        "must be greater than 0",
    );
    check(
        &mut errors,
        config.transactions.receipt_poll_interval_ms > 0,
        "transactions.receipt_poll_interval_ms",
        "must be greater than 0",
    );
    check(
        &mut errors,
        config.transactions.receipt_max_attempts != Some(0),
        "transactions.receipt_max_attempts",
        "must be at least 1 when set",
    );
    check(
        &mut errors,
        config.transactions.display_decimals <= 18,
        "transactions.display_decimals",
        "must be at most 18",
    );
    check(
        &mut errors,
        !config.storage.session_key.trim().is_empty(),
        "storage.session_key",
        "must not be empty",
    );
    check(
        &mut errors,
        matches!(
            config.observability.log_level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ),
        "observability.log_level",
        "must be one of trace, debug, info, warn, error",
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ShellConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ShellConfig::default();
        config.provider.rpc_url = "nope".into();
        config.transactions.receipt_max_attempts = Some(0);
        config.storage.session_key = "  ".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "provider.rpc_url",
                "transactions.receipt_max_attempts",
                "storage.session_key"
            ]
        );
    }
}
