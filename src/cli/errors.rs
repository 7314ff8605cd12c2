//! CLI-specific error types
//!
//! All CLI errors are fatal: the process exits non-zero without serving.

use std::fmt;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Webhook secret not configured
    MissingSecret,
    /// Bootstrap or server startup failed
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "REVCAST_CLI_CONFIG_ERROR",
            Self::MissingSecret => "REVCAST_CLI_MISSING_SECRET",
            Self::BootFailed => "REVCAST_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// Secret environment variable missing or empty
    pub fn missing_secret(var: &str) -> Self {
        Self::new(
            CliErrorCode::MissingSecret,
            format!("Environment variable {} must be set to a non-empty secret", var),
        )
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::missing_secret("WEBHOOK_KEY");
        let display = err.to_string();
        assert!(display.starts_with("REVCAST_CLI_MISSING_SECRET: "));
        assert!(display.contains("WEBHOOK_KEY"));
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            CliErrorCode::ConfigError.code(),
            CliErrorCode::MissingSecret.code(),
            CliErrorCode::BootFailed.code(),
        ];
        assert!(codes.iter().all(|c| c.starts_with("REVCAST_CLI_")));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
    }
}
