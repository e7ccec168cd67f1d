use crate::domain::model::ValidationFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Repository validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("UI driver error: {message}")]
    DriverError { message: String },

    #[error("Timed out after {elapsed_ms}ms waiting for {what}")]
    Timeout { what: String, elapsed_ms: u128 },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Command '{command}' failed: {message}")]
    ProcessError { command: String, message: String },

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Scenario,
    Repository,
    Driver,
    Network,
    System,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HarnessError {
    pub fn driver(message: impl Into<String>) -> Self {
        HarnessError::DriverError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            HarnessError::AssertionFailed(_) | HarnessError::PreconditionFailed(_) => {
                ErrorCategory::Scenario
            }
            HarnessError::Validation(_) => ErrorCategory::Repository,
            HarnessError::DriverError { .. } | HarnessError::Timeout { .. } => {
                ErrorCategory::Driver
            }
            HarnessError::HttpError(_) => ErrorCategory::Network,
            HarnessError::IoError(_)
            | HarnessError::ProcessError { .. }
            | HarnessError::PatternError(_)
            | HarnessError::SerializationError(_) => ErrorCategory::System,
            HarnessError::ConfigError { .. } | HarnessError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Driver => ErrorSeverity::Medium,
            ErrorCategory::Scenario | ErrorCategory::Repository => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HarnessError::AssertionFailed(_) => {
                "Compare the expected values with what the storefront currently renders"
            }
            HarnessError::PreconditionFailed(_) => {
                "Check that the control exists and that earlier steps added the expected lines"
            }
            HarnessError::Validation(failure) => failure.recovery_suggestion(),
            HarnessError::DriverError { .. } => "Check that the browser session is still alive",
            HarnessError::Timeout { .. } => "Increase waits.timeout_ms or check storefront latency",
            HarnessError::HttpError(_) => "Check network connectivity and the target URL",
            HarnessError::IoError(_) => "Check filesystem permissions and free space",
            HarnessError::ProcessError { .. } => "Check that the external command is installed",
            HarnessError::PatternError(_) => "Check the extraction pattern syntax",
            HarnessError::SerializationError(_) => "Check the report output format",
            HarnessError::ConfigError { .. } | HarnessError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            HarnessError::Validation(failure) => {
                format!("Repository check failed at {}: {}", failure.stage(), failure)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failures_are_repository_errors() {
        let err: HarnessError = ValidationFailure::ReferenceMissing {
            reason: "no link".to_string(),
        }
        .into();

        assert_eq!(err.category(), ErrorCategory::Repository);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("extract reference"));
    }

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = HarnessError::InvalidConfigValueError {
            field: "storefront.base_url".to_string(),
            value: "invalid-url".to_string(),
            reason: "URL must have a scheme".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
