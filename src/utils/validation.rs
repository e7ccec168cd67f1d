use crate::utils::error::{HarnessError, Result};
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> HarnessError {
    HarnessError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(()),
            "http" | "https" => Err(invalid(field_name, url_str, "URL has no host")),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

/// A path that must stay inside the directory it is joined onto.
pub fn validate_relative_path(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    let candidate = std::path::Path::new(path);
    if candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(invalid(
            field_name,
            path,
            "Path must be relative and must not leave its parent directory",
        ));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Poll interval must be non-zero and no longer than the timeout it polls within.
pub fn validate_wait(field_name: &str, timeout: Duration, poll_interval: Duration) -> Result<()> {
    if poll_interval.is_zero() || poll_interval > timeout {
        return Err(invalid(
            field_name,
            format!("{}ms/{}ms", timeout.as_millis(), poll_interval.as_millis()),
            "poll interval must be non-zero and not exceed the timeout",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("storefront.base_url", "https://example.com").is_ok());
        assert!(validate_url("storefront.base_url", "http://localhost:3000/").is_ok());
        assert!(validate_url("storefront.base_url", "").is_err());
        assert!(validate_url("storefront.base_url", "invalid-url").is_err());
        assert!(validate_url("storefront.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path("repository.expected_file", "README.md").is_ok());
        assert!(validate_relative_path("repository.expected_file", "docs/index.md").is_ok());
        assert!(validate_relative_path("repository.expected_file", "../README.md").is_err());
        assert!(validate_relative_path("repository.expected_file", "/etc/passwd").is_err());
        assert!(validate_relative_path("repository.expected_file", "").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("repository.clone_timeout_seconds", 5, 1).is_ok());
        assert!(validate_positive_number("repository.clone_timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_wait() {
        let timeout = Duration::from_secs(5);
        assert!(validate_wait("waits", timeout, Duration::from_millis(100)).is_ok());
        assert!(validate_wait("waits", timeout, Duration::ZERO).is_err());
        assert!(validate_wait("waits", timeout, Duration::from_secs(6)).is_err());
    }
}
