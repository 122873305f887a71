use crate::utils::error::{LogoError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(LogoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" | "socks5" | "socks5h" => Ok(()),
            scheme => Err(LogoError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(LogoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LogoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LogoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LogoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LogoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("endpoints.clearbit", "https://logo.clearbit.com").is_ok());
        assert!(validate_url("endpoints.clearbit", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("advanced.proxy_url", "socks5://localhost:1080").is_ok());
        assert!(validate_url("endpoints.clearbit", "").is_err());
        assert!(validate_url("endpoints.clearbit", "invalid-url").is_err());
        assert!(validate_url("endpoints.clearbit", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("general.max_results", 10, 1, 100).is_ok());
        assert!(validate_range("general.max_results", 0, 1, 100).is_err());
        assert!(validate_range("general.max_results", 101, 1, 100).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("company", "Acme").is_ok());
        assert!(validate_non_empty_string("company", "   ").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("general.output_directory", "/tmp/logos").is_ok());
        assert!(validate_path("general.output_directory", "").is_err());
        assert!(validate_path("general.output_directory", "bad\0path").is_err());
    }
}
