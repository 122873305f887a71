use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogoError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("SVG rendering error: {message}")]
    SvgError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Not found: {message}")]
    NotFoundError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Image,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LogoError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFoundError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::HttpStatusError { .. } => ErrorCategory::Network,
            Self::IoError(_)
            | Self::SerializationError(_)
            | Self::CsvError(_)
            | Self::StoreError { .. } => ErrorCategory::Storage,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ImageError(_) | Self::SvgError { .. } | Self::ProcessingError { .. } => {
                ErrorCategory::Image
            }
            Self::NotFoundError { .. } | Self::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFoundError { .. } => ErrorSeverity::Low,
            Self::ApiError(_) | Self::HttpStatusError { .. } => ErrorSeverity::Medium,
            Self::IoError(_) | Self::StoreError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check your network connection or proxy settings, then retry the search"
            }
            ErrorCategory::Storage => {
                "Check that the data directory is writable and has free space"
            }
            ErrorCategory::Configuration => {
                "Review the settings file (logo-downloader config show) and fix the reported field"
            }
            ErrorCategory::Image => {
                "The image may be corrupt or in an unsupported format; try another result"
            }
            ErrorCategory::Input => "Check the company name or file path you entered",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) if e.is_timeout() => {
                "The logo service did not respond in time".to_string()
            }
            Self::ApiError(_) => "Could not reach the logo service".to_string(),
            Self::HttpStatusError { status, .. } => {
                format!("The logo service answered with HTTP {}", status)
            }
            Self::IoError(e) => format!("File system error: {}", e),
            Self::ImageError(_) | Self::SvgError { .. } => {
                "The logo image could not be decoded".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LogoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_low_severity() {
        let err = LogoError::not_found("favorite 'acme'");
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.to_string(), "Not found: favorite 'acme'");
    }

    #[test]
    fn test_io_error_is_critical_storage() {
        let err: LogoError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("denied"));
    }

    #[test]
    fn test_config_error_suggestion_mentions_settings() {
        let err = LogoError::InvalidConfigValueError {
            field: "advanced.timeout".to_string(),
            value: "0".to_string(),
            reason: "Value must be between 1 and 300".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("settings"));
    }
}
