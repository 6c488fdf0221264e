use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("authentication rejected by the order API: {reason}")]
    AuthFailure { reason: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("malformed API response for {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    #[error("pagination never terminated: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("export failed for {path}: {reason}")]
    ExportError { path: String, reason: String },

    #[error("missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("invalid value \"{value}\" for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Network,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScrapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::AuthFailure { .. } => ErrorCategory::Authentication,
            Self::ApiError(_) | Self::UnexpectedStatus { .. } | Self::PaginationLimit { .. } => {
                ErrorCategory::Network
            }
            Self::MalformedResponse { .. }
            | Self::SerializationError(_)
            | Self::CsvError(_)
            | Self::ProcessingError { .. } => ErrorCategory::Data,
            Self::IoError(_) | Self::ExportError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MalformedResponse { .. } => ErrorSeverity::Low,
            Self::ApiError(_) | Self::UnexpectedStatus { .. } => ErrorSeverity::Medium,
            Self::CsvError(_)
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::ExportError { .. }
            | Self::PaginationLimit { .. }
            | Self::ProcessingError { .. } => ErrorSeverity::High,
            Self::AuthFailure { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AuthFailure { .. } => {
                "Log into the site in a browser and copy a fresh sessionid cookie"
            }
            Self::ApiError(_) | Self::UnexpectedStatus { .. } => {
                "Check your network connection and re-run; cached pages will be skipped"
            }
            Self::MalformedResponse { .. } => {
                "The API may have changed shape; re-run with --verbose and inspect the payload"
            }
            Self::PaginationLimit { .. } => {
                "The listing endpoint never returned an empty batch; raise the page cap only if the account really has that many orders"
            }
            Self::IoError(_) | Self::ExportError { .. } => {
                "Check disk space and permissions on the cache and output directories"
            }
            Self::CsvError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                "Re-run with --verbose and report the offending order id"
            }
            Self::MissingConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the flagged option and run again (see --help)"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::AuthFailure { .. } => "The order API rejected your session cookie".to_string(),
            Self::ApiError(_) | Self::UnexpectedStatus { .. } => {
                "Could not reach the order API".to_string()
            }
            Self::ExportError { path, .. } => format!("Could not write the export file {}", path),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_is_critical() {
        let err = ScrapeError::AuthFailure {
            reason: "HTTP 401".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn malformed_response_is_recoverable() {
        let err = ScrapeError::MalformedResponse {
            context: "summary page at offset 40".to_string(),
            reason: "missing data".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Data);
    }
}
