use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("OPENDART returned status {status}: {message}")]
    DartApiError { status: String, message: String },

    #[error("HTTP {status} from {endpoint}")]
    HttpStatusError { endpoint: String, status: u16 },

    #[error("Corporation code list could not be parsed: {message}")]
    CorpCodeParseError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Data,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 重試錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

/// OPENDART 狀態碼中代表金鑰、IP 或額度問題的代碼，遇到時整個執行必須停止
const FATAL_DART_STATUSES: [&str; 5] = ["010", "011", "012", "020", "901"];

impl EtlError {
    pub fn dart(status: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::DartApiError {
            status: status.into(),
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        EtlError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::DartApiError { .. } => ErrorCategory::Api,
            EtlError::ZipError(_)
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::CorpCodeParseError { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::DartApiError { .. } if self.is_fatal() => ErrorSeverity::Critical,
            EtlError::DartApiError { .. } => ErrorSeverity::Medium,
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            _ => ErrorSeverity::High,
        }
    }

    /// 暫時性錯誤：網路失敗、伺服器 5xx、OPENDART 系統維護中 (800)
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EtlError::HttpStatusError { status, .. } => *status >= 500 || *status == 429,
            EtlError::DartApiError { status, .. } => status == "800",
            _ => false,
        }
    }

    /// 是否必須中止整個執行 (而不只是略過單一公司)
    pub fn is_fatal(&self) -> bool {
        match self {
            EtlError::DartApiError { status, .. } => {
                FATAL_DART_STATUSES.contains(&status.as_str())
            }
            EtlError::IoError(_) => true,
            e => e.category() == ErrorCategory::Configuration,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::DartApiError { status, .. } => match status.as_str() {
                "010" | "011" | "901" => {
                    "Check OPENDART_API_KEY; the key is unregistered, disabled or expired"
                }
                "012" => "Register this machine's IP address for the API key on opendart.fss.or.kr",
                "020" => "The daily request quota is exhausted; retry tomorrow or narrow --corp-codes",
                "100" | "101" => "Check the business year and report code parameters",
                "800" => "OPENDART is under maintenance; retry later",
                _ => "Retry later; if the problem persists check the OPENDART notice board",
            },
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => {
                "Check network connectivity and the API base URL, then retry"
            }
            EtlError::CorpCodeParseError { .. } | EtlError::ZipError(_) => {
                "The corporation code download was not a valid archive; verify the API key"
            }
            EtlError::IoError(_) => "Check that the output path exists and is writable",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Fix the configuration value shown above and run again"
            }
            _ => "Run again with --verbose for details",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::DartApiError { status, message } => {
                format!("OPENDART rejected the request ({}): {}", status, message)
            }
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => {
                format!("Could not reach OPENDART: {}", self)
            }
            EtlError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dart_status_classification() {
        assert!(EtlError::dart("020", "limit").is_fatal());
        assert!(EtlError::dart("010", "unregistered key").is_fatal());
        assert!(!EtlError::dart("100", "bad field").is_fatal());
        assert!(EtlError::dart("800", "maintenance").is_retryable());
        assert_eq!(EtlError::dart("011", "x").severity(), ErrorSeverity::Critical);
        assert_eq!(EtlError::dart("100", "x").category(), ErrorCategory::Api);
    }

    #[test]
    fn test_http_status_retry() {
        let server_error = EtlError::HttpStatusError {
            endpoint: "company.json".to_string(),
            status: 503,
        };
        let not_found = EtlError::HttpStatusError {
            endpoint: "company.json".to_string(),
            status: 404,
        };
        assert!(server_error.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(!not_found.is_fatal());
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let err = EtlError::MissingConfigError {
            field: "api_key".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("api_key"));
    }
}
