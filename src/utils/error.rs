use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    /// Built only through `without_url()`, query strings carry API keys.
    #[error("Upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{upstream} returned HTTP {status}{}", format_detail(.detail))]
    UpstreamStatus {
        upstream: &'static str,
        status: u16,
        detail: Option<String>,
    },

    #[error("{upstream} returned a malformed payload: {message}")]
    MalformedPayload {
        upstream: &'static str,
        message: String,
    },

    #[error("No property data found")]
    NoData,

    #[error("{name} is not configured")]
    MissingCredential { name: &'static str },

    #[error("Invalid request body: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，對應上游失敗的三種型態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 網路錯誤或非 2xx 回應
    Transport,
    /// JSON 結構不符預期
    Payload,
    /// 上游正常回應但沒有資料
    NoData,
    /// 本地設定或請求問題
    Local,
}

impl BrokerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BrokerError::Transport(_) | BrokerError::UpstreamStatus { .. } => {
                ErrorCategory::Transport
            }
            BrokerError::MalformedPayload { .. } | BrokerError::SerializationError(_) => {
                ErrorCategory::Payload
            }
            BrokerError::NoData => ErrorCategory::NoData,
            _ => ErrorCategory::Local,
        }
    }

    /// HTTP status used when the error is surfaced to a caller.
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::NoData => 404,
            _ => 500,
        }
    }
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {}", detail),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;
