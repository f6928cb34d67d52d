/// Why a file was refused before any request was made.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadRejection {
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("unsupported file type '{0}', expected .csv or .xlsx")]
    UnsupportedType(String),
    #[error("cannot read file: {0}")]
    Unreadable(String),
}

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("backend unreachable: {message}")]
    Network { message: String, timeout: bool },
    #[error("backend returned HTTP {code}: {message}")]
    HttpStatus { code: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadRejection),
}

impl ApiError {
    /// Whether the same call could succeed if attempted again later.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network { .. } => true,
            ApiError::HttpStatus { code, .. } => *code >= 500 || *code == 429,
            ApiError::Decode(_) | ApiError::Upload(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network { timeout: true, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return ApiError::Decode(e.to_string());
        }
        if let Some(status) = e.status() {
            return ApiError::HttpStatus {
                code: status.as_u16(),
                message: e.to_string(),
            };
        }
        ApiError::Network {
            timeout: e.is_timeout(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("cannot build http client: {0}")]
    HttpClient(String),
}
