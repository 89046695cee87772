/// Domain-specific error types for the condor risk engine.
/// The pricing core only ever raises InvalidInput / Domain. Collaborators
/// convert everything else into a tagged fallback before the core runs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("domain error: {0}")]
    Domain(String),

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),
}

impl EngineError {
    /// Errors caused by the caller's parameters rather than the service.
    #[inline]
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::InvalidInput(_) | EngineError::Domain(_))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
