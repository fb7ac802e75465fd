use thiserror::Error;

/// Coarse grouping of [`TsdbError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    Remote,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::Remote => "remote",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }
}

#[derive(Debug, Error)]
pub enum TsdbError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    /// The server answered with `{"status":"error"}`; holds its `message` as-is.
    #[error("{0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl TsdbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TsdbError::Transport(_) | TsdbError::Timeout(_) | TsdbError::Status { .. } => {
                ErrorKind::Transport
            }
            TsdbError::Decode(_) => ErrorKind::Decode,
            TsdbError::Remote(_) => ErrorKind::Remote,
            TsdbError::Config(_) => ErrorKind::Config,
            TsdbError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// Timeouts, connection failures and 5xx responses qualify. Client errors,
    /// undecodable bodies and server-reported errors do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            TsdbError::Transport(_) | TsdbError::Timeout(_) => true,
            TsdbError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for TsdbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            // The request could not even be formed, e.g. an unusable host.
            TsdbError::Config(err.to_string())
        } else if err.is_timeout() {
            TsdbError::Timeout(err.to_string())
        } else if err.is_decode() {
            TsdbError::Decode(err.to_string())
        } else {
            TsdbError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TsdbError {
    fn from(err: serde_json::Error) -> Self {
        TsdbError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for TsdbError {
    fn from(err: std::io::Error) -> Self {
        TsdbError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TsdbError>;
