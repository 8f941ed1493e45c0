/// Shared error type used across all Paralegal SDK crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The host answered with a non-2xx status.
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    /// The response carried no readable body, so it cannot be streamed.
    #[error("response body is missing; streaming is not supported")]
    StreamUnsupported,

    /// The host reported an error event on an open stream.
    #[error("stream: {0}")]
    Stream(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status for [`Error::Api`], `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
