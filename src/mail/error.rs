use thiserror::Error;

/// Broad failure classes shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Service,
    NotFound,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("server rejected the request ({status}): {message}")]
    Service { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl MailError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MailError::Network(_) | MailError::Timeout => ErrorKind::Network,
            MailError::NotFound(_) => ErrorKind::NotFound,
            MailError::Service { .. } | MailError::Decode(_) => ErrorKind::Service,
        }
    }
}

impl From<reqwest::Error> for MailError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MailError::Timeout
        } else if e.is_decode() {
            MailError::Decode(e.to_string())
        } else {
            MailError::Network(e)
        }
    }
}
