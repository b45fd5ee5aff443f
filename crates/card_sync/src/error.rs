use shared::{
    domain::UnknownDirective,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid message payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    UnknownDirective(#[from] UnknownDirective),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no handler registered for custom message {0:?}")]
    NoHandler(String),
    #[error("handler for custom message {name:?} failed: {source}")]
    Handler {
        name: String,
        #[source]
        source: HandlerError,
    },
    #[error("invalid server event: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoHandler(_) => ErrorCode::NotFound,
            Self::Handler { .. } | Self::Decode(_) => ErrorCode::Validation,
        }
    }
}

impl From<&SyncError> for ApiError {
    fn from(err: &SyncError) -> Self {
        ApiError::new(err.code(), err.to_string())
    }
}
