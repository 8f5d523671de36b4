//! Error taxonomy of the gateway client
//!
//! Polling treats `Transport`, `Protocol` and `Decode` alike: retry at the
//! failure cadence, render nothing. One-shot flows surface the error once.

use crate::validation::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to reach device: {0}")]
    Transport(String),

    #[error("device answered with status {status}: {body}")]
    Protocol { status: u16, body: String },

    #[error("failed to decode device response: {0}")]
    Decode(String),

    #[error("upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("failed to start upload: no file selected")]
    NoFileSelected,

    #[error("failed to start upload: another upload is in progress")]
    UploadInProgress,
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Decode(e.to_string());
        }

        // reqwest keeps the interesting part (refused, reset, dns) in the source chain
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport(message)
    }
}
