use serde::Serialize;
use thiserror::Error;

use crate::models::Phase;

/// Why a submission was turned away before any job started.
///
/// None of these change the phase.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SubmitError {
    #[error("a download is already in progress ({0})")]
    Busy(Phase),
    #[error("no download folder has been selected yet")]
    NotConfigured,
    #[error("not a valid http(s) URL: {0}")]
    InvalidUrl(String),
    #[error("unsupported format: {0}")]
    InvalidFormat(String),
    #[error("unsupported quality: {0}")]
    InvalidQuality(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal phase transition {from} -> {to}")]
pub struct TransitionError {
    pub from: Phase,
    pub to: Phase,
}

/// Failure reported by an external collaborator (yt-dlp, settings store, dialog).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for CollaboratorError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        Self::new(format!("{err:#}"))
    }
}
