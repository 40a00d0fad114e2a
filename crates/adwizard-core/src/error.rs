//! Error taxonomy shared by every wizard component.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draft::DraftId;

/// A field-scoped validation failure, produced locally per step or returned
/// by the server on publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path (`title`, `price_amount`, `attributes.mileage`, ...).
    pub field: String,
    /// Machine-readable error code (`REQUIRED`, `OUT_OF_RANGE`, ...).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by remote collaborators before normalisation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, kept for logs only.
        body: String,
    },

    /// The server rejected the request with field-indexed errors (HTTP 422).
    #[error("server rejected the request with {} validation error(s)", .0.len())]
    Rejected(Vec<ValidationError>),

    /// The response body did not match the expected shape.
    #[error("response could not be decoded: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Short, display-safe summary. Raw bodies and transport messages stay in
    /// the logs.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Transport(_) => "the server could not be reached".to_owned(),
            Self::Status { status, .. } => format!("the server responded with status {status}"),
            Self::Rejected(errors) => format!("{} field(s) were rejected", errors.len()),
            Self::Decode(_) => "the server sent an unexpected response".to_owned(),
        }
    }
}

/// Errors surfaced by the wizard coordinators. Every remote failure is
/// normalised into one of these before it reaches a UI surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WizardError {
    /// Remote draft allocation failed; retry by re-submitting step 1.
    #[error("draft could not be created: {0}")]
    DraftCreate(String),

    /// A patch failed; local state is preserved and can be retried.
    #[error("draft could not be saved: {0}")]
    DraftSave(String),

    /// Local, pre-network validation failed.
    #[error("{} field(s) failed validation", .0.len())]
    Validation(Vec<ValidationError>),

    /// The server rejected publish with field-indexed errors.
    #[error("publish rejected with {} validation error(s)", .0.len())]
    PublishRejected(Vec<ValidationError>),

    /// A media batch failed; the features/media step is incomplete.
    #[error("media upload failed: {0}")]
    MediaUpload(String),

    /// Anything else that went wrong on the wire.
    #[error("transport error: {0}")]
    Transport(String),

    /// The draft was published and accepts no further mutation.
    #[error("draft {0} has been published and can no longer change")]
    DraftClosed(DraftId),

    /// A forward move was refused by the completion gate.
    #[error("cannot open step {target}: step {required} is not complete")]
    NavigationBlocked {
        /// 1-based step that was requested.
        target: usize,
        /// 1-based step that must be completed first.
        required: usize,
    },

    /// The category schema failed load-time validation.
    #[error("invalid category schema: {0}")]
    Schema(String),
}

impl WizardError {
    /// Telemetry/notice tag for the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DraftCreate(_) => "draft_create_error",
            Self::DraftSave(_) => "draft_save_error",
            Self::Validation(_) => "validation_error",
            Self::PublishRejected(_) => "publish_validation_rejection",
            Self::MediaUpload(_) => "media_upload_error",
            Self::Transport(_) => "transport_error",
            Self::DraftClosed(_) => "draft_closed",
            Self::NavigationBlocked { .. } => "navigation_blocked",
            Self::Schema(_) => "schema_error",
        }
    }

    /// Message suitable for a banner or toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::DraftCreate(_) => "Your listing could not be started. Please try again.".to_owned(),
            Self::DraftSave(_) => {
                "Your changes could not be saved. They are kept here; please retry.".to_owned()
            }
            Self::Validation(errors) => match errors.first() {
                Some(first) => first.message.clone(),
                None => "Please check the highlighted fields.".to_owned(),
            },
            Self::PublishRejected(_) => {
                "Some details need attention before the listing can go live.".to_owned()
            }
            Self::MediaUpload(_) => "Some photos could not be uploaded. Please retry.".to_owned(),
            Self::Transport(_) => "Something went wrong. Please try again.".to_owned(),
            Self::DraftClosed(_) => "This listing has already been published.".to_owned(),
            Self::NavigationBlocked { required, .. } => {
                format!("Please complete step {required} first.")
            }
            Self::Schema(_) => "This category is not available right now.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_summary_hides_raw_transport_text() {
        let err = RemoteError::Transport("tcp connect error: 10.0.0.3:443 refused".into());
        assert!(!err.summary().contains("10.0.0.3"));

        let err = RemoteError::Status {
            status: 503,
            body: "<html>upstream stack trace</html>".into(),
        };
        assert_eq!(err.summary(), "the server responded with status 503");
    }

    #[test]
    fn test_user_message_for_validation_uses_first_error() {
        let err = WizardError::Validation(vec![
            ValidationError::new("title", "REQUIRED", "Title is required"),
            ValidationError::new("price_amount", "REQUIRED", "Price is required"),
        ]);
        assert_eq!(err.user_message(), "Title is required");
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn test_user_message_never_echoes_internal_reason() {
        let err = WizardError::DraftSave("connection reset by peer".into());
        assert!(!err.user_message().contains("connection reset"));
    }
}
