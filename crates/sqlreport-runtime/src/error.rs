//! Error types for report operations.
//!
//! Callers must keep three failure classes apart: a validation problem is
//! shown to the requester as-is, a denial is reported as a bare "forbidden",
//! and an upstream failure carries a bounded preview of what the executor
//! sent back.

use sqlreport_core::ValidationError;
use thiserror::Error;

/// Longest response excerpt kept in an [`UpstreamError`].
pub const PREVIEW_CHARS: usize = 800;

/// Coarse class of a [`ReportError`], for mapping to a transport response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Validation,
    Authorization,
    Upstream,
}

/// Errors returned by the orchestrator.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Bad template, parameters or definition. Safe to show verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ACL denied the action. Carries no detail on purpose.
    #[error("Forbidden")]
    Forbidden,

    /// The remote SQL executor failed.
    #[error("upstream execution failed: {0}")]
    Upstream(#[from] UpstreamError),
}

impl ReportError {
    pub fn kind(&self) -> FailureClass {
        match self {
            ReportError::Validation(_) => FailureClass::Validation,
            ReportError::Forbidden => FailureClass::Authorization,
            ReportError::Upstream(_) => FailureClass::Upstream,
        }
    }
}

/// Failures talking to the remote SQL executor.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-success HTTP status.
    #[error("HTTP {status} (content-type: {}): {preview}", .content_type.as_deref().unwrap_or("none"))]
    Status {
        status: u16,
        content_type: Option<String>,
        preview: String,
    },

    /// Success status with a blank body.
    #[error("HTTP {status} with an empty body")]
    EmptyBody { status: u16 },

    /// Body is neither declared nor shaped as JSON.
    #[error("expected JSON but got {}: {preview}", .content_type.as_deref().unwrap_or("no content-type"))]
    NotJson {
        content_type: Option<String>,
        preview: String,
    },

    /// Body looked like JSON but did not parse.
    #[error("invalid JSON response: {0}")]
    Decode(String),

    /// Connection, timeout or redirect failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Endpoint URL rejected before any request was made.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No usable bearer credential.
    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// First [`PREVIEW_CHARS`] characters of `text`.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_generic() {
        let err = ReportError::Forbidden;
        assert_eq!(err.to_string(), "Forbidden");
        assert_eq!(err.kind(), FailureClass::Authorization);
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = ReportError::from(ValidationError::missing_required("start"));
        assert_eq!(err.to_string(), "Missing required parameter: 'start'");
        assert_eq!(err.kind(), FailureClass::Validation);
    }

    #[test]
    fn test_upstream_class() {
        let err = ReportError::from(UpstreamError::EmptyBody { status: 200 });
        assert_eq!(err.kind(), FailureClass::Upstream);
        assert!(err.to_string().contains("empty body"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(PREVIEW_CHARS + 10);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_status_display_includes_content_type() {
        let err = UpstreamError::Status {
            status: 502,
            content_type: Some("text/html".into()),
            preview: "<h1>Bad gateway</h1>".into(),
        };
        assert_eq!(err.to_string(), "HTTP 502 (content-type: text/html): <h1>Bad gateway</h1>");
    }
}
