//! Shared error type across pdfgate crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Required field(s) absent.
    MissingInput,
    /// Field present but unusable (bad URL, malformed body).
    InvalidInput,
    /// No token bundle while verification is required.
    Unauthorized,
    /// Token bundle supplied but rejected.
    InvalidToken,
    /// Render pipeline failed.
    RenderFailed,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::MissingInput => "MISSING_INPUT",
            ClientCode::InvalidInput => "INVALID_INPUT",
            ClientCode::Unauthorized => "UNAUTHORIZED",
            ClientCode::InvalidToken => "INVALID_TOKEN",
            ClientCode::RenderFailed => "RENDER_FAILED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Machine-classifiable cause of a render failure.
///
/// This is the only render detail that crosses the network boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFailureReason {
    LaunchFailed,
    NavigationTimeout,
    NavigationFailed,
    ScriptFailed,
    CaptureFailed,
}

impl RenderFailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderFailureReason::LaunchFailed => "launch_failed",
            RenderFailureReason::NavigationTimeout => "navigation_timeout",
            RenderFailureReason::NavigationFailed => "navigation_failed",
            RenderFailureReason::ScriptFailed => "script_failed",
            RenderFailureReason::CaptureFailed => "capture_failed",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PdfGateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PdfGateError {
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("missing authentication token")]
    Unauthorized,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("render failed: {}", .0.as_str())]
    RenderFailure(RenderFailureReason),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PdfGateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            PdfGateError::MissingInput(_) => ClientCode::MissingInput,
            PdfGateError::InvalidInput(_) => ClientCode::InvalidInput,
            PdfGateError::Unauthorized => ClientCode::Unauthorized,
            PdfGateError::InvalidToken => ClientCode::InvalidToken,
            PdfGateError::RenderFailure(_) => ClientCode::RenderFailed,
            PdfGateError::Config(_) | PdfGateError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Short message safe to return to a network caller.
    ///
    /// Never includes backend detail; `Display` may.
    pub fn public_message(&self) -> &'static str {
        match self {
            PdfGateError::MissingInput(_) => "missing required input",
            PdfGateError::InvalidInput(_) => "invalid input",
            PdfGateError::Unauthorized => "missing authentication token",
            PdfGateError::InvalidToken => "invalid or expired token",
            PdfGateError::RenderFailure(_) => "failed to generate pdf",
            PdfGateError::Config(_) | PdfGateError::Internal(_) => "internal error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_failure_code_and_reason() {
        let e = PdfGateError::RenderFailure(RenderFailureReason::NavigationTimeout);
        assert_eq!(e.client_code().as_str(), "RENDER_FAILED");
        assert_eq!(e.to_string(), "render failed: navigation_timeout");
    }

    #[test]
    fn config_errors_are_internal_to_callers() {
        let e = PdfGateError::Config("auth.secret must be set".into());
        assert_eq!(e.client_code(), ClientCode::Internal);
        assert!(!e.public_message().contains("secret"));
    }
}
