//! Rendering backend contract.
//!
//! The pipeline depends only on this capability set:
//! launch an isolated session, navigate and wait for network idle, switch to
//! print media, evaluate a DOM mutation, capture a paginated document, close.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use pdfgate_core::error::RenderFailureReason;

/// Page size in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width_in: f64,
    pub height_in: f64,
}

impl PageFormat {
    /// ISO 216 A4, 210 x 297 mm.
    pub const A4: PageFormat = PageFormat {
        width_in: 8.27,
        height_in: 11.69,
    };
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub page: PageFormat,
    pub margins: Margins,
    pub print_background: bool,
    /// When false the page's own `@page` size is ignored.
    pub prefer_css_page_size: bool,
}

impl PdfOptions {
    /// A4, zero margins, backgrounds on, CSS page size overridden.
    pub fn a4_full_bleed() -> Self {
        Self {
            page: PageFormat::A4,
            margins: Margins::default(),
            print_background: true,
            prefer_css_page_size: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("page script failed: {0}")]
    Script(String),
    #[error("page script timed out after {0:?}")]
    ScriptTimeout(Duration),
    #[error("capture timed out after {0:?}")]
    CaptureTimeout(Duration),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("session close failed: {0}")]
    Close(String),
}

impl RenderError {
    /// Classification that may be shown to callers.
    pub fn reason(&self) -> RenderFailureReason {
        match self {
            RenderError::Launch(_) => RenderFailureReason::LaunchFailed,
            RenderError::NavigationTimeout(_) => RenderFailureReason::NavigationTimeout,
            RenderError::Navigation(_) => RenderFailureReason::NavigationFailed,
            RenderError::Script(_) | RenderError::ScriptTimeout(_) => {
                RenderFailureReason::ScriptFailed
            }
            RenderError::CaptureTimeout(_) | RenderError::Capture(_) | RenderError::Close(_) => {
                RenderFailureReason::CaptureFailed
            }
        }
    }
}

/// Factory for isolated sessions. One call, one fresh browser context.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One exclusively-owned browsing context.
///
/// `close` consumes the session, so a session is released at most once;
/// the pipeline guarantees it is released at least once.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate and return once no request has been in flight for `idle`.
    async fn navigate(&mut self, url: &Url, idle: Duration) -> Result<(), RenderError>;

    /// Abort an in-flight navigation. Best effort.
    async fn stop_loading(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    async fn emulate_print_media(&mut self) -> Result<(), RenderError>;

    /// Evaluate a script in the page and return its JSON result.
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, RenderError>;

    async fn capture_pdf(&mut self, opts: &PdfOptions) -> Result<Vec<u8>, RenderError>;

    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}
