use pdfgate_core::error::{PdfGateError, Result};
use pdfgate_core::token::TokenBundle;
use url::Url;

/// One inbound render call: target plus the (optional) token bundle.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: Url,
    pub token: TokenBundle,
}

/// Parse a caller-supplied locator into an absolute http(s) URL.
///
/// Other schemes (`file:`, `javascript:`, `data:`) would let a caller read
/// the renderer's own filesystem or run arbitrary script, so they are refused.
pub fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PdfGateError::InvalidInput(format!("url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(PdfGateError::InvalidInput(format!(
            "url: unsupported target {}:",
            url.scheme()
        )));
    }
    Ok(url)
}
