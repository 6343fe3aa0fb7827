//! Decode-once codec for JSON request bodies.
//!
//! Bodies are read as raw bytes so malformed JSON maps onto the gateway's own
//! error surface instead of the framework's default rejection text.

use serde::Deserialize;

use pdfgate_core::error::{PdfGateError, Result};
use pdfgate_core::token::TokenBundle;

use crate::context::request::{parse_target, RenderRequest};

#[derive(Debug, Deserialize)]
struct RenderBody {
    #[serde(default)]
    url: Option<String>,
    #[serde(flatten)]
    token: TokenBundle,
}

fn invalid_json(e: serde_json::Error) -> PdfGateError {
    PdfGateError::InvalidInput(format!("invalid json body: {e}"))
}

/// `POST /generate-pdf` body.
///
/// A missing or blank `url` is `MissingInput`; token fields are passed on
/// untouched for the verification policy to judge.
pub fn decode_render(body: &[u8]) -> Result<RenderRequest> {
    let raw: RenderBody = serde_json::from_slice(body).map_err(invalid_json)?;
    let url = raw
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| PdfGateError::MissingInput("url".into()))?;
    Ok(RenderRequest {
        url: parse_target(&url)?,
        token: raw.token,
    })
}

/// `POST /verify-token` body.
pub fn decode_token_check(body: &[u8]) -> Result<TokenBundle> {
    serde_json::from_slice(body).map_err(invalid_json)
}
