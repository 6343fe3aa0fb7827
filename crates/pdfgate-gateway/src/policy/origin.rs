//! Cross-origin policy: a single allow-listed caller origin.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use pdfgate_core::error::{PdfGateError, Result};

pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin.trim_end_matches('/')).map_err(|e| {
        PdfGateError::Config(format!("gateway.allowed_origin is not a header value: {e}"))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]))
}
