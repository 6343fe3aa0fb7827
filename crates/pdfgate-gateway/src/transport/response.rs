//! HTTP response mapping.
//!
//! Callers only ever see a stable code, a fixed message and, for render
//! failures, a machine-readable reason. Error detail stays in the logs.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use pdfgate_core::error::{ClientCode, PdfGateError};

use crate::render::RenderArtifact;

#[derive(Debug)]
pub struct ApiError(pub PdfGateError);

impl From<PdfGateError> for ApiError {
    fn from(e: PdfGateError) -> Self {
        Self(e)
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::MissingInput | ClientCode::InvalidInput => StatusCode::BAD_REQUEST,
        ClientCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ClientCode::InvalidToken => StatusCode::FORBIDDEN,
        ClientCode::RenderFailed | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let mut body = json!({
            "error": code.as_str(),
            "message": self.0.public_message(),
        });
        if let PdfGateError::RenderFailure(reason) = &self.0 {
            body["reason"] = json!(reason.as_str());
        }
        (status_for(code), Json(body)).into_response()
    }
}

/// `200 application/pdf` with an attachment disposition.
pub fn pdf_response(artifact: RenderArtifact) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.filename
    ))
    .map_err(|e| PdfGateError::Internal(format!("content-disposition: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.media_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
