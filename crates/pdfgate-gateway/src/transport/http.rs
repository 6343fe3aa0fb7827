//! HTTP handlers.
//!
//! - `POST /generate-pdf`: verify (unless open mode), render, stream back the PDF
//! - `POST /verify-token`: token verdict only, no render

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::Instrument;

use pdfgate_core::error::{PdfGateError, Result};
use pdfgate_core::token::{Authorization, TokenBundle};

use crate::app_state::AppState;
use crate::transport::codec;
use crate::transport::response::{pdf_response, ApiError};

pub async fn generate_pdf(State(app): State<AppState>, body: Bytes) -> Response {
    let span = tracing::info_span!("generate_pdf", request_id = app.next_request_id());
    match handle_generate(&app, &body).instrument(span).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn handle_generate(app: &AppState, body: &[u8]) -> std::result::Result<Response, ApiError> {
    let req = codec::decode_render(body).map_err(|e| {
        tracing::debug!(error = %e, "render request rejected");
        e
    })?;

    // No backend work happens before this returns Ok.
    authorize(app, &req.token)?;

    let artifact = app.pipeline().render(&req.url).await.map_err(|e| {
        // Detail already logged inside the render span.
        PdfGateError::RenderFailure(e.reason())
    })?;

    pdf_response(artifact)
}

fn authorize(app: &AppState, token: &TokenBundle) -> Result<Authorization> {
    let result = app.verification().authorize(token);
    let label = match &result {
        Ok(Authorization::NotRequired) => "skipped",
        Ok(Authorization::Verified { .. }) => "accepted",
        Err(PdfGateError::Unauthorized) => "unauthorized",
        Err(PdfGateError::MissingInput(_)) => "missing_input",
        Err(_) => "invalid_token",
    };
    app.metrics().token_checks.inc(&[("result", label)]);

    match &result {
        Ok(Authorization::Verified { subject_id }) => {
            tracing::info!(subject = %subject_id, "capability token accepted");
        }
        Ok(Authorization::NotRequired) => {}
        Err(e) => tracing::info!(result = label, error = %e, "render refused"),
    }
    result
}

pub async fn verify_token(State(app): State<AppState>, body: Bytes) -> Response {
    let verdict = codec::decode_token_check(&body)
        .and_then(|bundle| app.verification().check_only(&bundle));

    match verdict {
        Ok(valid) => {
            app.metrics()
                .token_checks
                .inc(&[("result", if valid { "accepted" } else { "invalid_token" })]);
            Json(json!({ "valid": valid })).into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "token check rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "valid": false, "error": e.client_code().as_str() })),
            )
                .into_response()
        }
    }
}
