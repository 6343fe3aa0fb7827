//! Axum router wiring.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use pdfgate_core::error::Result;

use crate::{app_state::AppState, ops, policy, transport};

pub fn build_router(state: AppState) -> Result<Router> {
    let gw = &state.cfg().gateway;
    let cors = policy::cors_layer(&gw.allowed_origin)?;
    let body_limit = DefaultBodyLimit::max(gw.max_body_bytes);

    let api = Router::new()
        .route("/generate-pdf", post(transport::http::generate_pdf))
        .route("/verify-token", post(transport::http::verify_token))
        .layer(body_limit)
        .layer(cors);

    Ok(Router::new()
        .merge(api)
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .with_state(state))
}
