//! pdfgate gateway binary.
//!
//! - `POST /generate-pdf`: token-gated URL -> PDF render
//! - `POST /verify-token`: token pre-check for the issuer
//! - Config: `pdfgate.yaml` (or the path given as the first argument)

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use pdfgate_core::error::{PdfGateError, Result};
use pdfgate_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "pdfgate.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| PdfGateError::Config(format!("gateway.listen must be a valid SocketAddr: {e}")))?;

    let state = app_state::AppState::from_config(cfg, |k| std::env::var(k).ok())?;
    tracing::info!(
        verification_required = state.verification().is_required(),
        allowed_origin = %state.cfg().gateway.allowed_origin,
        "config loaded"
    );
    let app = router::build_router(state)?;

    tracing::info!(%listen, "pdfgate-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| PdfGateError::Internal(format!("bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PdfGateError::Internal(format!("server failed: {e}")))?;

    tracing::info!("pdfgate-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received; draining in-flight renders");
}
