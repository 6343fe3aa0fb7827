//! Per-request render lifecycle.
//!
//! Each call launches its own session, drives it through
//! navigate -> print media -> strip controls -> capture, each step under its
//! own timeout, and releases it on every exit path. Release happens in two layers:
//! - the normal path awaits `SessionGuard::release` after the body finishes,
//!   whatever its outcome
//! - if the render future is dropped mid-flight (caller went away), the
//!   guard's `Drop` hands the session to the runtime to be closed

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::time::{error::Elapsed, timeout};
use tracing::Instrument;
use url::Url;

use crate::config::RenderSection;
use crate::obs::GatewayMetrics;

use super::backend::{PdfOptions, RenderBackend, RenderError, RenderSession};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Captured document handed back to the caller. Not retained.
#[derive(Debug, Clone)]
pub struct RenderArtifact {
    pub bytes: Bytes,
    pub media_type: &'static str,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub navigation_timeout: Duration,
    pub network_idle: Duration,
    pub script_timeout: Duration,
    pub capture_timeout: Duration,
    pub strip_selector: String,
    pub filename: String,
    pub pdf: PdfOptions,
}

impl From<&RenderSection> for RenderSettings {
    fn from(r: &RenderSection) -> Self {
        Self {
            navigation_timeout: Duration::from_millis(r.navigation_timeout_ms),
            network_idle: Duration::from_millis(r.network_idle_ms),
            script_timeout: Duration::from_millis(r.script_timeout_ms),
            capture_timeout: Duration::from_millis(r.capture_timeout_ms),
            strip_selector: r.strip_selector.clone(),
            filename: r.filename.clone(),
            pdf: PdfOptions::a4_full_bleed(),
        }
    }
}

/// Script that removes the first element matching `selector`, if any.
///
/// The selector is embedded as a JSON string literal so it cannot escape
/// the `querySelector` call.
pub fn strip_script(selector: &str) -> String {
    let literal = serde_json::Value::String(selector.to_string()).to_string();
    format!(
        "(() => {{ const el = document.querySelector({literal}); \
         if (el) {{ el.remove(); return true; }} return false; }})()"
    )
}

pub struct RenderPipeline {
    backend: Arc<dyn RenderBackend>,
    settings: RenderSettings,
    metrics: Arc<GatewayMetrics>,
}

impl RenderPipeline {
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        settings: RenderSettings,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            backend,
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub async fn render(&self, url: &Url) -> Result<RenderArtifact, RenderError> {
        let span = tracing::info_span!(
            "render",
            backend = self.backend.name(),
            host = url.host_str().unwrap_or("-"),
        );
        self.render_inner(url).instrument(span).await
    }

    async fn render_inner(&self, url: &Url) -> Result<RenderArtifact, RenderError> {
        let started = Instant::now();

        let result = match self.backend.launch().await {
            Ok(session) => {
                let mut guard = SessionGuard::new(session, Arc::clone(&self.metrics));
                let captured = match guard.session() {
                    Some(s) => self.drive(s, url).await,
                    None => Err(RenderError::Launch("session unavailable".into())),
                };
                guard.release(captured.is_ok()).await;
                captured
            }
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.reason().as_str(),
        };
        self.metrics.renders.inc(&[("outcome", outcome)]);
        self.metrics
            .render_duration
            .observe(&[("outcome", outcome)], started.elapsed());

        match result {
            Ok(bytes) => {
                tracing::info!(
                    bytes = bytes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "render complete"
                );
                Ok(RenderArtifact {
                    bytes: Bytes::from(bytes),
                    media_type: PDF_MEDIA_TYPE,
                    filename: self.settings.filename.clone(),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, reason = e.reason().as_str(), "render failed");
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        session: &mut dyn RenderSession,
        url: &Url,
    ) -> Result<Vec<u8>, RenderError> {
        let s = &self.settings;

        let navigated =
            timeout(s.navigation_timeout, session.navigate(url, s.network_idle)).await;
        match navigated {
            Ok(res) => res?,
            Err(_) => {
                if let Err(e) = session.stop_loading().await {
                    tracing::debug!(error = %e, "stop_loading after timeout failed");
                }
                return Err(RenderError::NavigationTimeout(s.navigation_timeout));
            }
        }

        let script_timed_out = |_: Elapsed| RenderError::ScriptTimeout(s.script_timeout);
        timeout(s.script_timeout, session.emulate_print_media())
            .await
            .map_err(script_timed_out)??;

        let strip = strip_script(&s.strip_selector);
        let removed = timeout(s.script_timeout, session.evaluate(&strip))
            .await
            .map_err(script_timed_out)??;
        tracing::debug!(
            selector = %s.strip_selector,
            removed = %removed,
            "operator controls stripped"
        );

        match timeout(s.capture_timeout, session.capture_pdf(&s.pdf)).await {
            Ok(res) => res,
            Err(_) => Err(RenderError::CaptureTimeout(s.capture_timeout)),
        }
    }
}

/// Owns a live session until it is released.
struct SessionGuard {
    session: Option<Box<dyn RenderSession>>,
    metrics: Arc<GatewayMetrics>,
}

impl SessionGuard {
    fn new(session: Box<dyn RenderSession>, metrics: Arc<GatewayMetrics>) -> Self {
        metrics.sessions_open.inc();
        Self {
            session: Some(session),
            metrics,
        }
    }

    fn session(&mut self) -> Option<&mut (dyn RenderSession + 'static)> {
        self.session.as_deref_mut()
    }

    async fn release(mut self, success: bool) {
        let Some(session) = self.session.take() else {
            return;
        };
        let path = if success { "ok" } else { "error" };
        close_session(session, &self.metrics, path).await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let metrics = Arc::clone(&self.metrics);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("render cancelled; releasing session in background");
                handle.spawn(async move {
                    close_session(session, &metrics, "cancelled").await;
                });
            }
            Err(_) => {
                // No runtime left to drive the close; dropping the handle is
                // all that remains.
                metrics.sessions_open.dec();
                metrics.sessions_released.inc(&[("path", "dropped")]);
                tracing::error!("render session dropped outside a runtime");
            }
        }
    }
}

async fn close_session(
    session: Box<dyn RenderSession>,
    metrics: &GatewayMetrics,
    path: &'static str,
) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "render session close reported an error");
    }
    metrics.sessions_open.dec();
    metrics.sessions_released.inc(&[("path", path)]);
}
