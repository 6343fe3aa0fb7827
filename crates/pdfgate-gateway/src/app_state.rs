//! Shared application state for the render gateway.
//!
//! Everything here is built once at startup and read-only afterwards; the
//! only mutable pieces are atomic counters.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pdfgate_core::error::Result;
use pdfgate_core::token::VerificationPolicy;

use crate::config::GatewayConfig;
use crate::obs::GatewayMetrics;
use crate::policy;
use crate::render::{ChromiumBackend, RenderBackend, RenderPipeline, RenderSettings};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    verification: VerificationPolicy,
    pipeline: RenderPipeline,
    metrics: Arc<GatewayMetrics>,
    next_request_id: AtomicU64,
}

impl AppState {
    /// Assemble state from already-compiled parts.
    pub fn new(
        cfg: GatewayConfig,
        verification: VerificationPolicy,
        backend: Arc<dyn RenderBackend>,
    ) -> Self {
        let metrics = Arc::new(GatewayMetrics::default());
        let pipeline = RenderPipeline::new(
            backend,
            RenderSettings::from(&cfg.render),
            Arc::clone(&metrics),
        );
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                verification,
                pipeline,
                metrics,
                next_request_id: AtomicU64::new(1),
            }),
        }
    }

    /// Production wiring: resolve the secret and use the Chromium backend.
    /// Returns Result so main can fail startup without panicking.
    pub fn from_config<F>(cfg: GatewayConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let verification = policy::compile_auth(&cfg.auth, env)?;
        let backend = ChromiumBackend::new(cfg.render.chrome_executable.as_ref().map(PathBuf::from));
        Ok(Self::new(cfg, verification, Arc::new(backend)))
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn verification(&self) -> &VerificationPolicy {
        &self.inner.verification
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.inner.pipeline
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn next_request_id(&self) -> u64 {
        self.inner.next_request_id.fetch_add(1, Ordering::Relaxed)
    }
}
