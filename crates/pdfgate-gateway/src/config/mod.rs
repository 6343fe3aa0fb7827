//! Gateway config loader (strict parsing).
//!
//! Read once at startup; the parsed value is immutable and shared through
//! `AppState`.

pub mod schema;

use std::fs;

use pdfgate_core::error::{PdfGateError, Result};

pub use schema::{AuthMode, AuthSection, GatewayConfig, GatewaySection, RenderSection};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PdfGateError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| PdfGateError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
