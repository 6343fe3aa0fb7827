use serde::Deserialize;
use url::Url;

use pdfgate_core::error::{PdfGateError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub render: RenderSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PdfGateError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.auth.validate()?;
        self.render.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Single origin allowed to call the gateway from a browser.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            allowed_origin: default_allowed_origin(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.allowed_origin == "*" {
            return Err(PdfGateError::Config(
                "gateway.allowed_origin must name a single origin".into(),
            ));
        }
        let origin = Url::parse(&self.allowed_origin).map_err(|e| {
            PdfGateError::Config(format!("gateway.allowed_origin is not a url: {e}"))
        })?;
        if !matches!(origin.scheme(), "http" | "https") || origin.host_str().is_none() {
            return Err(PdfGateError::Config(
                "gateway.allowed_origin must be an http(s) origin".into(),
            ));
        }
        if origin.path() != "/" || origin.query().is_some() {
            return Err(PdfGateError::Config(
                "gateway.allowed_origin must not carry a path or query".into(),
            ));
        }
        if !(1024..=1_048_576).contains(&self.max_body_bytes) {
            return Err(PdfGateError::Config(
                "gateway.max_body_bytes must be between 1024 and 1048576".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_allowed_origin() -> String {
    "http://localhost:5000".into()
}
fn default_max_body_bytes() -> usize {
    16 * 1024
}

/// Whether render requests must carry a capability token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Required,
    Open,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default)]
    pub mode: AuthMode,

    /// Literal secret. Prefer `secret_env` outside of local setups.
    #[serde(default)]
    pub secret: Option<String>,

    /// Environment variable consulted when `secret` is absent.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            secret: None,
            secret_env: default_secret_env(),
        }
    }
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if self.mode == AuthMode::Open && self.secret.is_some() {
            return Err(PdfGateError::Config(
                "auth.secret must not be set when auth.mode is open".into(),
            ));
        }
        if self.secret.as_deref() == Some("") {
            return Err(PdfGateError::Config("auth.secret must not be empty".into()));
        }
        if self.secret_env.is_empty() {
            return Err(PdfGateError::Config("auth.secret_env must not be empty".into()));
        }
        Ok(())
    }
}

fn default_secret_env() -> String {
    "PDF_TOKEN_SECRET".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSection {
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Quiet window with no in-flight requests that counts as network idle.
    #[serde(default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    /// Bound on each page script step (print media switch, control strip).
    #[serde(default = "default_script_timeout_ms")]
    pub script_timeout_ms: u64,

    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,

    /// CSS selector of the operator controls removed before capture.
    #[serde(default = "default_strip_selector")]
    pub strip_selector: String,

    #[serde(default = "default_filename")]
    pub filename: String,

    /// Chrome/Chromium binary; autodetected when absent.
    #[serde(default)]
    pub chrome_executable: Option<String>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            network_idle_ms: default_network_idle_ms(),
            script_timeout_ms: default_script_timeout_ms(),
            capture_timeout_ms: default_capture_timeout_ms(),
            strip_selector: default_strip_selector(),
            filename: default_filename(),
            chrome_executable: None,
        }
    }
}

impl RenderSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=120_000).contains(&self.navigation_timeout_ms) {
            return Err(PdfGateError::Config(
                "render.navigation_timeout_ms must be between 1000 and 120000".into(),
            ));
        }
        if !(100..=5000).contains(&self.network_idle_ms) {
            return Err(PdfGateError::Config(
                "render.network_idle_ms must be between 100 and 5000".into(),
            ));
        }
        if self.network_idle_ms >= self.navigation_timeout_ms {
            return Err(PdfGateError::Config(
                "render.network_idle_ms must be less than navigation_timeout_ms".into(),
            ));
        }
        if !(1000..=120_000).contains(&self.script_timeout_ms) {
            return Err(PdfGateError::Config(
                "render.script_timeout_ms must be between 1000 and 120000".into(),
            ));
        }
        if !(1000..=120_000).contains(&self.capture_timeout_ms) {
            return Err(PdfGateError::Config(
                "render.capture_timeout_ms must be between 1000 and 120000".into(),
            ));
        }
        if self.strip_selector.trim().is_empty() {
            return Err(PdfGateError::Config(
                "render.strip_selector must not be empty".into(),
            ));
        }
        let name = self.filename.as_str();
        if name.len() <= ".pdf".len()
            || !name.ends_with(".pdf")
            || name.contains(&['"', '/', '\\', '\r', '\n'][..])
        {
            return Err(PdfGateError::Config(
                "render.filename must be a plain name ending in .pdf".into(),
            ));
        }
        Ok(())
    }
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}
fn default_network_idle_ms() -> u64 {
    500
}
fn default_script_timeout_ms() -> u64 {
    10_000
}
fn default_capture_timeout_ms() -> u64 {
    30_000
}
fn default_strip_selector() -> String {
    ".button-container".into()
}
fn default_filename() -> String {
    "MYCAREERCHOICES.pdf".into()
}
