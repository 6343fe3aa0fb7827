//! Compile the `auth` config section into a runtime verification policy.

use std::sync::Arc;

use pdfgate_core::error::{PdfGateError, Result};
use pdfgate_core::token::{Clock, SharedSecret, SystemClock, TokenVerifier, VerificationPolicy};

use crate::config::{AuthMode, AuthSection};

/// Resolve the shared secret and build the policy.
///
/// `env` is the environment lookup (injected so startup is testable). A
/// literal `auth.secret` wins over `auth.secret_env`. Required mode without a
/// resolvable, non-empty secret is a startup error.
pub fn compile<F>(auth: &AuthSection, env: F) -> Result<VerificationPolicy>
where
    F: Fn(&str) -> Option<String>,
{
    compile_with_clock(auth, env, Arc::new(SystemClock))
}

pub fn compile_with_clock<F>(
    auth: &AuthSection,
    env: F,
    clock: Arc<dyn Clock>,
) -> Result<VerificationPolicy>
where
    F: Fn(&str) -> Option<String>,
{
    match auth.mode {
        AuthMode::Open => {
            tracing::warn!("token verification disabled (auth.mode = open)");
            Ok(VerificationPolicy::Open)
        }
        AuthMode::Required => {
            let raw = match &auth.secret {
                Some(s) => s.clone(),
                None => env(&auth.secret_env).unwrap_or_default(),
            };
            let secret = SharedSecret::new(raw).ok_or_else(|| {
                PdfGateError::Config(format!(
                    "auth.mode is required but neither auth.secret nor ${} is set",
                    auth.secret_env
                ))
            })?;
            Ok(VerificationPolicy::Required(TokenVerifier::with_clock(secret, clock)))
        }
    }
}
