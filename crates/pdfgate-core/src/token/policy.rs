//! Caller-level verification policy.
//!
//! `Open` is an explicit deployment state chosen in config, not the result
//! of a missing secret. Both variants are built once at startup.

use crate::error::{PdfGateError, Result};

use super::bundle::{BundleState, TokenBundle};
use super::verify::TokenVerifier;

#[derive(Debug, Clone)]
pub enum VerificationPolicy {
    /// Every render needs a valid capability token.
    Required(TokenVerifier),
    /// Verification disabled for this deployment.
    Open,
}

/// Outcome of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    NotRequired,
    Verified { subject_id: String },
}

impl VerificationPolicy {
    pub fn is_required(&self) -> bool {
        matches!(self, VerificationPolicy::Required(_))
    }

    /// Gate a render request.
    ///
    /// - no token fields at all -> `Unauthorized`
    /// - some fields missing -> `MissingInput`
    /// - a field of the wrong JSON type, or complete but rejected -> `InvalidToken`
    pub fn authorize(&self, bundle: &TokenBundle) -> Result<Authorization> {
        let verifier = match self {
            VerificationPolicy::Open => return Ok(Authorization::NotRequired),
            VerificationPolicy::Required(v) => v,
        };

        match bundle.state() {
            BundleState::Absent => Err(PdfGateError::Unauthorized),
            BundleState::Partial(missing) => Err(PdfGateError::MissingInput(format!(
                "token fields: {}",
                missing.join(", ")
            ))),
            BundleState::Malformed(fields) => {
                tracing::debug!(fields = ?fields, "token rejected: malformed fields");
                Err(PdfGateError::InvalidToken)
            }
            BundleState::Complete(token) => {
                if verifier.verify(&token) {
                    Ok(Authorization::Verified {
                        subject_id: token.subject_id,
                    })
                } else {
                    Err(PdfGateError::InvalidToken)
                }
            }
        }
    }

    /// Verdict for the standalone token check.
    ///
    /// `Ok(true)` in open mode; `MissingInput` when any field is absent;
    /// `Ok(false)` for malformed fields.
    pub fn check_only(&self, bundle: &TokenBundle) -> Result<bool> {
        let verifier = match self {
            VerificationPolicy::Open => return Ok(true),
            VerificationPolicy::Required(v) => v,
        };

        match bundle.state() {
            BundleState::Complete(token) => Ok(verifier.verify(&token)),
            BundleState::Malformed(_) => Ok(false),
            BundleState::Absent => Err(PdfGateError::MissingInput("token fields".into())),
            BundleState::Partial(missing) => Err(PdfGateError::MissingInput(format!(
                "token fields: {}",
                missing.join(", ")
            ))),
        }
    }
}
