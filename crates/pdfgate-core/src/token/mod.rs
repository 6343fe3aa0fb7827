//! Capability tokens.
//!
//! A capability token is a short-lived bearer credential minted by a trusted
//! issuer. It authorizes exactly one render and is verified locally with a
//! shared HMAC-SHA256 key:
//!
//! ```text
//! signature = hex(HMAC-SHA256(secret, token ":" subject_id ":" expiry))
//! ```
//!
//! Verification never panics: malformed bundles, expiries and signatures all
//! collapse to the same rejected outcome for network callers. The precise
//! cause is only emitted to `tracing` diagnostics.

pub mod bundle;
pub mod policy;
pub mod verify;

pub use bundle::{BundleState, CapabilityToken, TokenBundle};
pub use policy::{Authorization, VerificationPolicy};
pub use verify::{
    canonical_payload, signature_hex, verify, Clock, FixedClock, Rejection, SharedSecret,
    SystemClock, TokenVerifier,
};
