//! HMAC-SHA256 verification of capability tokens.
//!
//! Check order:
//! 1. expiry parses and `now <= expiry` (no skew grace)
//! 2. supplied signature is well-formed hex of exactly 32 bytes
//! 3. recomputed MAC equals the supplied one, compared in constant time
//!
//! Every failure is a plain `false` at the `verify` surface.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::bundle::CapabilityToken;

type HmacSha256 = Hmac<Sha256>;

/// Byte length of a decoded HMAC-SHA256 signature.
pub const SIGNATURE_LEN: usize = 32;

/// HMAC key shared with the token issuer. Never printed.
#[derive(Clone)]
pub struct SharedSecret(Arc<[u8]>);

impl SharedSecret {
    /// Returns `None` for an empty secret; an empty key is not a valid
    /// configuration for required verification.
    pub fn new(secret: impl AsRef<[u8]>) -> Option<Self> {
        let bytes = secret.as_ref();
        if bytes.is_empty() {
            return None;
        }
        Some(Self(Arc::from(bytes)))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Source of the current time in whole unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix_secs(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_unix_secs(&self) -> u64 {
        self.0
    }
}

/// Why a token was rejected. Diagnostics only; never sent to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingField,
    MalformedExpiry,
    Expired,
    MalformedSignature,
    BadSignature,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::MissingField => "missing_field",
            Rejection::MalformedExpiry => "malformed_expiry",
            Rejection::Expired => "expired",
            Rejection::MalformedSignature => "malformed_signature",
            Rejection::BadSignature => "bad_signature",
        }
    }
}

/// `token:subject_id:expiry`, byte-for-byte what the issuer signs.
pub fn canonical_payload(token: &str, subject_id: &str, expiry: &str) -> String {
    format!("{token}:{subject_id}:{expiry}")
}

fn mac_bytes(secret: &SharedSecret, payload: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Lowercase hex signature over the canonical payload.
///
/// This is the issuer's computation; the gateway only uses it to compare.
pub fn signature_hex(
    secret: &SharedSecret,
    token: &str,
    subject_id: &str,
    expiry: &str,
) -> Option<String> {
    let payload = canonical_payload(token, subject_id, expiry);
    mac_bytes(secret, payload.as_bytes()).map(hex::encode)
}

/// Stateless verifier bound to one secret and one clock.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: SharedSecret,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: SharedSecret) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: SharedSecret, clock: Arc<dyn Clock>) -> Self {
        Self { secret, clock }
    }

    /// Full check with the failing step reported.
    pub fn check(&self, t: &CapabilityToken) -> std::result::Result<(), Rejection> {
        if t.token.is_empty()
            || t.subject_id.is_empty()
            || t.expiry.is_empty()
            || t.signature.is_empty()
        {
            return Err(Rejection::MissingField);
        }

        let expiry = t.expiry_secs().ok_or(Rejection::MalformedExpiry)?;
        if self.clock.now_unix_secs() > expiry {
            return Err(Rejection::Expired);
        }

        let supplied = hex::decode(&t.signature).map_err(|_| Rejection::MalformedSignature)?;
        if supplied.len() != SIGNATURE_LEN {
            return Err(Rejection::MalformedSignature);
        }

        let payload = canonical_payload(&t.token, &t.subject_id, &t.expiry);
        let expected =
            mac_bytes(&self.secret, payload.as_bytes()).ok_or(Rejection::BadSignature)?;

        if expected.as_slice().ct_eq(supplied.as_slice()).unwrap_u8() == 1 {
            Ok(())
        } else {
            Err(Rejection::BadSignature)
        }
    }

    /// Boolean verdict. The rejection cause goes to diagnostics only.
    pub fn verify(&self, t: &CapabilityToken) -> bool {
        match self.check(t) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(
                    reason = reason.as_str(),
                    subject = %t.subject_id,
                    "capability token rejected"
                );
                false
            }
        }
    }
}

/// One-shot verification against the system clock.
pub fn verify(
    token: &str,
    subject_id: &str,
    expiry: &str,
    signature: &str,
    secret: &SharedSecret,
) -> bool {
    TokenVerifier::new(secret.clone())
        .verify(&CapabilityToken::new(token, subject_id, expiry, signature))
}
