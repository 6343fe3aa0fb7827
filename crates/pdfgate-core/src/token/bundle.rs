//! Wire form of the token bundle.
//!
//! The issuer posts the four token fields flat alongside the render request.
//! Any of them may be absent or carry the wrong JSON type. Decoding never
//! fails on token fields; `TokenBundle::state` sorts the bundle into
//! absent / partial / malformed / complete before anything is verified.

use serde::Deserialize;
use serde_json::Value;

/// Token fields as they arrive on the wire. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "BundleWire")]
pub struct TokenBundle {
    pub token: Option<String>,
    /// Field name is `student_id` in JSON (issuer compatibility).
    pub subject_id: Option<String>,
    /// Unix seconds, as sent: JSON integers are kept as their decimal text.
    pub expiry: Option<String>,
    /// Lowercase hex HMAC-SHA256.
    pub signature: Option<String>,
    /// Fields that were present with a type no issuer produces
    /// (floats, booleans, arrays, objects).
    pub malformed: Vec<&'static str>,
}

/// A complete, not-yet-verified capability token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityToken {
    pub token: String,
    pub subject_id: String,
    /// Exact decimal text that the issuer signed.
    pub expiry: String,
    pub signature: String,
}

impl CapabilityToken {
    pub fn new(
        token: impl Into<String>,
        subject_id: impl Into<String>,
        expiry: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            subject_id: subject_id.into(),
            expiry: expiry.into(),
            signature: signature.into(),
        }
    }

    /// Expiry in unix seconds, `None` when the text is not a plain decimal.
    pub fn expiry_secs(&self) -> Option<u64> {
        if self.expiry.is_empty() || !self.expiry.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.expiry.parse().ok()
    }
}

/// Classification of a bundle before verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleState {
    /// No token field was supplied at all.
    Absent,
    /// Some fields supplied, these are missing.
    Partial(Vec<&'static str>),
    /// These fields were supplied with an unusable JSON type.
    Malformed(Vec<&'static str>),
    Complete(CapabilityToken),
}

impl TokenBundle {
    /// Empty strings count as missing. A malformed field outranks missing ones.
    pub fn state(&self) -> BundleState {
        if !self.malformed.is_empty() {
            return BundleState::Malformed(self.malformed.clone());
        }

        let fields: [(&'static str, &Option<String>); 4] = [
            ("token", &self.token),
            ("student_id", &self.subject_id),
            ("expiry", &self.expiry),
            ("signature", &self.signature),
        ];

        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, v)| v.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();

        if missing.len() == fields.len() {
            return BundleState::Absent;
        }
        if !missing.is_empty() {
            return BundleState::Partial(missing);
        }

        BundleState::Complete(CapabilityToken {
            token: self.token.clone().unwrap_or_default(),
            subject_id: self.subject_id.clone().unwrap_or_default(),
            expiry: self.expiry.clone().unwrap_or_default(),
            signature: self.signature.clone().unwrap_or_default(),
        })
    }
}

#[derive(Deserialize)]
struct BundleWire {
    #[serde(default)]
    token: Option<Value>,
    #[serde(default, rename = "student_id", alias = "subject_id")]
    subject_id: Option<Value>,
    #[serde(default)]
    expiry: Option<Value>,
    #[serde(default)]
    signature: Option<Value>,
}

/// Strings pass through, integers become their decimal text, `null` is absent.
fn field_text(
    name: &'static str,
    raw: Option<Value>,
    malformed: &mut Vec<&'static str>,
) -> Option<String> {
    match raw? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => {
            malformed.push(name);
            None
        }
    }
}

impl From<BundleWire> for TokenBundle {
    fn from(w: BundleWire) -> Self {
        let mut malformed = Vec::new();
        let token = field_text("token", w.token, &mut malformed);
        let subject_id = field_text("student_id", w.subject_id, &mut malformed);
        let expiry = field_text("expiry", w.expiry, &mut malformed);
        let signature = field_text("signature", w.signature, &mut malformed);
        Self {
            token,
            subject_id,
            expiry,
            signature,
            malformed,
        }
    }
}
