//! pdfgate core: capability-token verification and the shared error surface.
//!
//! This crate holds everything the gateway needs to decide whether a render
//! request may proceed. It carries no transport or runtime dependencies so
//! the verifier can be reused by the issuer side and by tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed tokens surface as a rejected verdict, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod token;

/// Shared result type.
pub use error::{PdfGateError, Result};
