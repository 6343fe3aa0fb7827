//! Top-level facade crate for pdfgate.
//!
//! Re-exports the token core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use pdfgate_core::*;
}

pub mod gateway {
    pub use pdfgate_gateway::*;
}
