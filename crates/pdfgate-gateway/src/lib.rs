//! pdfgate gateway library entry.
//!
//! Wires config, token policy, the render pipeline and its Chromium backend,
//! and the HTTP transport into one service. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod render;
pub mod router;
pub mod transport;
