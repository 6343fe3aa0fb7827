//! Policy layer (token verification mode, caller origin).
//!
//! Compiles config into runtime values once at startup.

pub mod auth;
pub mod origin;

pub use auth::compile as compile_auth;
pub use origin::cors_layer;
