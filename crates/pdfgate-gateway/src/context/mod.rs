//! Per-request context types shared across layers.
//!
//! A `RenderRequest` is built by the transport codec and consumed by the
//! handler; it never outlives the HTTP call that created it.

pub mod request;

pub use request::RenderRequest;
