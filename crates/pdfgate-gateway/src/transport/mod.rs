//! Transport layer (HTTP).
//!
//! Request bodies are decoded once by the codec, handlers gate on the token
//! policy and drive the render pipeline, and every failure leaves through
//! `ApiError` as a bounded JSON body.

pub mod codec;
pub mod http;
pub mod response;
