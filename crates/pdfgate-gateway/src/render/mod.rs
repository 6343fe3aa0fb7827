//! Render pipeline and the headless-browser seam it drives.
//!
//! - `backend`: capability contract every rendering engine must satisfy
//! - `pipeline`: per-request lifecycle with guaranteed session release
//! - `chromium`: Chrome DevTools backend (chromiumoxide)
//! - `idle`: network-idle wait shared by backends

pub mod backend;
pub mod chromium;
pub mod idle;
pub mod pipeline;

pub use backend::{Margins, PageFormat, PdfOptions, RenderBackend, RenderError, RenderSession};
pub use chromium::ChromiumBackend;
pub use pipeline::{RenderArtifact, RenderPipeline, RenderSettings, PDF_MEDIA_TYPE};
