//! Host side of the region annotator.
//!
//! The drawing engine lives in the `canvas` crate. This crate connects it to
//! the annotation server:
//!
//! - [`config`]: environment-driven settings (server URL, display, fit policy)
//! - [`client`]: reqwest client for the server routes and the [`client::AnnotationStore`] seam
//! - [`session`]: [`session::Editor`], one open image with load/save and input replay

pub mod client;
pub mod config;
pub mod session;
