//! Drawing engine for the region annotator.
//!
//! This crate owns everything that happens between a pointer event and a
//! labeled region: the viewport transform that relates image pixels to the
//! on-screen canvas, the interaction state machine that turns pointer and
//! keyboard input into rectangles and polygons, and the conversion of the
//! drawn regions to and from the image-space wire format. Actual drawing is
//! delegated to a [`render::RenderBinding`] supplied by the host.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`] and the [`engine::Action`]s it emits |
//! | [`doc`] | Wire types (`Shape`, `Annotation`) and the in-memory [`doc::ShapeStore`] |
//! | [`viewport`] | Image ↔ canvas coordinate mapping and fit policies |
//! | [`input`] | Interaction modes, keys, and the gesture/polygon state |
//! | [`hit`] | Geometric containment tests used for hit-testing |
//! | [`render`] | The [`render::RenderBinding`] capability trait and the in-memory [`render::Scene`] |
//! | [`consts`] | Shared constants (default labels, minimum point counts, helper sizes) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod render;
pub mod viewport;
