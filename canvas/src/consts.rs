//! Shared constants for the canvas crate.

// ── Labels ──────────────────────────────────────────────────────

/// Label given to a freshly drawn shape when the user leaves the prompt empty or cancels it.
pub const DEFAULT_LABEL: &str = "object";

/// Label written on save for a shape that somehow carries no label.
pub const UNLABELED: &str = "unlabeled";

// ── Geometry ────────────────────────────────────────────────────

/// Number of points that encode a rectangle (two opposite corners).
pub const RECT_POINT_COUNT: usize = 2;

/// Fewest vertices a polygon may be finished with.
pub const MIN_POLYGON_POINTS: usize = 3;

// ── Helper marks ────────────────────────────────────────────────

/// Radius of the vertex marker dropped on each polygon click, in canvas pixels.
pub const MARKER_RADIUS_PX: f64 = 3.0;

/// Slop for hit-testing thin outlines, in canvas pixels.
pub const HIT_SLOP_PX: f64 = 4.0;
