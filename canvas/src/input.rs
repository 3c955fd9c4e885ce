//! Input model: interaction modes, keys, and the gesture state machine.
//!
//! `Mode` is the drawing mode the user has picked. `Gesture` is the transient
//! state of the interaction currently in progress: a rectangle being dragged
//! out, or a finished shape waiting for its label. `PolygonDraft` is the point
//! buffer and helper marks for a polygon that is being clicked out vertex by
//! vertex.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::ObjectId;
use crate::viewport::Point;

/// Which kind of shape, if any, a pointer-down on empty canvas starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Pointer-down selects existing shapes; nothing is drawn.
    #[default]
    Idle,
    /// Pointer-down on empty canvas starts a rectangle.
    DrawingRect,
    /// Pointer-down appends a polygon vertex; double-click finishes.
    DrawingPolygon,
}

/// A keyboard key as reported by the host.
///
/// The inner string holds the key name (e.g. `"r"`, `"Delete"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// What a recognized key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    ActivateRect,
    ActivatePolygon,
    DeleteSelected,
}

impl KeyCommand {
    /// Map a key to its command. Unbound keys yield `None`.
    #[must_use]
    pub fn from_key(key: &Key) -> Option<Self> {
        match key.0.as_str() {
            "r" => Some(Self::ActivateRect),
            "p" => Some(Self::ActivatePolygon),
            "Delete" => Some(Self::DeleteSelected),
            _ => None,
        }
    }
}

/// The interaction currently in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    /// Nothing in progress.
    #[default]
    None,
    /// A rectangle is being dragged out from `anchor` (canvas space).
    BuildingRect {
        /// Render-binding object being resized.
        id: ObjectId,
        /// Canvas point where the drag started.
        anchor: Point,
    },
    /// A finished shape is waiting for the host to supply its label.
    AwaitingLabel {
        /// Render-binding object the label belongs to.
        id: ObjectId,
        /// Mode to settle into once the label arrives.
        next_mode: Mode,
    },
}

/// In-progress polygon: buffered vertices and the helper marks drawn for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonDraft {
    /// Vertices clicked so far, in canvas space.
    pub points: Vec<Point>,
    /// Every helper object (markers, fixed segments, rubber band) added for this draft.
    pub helpers: Vec<ObjectId>,
    /// The segment that follows the live pointer from the last vertex.
    pub rubber_band: Option<ObjectId>,
}

impl PolygonDraft {
    /// The most recently buffered vertex.
    #[must_use]
    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
