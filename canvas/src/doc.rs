//! Document model: labeled shapes on the wire and the in-memory shape store.
//!
//! `Shape` and `Annotation` are the image-space wire types exchanged with the
//! annotation server. Their points are always image pixels, never canvas
//! pixels. `ShapeStore` is the runtime list of shapes the user has drawn in
//! the current session; it records only identity and label, because the
//! geometry of a displayed shape lives in the render binding, where the user
//! may have moved, scaled, or rotated it since it was created.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::consts::{MIN_POLYGON_POINTS, RECT_POINT_COUNT};
use crate::viewport::CornerOrder;

/// Identifier of an object held by the render binding.
pub type ObjectId = Uuid;

/// Errors raised when shape data cannot be interpreted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// A shape has a point count that is neither a rectangle nor a polygon.
    #[error("shape {index} has {count} point(s); expected 2 (rectangle) or at least 3 (polygon)")]
    InvalidPointCount { index: usize, count: usize },
    /// A shape contains a NaN or infinite coordinate.
    #[error("shape {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    /// The render binding no longer knows an object the store refers to.
    #[error("render binding has no geometry for shape {id}")]
    MissingGeometry { id: ObjectId },
}

/// What a shape's point list encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Two opposite corners of an axis-aligned rectangle.
    Rect,
    /// Three or more vertices of a closed polygon.
    Polygon,
}

impl ShapeKind {
    /// Classify a point count. `None` for 0 or 1 points.
    #[must_use]
    pub fn from_point_count(count: usize) -> Option<Self> {
        match count {
            RECT_POINT_COUNT => Some(Self::Rect),
            n if n >= MIN_POLYGON_POINTS => Some(Self::Polygon),
            _ => None,
        }
    }
}

/// A labeled region in image-pixel space.
///
/// Whole-pixel coordinates serialize as JSON integers (`[[200,200],[600,400]]`);
/// fractional ones stay floats. Either form deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub label: String,
    #[serde(serialize_with = "serialize_points")]
    pub points: Vec<[f64; 2]>,
}

/// Largest magnitude below which every whole `f64` is an exact `i64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

struct WireCoord(f64);

impl Serialize for WireCoord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() && v.trunc().to_bits() == v.to_bits() && v.abs() < MAX_EXACT_INT {
            #[allow(clippy::cast_possible_truncation)]
            let whole = v as i64;
            return serializer.serialize_i64(whole);
        }
        serializer.serialize_f64(v)
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_points<S: Serializer>(points: &Vec<[f64; 2]>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(points.iter().map(|&[x, y]| [WireCoord(x), WireCoord(y)]))
}

impl Shape {
    #[must_use]
    pub fn new(label: impl Into<String>, points: Vec<[f64; 2]>) -> Self {
        Self { label: label.into(), points }
    }

    /// Whether this shape is a rectangle or a polygon, or `None` if malformed.
    #[must_use]
    pub fn kind(&self) -> Option<ShapeKind> {
        ShapeKind::from_point_count(self.points.len())
    }
}

/// All shapes attached to one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Annotation {
    /// Check that every shape has a usable point count and finite coordinates.
    ///
    /// # Errors
    ///
    /// Returns the first [`ShapeError`] found, tagged with the shape's index.
    pub fn validate(&self) -> Result<(), ShapeError> {
        for (index, shape) in self.shapes.iter().enumerate() {
            if shape.kind().is_none() {
                return Err(ShapeError::InvalidPointCount { index, count: shape.points.len() });
            }
            if shape.points.iter().flatten().any(|c| !c.is_finite()) {
                return Err(ShapeError::NonFinite { index });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// A finished shape in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredShape {
    /// Handle of the shape's object in the render binding.
    pub id: ObjectId,
    /// User-visible label.
    pub label: String,
    /// Wire corner pair for rectangles; ignored for polygons.
    pub corner_order: CornerOrder,
}

/// In-memory list of finished shapes, in the order they were added.
#[derive(Debug, Default)]
pub struct ShapeStore {
    shapes: Vec<StoredShape>,
}

impl ShapeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Append a shape. If `id` is already present its label is replaced instead.
    pub fn insert(&mut self, id: ObjectId, label: impl Into<String>) {
        let label = label.into();
        match self.shapes.iter_mut().find(|s| s.id == id) {
            Some(existing) => existing.label = label,
            None => self.shapes.push(StoredShape { id, label, corner_order: CornerOrder::default() }),
        }
    }

    /// Like [`ShapeStore::insert`], also recording which corner pair a rectangle saves as.
    pub fn insert_rect(&mut self, id: ObjectId, label: impl Into<String>, corner_order: CornerOrder) {
        self.insert(id, label);
        if let Some(existing) = self.shapes.iter_mut().find(|s| s.id == id) {
            existing.corner_order = corner_order;
        }
    }

    /// Remove a shape by id, returning it if it was present.
    pub fn remove(&mut self, id: &ObjectId) -> Option<StoredShape> {
        let pos = self.shapes.iter().position(|s| &s.id == id)?;
        Some(self.shapes.remove(pos))
    }

    /// Return a shape by id.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&StoredShape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate shapes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredShape> {
        self.shapes.iter()
    }

    /// Drop every shape.
    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
