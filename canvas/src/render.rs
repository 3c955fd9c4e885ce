//! Render binding: the capability interface to whatever draws the canvas.
//!
//! The engine never touches pixels. It creates, updates, and removes objects
//! through [`RenderBinding`] and reads back their *effective* geometry, which
//! includes any move, scale, or rotation the user applied with the backend's
//! selection handles after the object was created.
//!
//! [`Scene`] is an in-memory backend with per-object affine transforms and
//! hit-testing. Headless hosts and tests use it directly; a graphical host
//! wraps its drawing library in its own `RenderBinding` impl.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use uuid::Uuid;

use crate::consts::HIT_SLOP_PX;
use crate::doc::ObjectId;
use crate::hit;
use crate::viewport::{CornerOrder, Point, Rect};

/// Effective canvas-space geometry of a finished shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A rectangle, reported as its four transformed corners, clockwise from
    /// the untransformed top-left.
    Rect([Point; 4]),
    /// A polygon, reported as every transformed vertex.
    Polygon(Vec<Point>),
}

impl Geometry {
    /// The geometry's defining points in wire order, top-left corner first for rectangles.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        self.points_in(CornerOrder::TopLeftFirst)
    }

    /// Like [`Geometry::points`], with a rectangle's two corners picked by `order`.
    #[must_use]
    pub fn points_in(&self, order: CornerOrder) -> Vec<Point> {
        match self {
            Self::Rect(corners) => order.indices().iter().map(|&i| corners[i]).collect(),
            Self::Polygon(points) => points.clone(),
        }
    }
}

/// Operations the engine needs from a drawing backend.
pub trait RenderBinding {
    /// Add a selectable rectangle.
    fn create_rect(&mut self, rect: Rect) -> ObjectId;

    /// Replace a rectangle's untransformed bounds. Returns false if `id` is not a rectangle.
    fn update_rect(&mut self, id: &ObjectId, rect: Rect) -> bool;

    /// Add a selectable closed polygon.
    fn create_polygon(&mut self, points: &[Point]) -> ObjectId;

    /// Add a non-selectable vertex marker.
    fn create_marker(&mut self, center: Point, radius: f64) -> ObjectId;

    /// Add a non-selectable line segment.
    fn create_segment(&mut self, a: Point, b: Point) -> ObjectId;

    /// Move a segment's endpoints. Returns false if `id` is not a segment.
    fn update_segment(&mut self, id: &ObjectId, a: Point, b: Point) -> bool;

    /// Effective geometry of a rectangle or polygon, after backend transforms.
    fn effective_geometry(&self, id: &ObjectId) -> Option<Geometry>;

    /// Remove any object. Returns false if it was not present.
    fn remove(&mut self, id: &ObjectId) -> bool;

    /// Topmost selectable object under `p`, if any. Helper marks never hit.
    fn hit_test(&self, p: Point) -> Option<ObjectId>;

    /// Show selection handles on `id`, or on nothing.
    fn set_selection(&mut self, id: Option<ObjectId>);

    /// Remove every object.
    fn clear(&mut self);
}

// =============================================================
// Affine
// =============================================================

/// 2D affine transform `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn translate(dx: f64, dy: f64) -> Self {
        Self { e: dx, f: dy, ..Self::IDENTITY }
    }

    /// Scale by `(sx, sy)` keeping `center` fixed.
    #[must_use]
    pub fn scale_about(center: Point, sx: f64, sy: f64) -> Self {
        Self::translate(-center.x, -center.y)
            .then(Self { a: sx, d: sy, ..Self::IDENTITY })
            .then(Self::translate(center.x, center.y))
    }

    /// Rotate clockwise (in screen coordinates) by `degrees` around `center`.
    #[must_use]
    pub fn rotate_about(center: Point, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::translate(-center.x, -center.y)
            .then(Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 })
            .then(Self::translate(center.x, center.y))
    }

    /// Apply `self` first, then `next`.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        Self {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Inverse transform, or `None` if the transform collapses the plane.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }
}

// =============================================================
// Scene
// =============================================================

/// Untransformed geometry of a scene object.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Rect(Rect),
    Polygon(Vec<Point>),
    Marker { center: Point, radius: f64 },
    Segment { a: Point, b: Point },
}

impl Body {
    fn is_shape(&self) -> bool {
        matches!(self, Self::Rect(_) | Self::Polygon(_))
    }
}

/// One object held by a [`Scene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub body: Body,
    pub transform: Affine,
}

/// In-memory [`RenderBinding`] with per-object transforms.
///
/// Objects are kept in creation order, which is also stacking order: later
/// objects are on top and win hit-tests.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    selection: Option<ObjectId>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose `transform` onto an object's current transform, as a user
    /// dragging, scaling, or rotating it would. Returns false if `id` is unknown.
    pub fn transform(&mut self, id: &ObjectId, transform: Affine) -> bool {
        let Some(obj) = self.get_mut(id) else {
            return false;
        };
        obj.transform = obj.transform.then(transform);
        true
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    /// All objects, bottom first.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    /// Number of selectable shapes (rectangles and polygons).
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.objects.iter().filter(|o| o.body.is_shape()).count()
    }

    /// Number of helper marks (markers and segments).
    #[must_use]
    pub fn helper_count(&self) -> usize {
        self.objects.iter().filter(|o| !o.body.is_shape()).count()
    }

    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    fn get_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| &o.id == id)
    }

    fn push(&mut self, body: Body) -> ObjectId {
        let id = Uuid::new_v4();
        self.objects.push(SceneObject { id, body, transform: Affine::IDENTITY });
        id
    }
}

impl RenderBinding for Scene {
    fn create_rect(&mut self, rect: Rect) -> ObjectId {
        self.push(Body::Rect(rect))
    }

    fn update_rect(&mut self, id: &ObjectId, rect: Rect) -> bool {
        match self.get_mut(id) {
            Some(SceneObject { body: Body::Rect(r), .. }) => {
                *r = rect;
                true
            }
            _ => false,
        }
    }

    fn create_polygon(&mut self, points: &[Point]) -> ObjectId {
        self.push(Body::Polygon(points.to_vec()))
    }

    fn create_marker(&mut self, center: Point, radius: f64) -> ObjectId {
        self.push(Body::Marker { center, radius })
    }

    fn create_segment(&mut self, a: Point, b: Point) -> ObjectId {
        self.push(Body::Segment { a, b })
    }

    fn update_segment(&mut self, id: &ObjectId, a: Point, b: Point) -> bool {
        match self.get_mut(id) {
            Some(SceneObject { body: Body::Segment { a: sa, b: sb }, .. }) => {
                *sa = a;
                *sb = b;
                true
            }
            _ => false,
        }
    }

    fn effective_geometry(&self, id: &ObjectId) -> Option<Geometry> {
        let obj = self.get(id)?;
        let t = obj.transform;
        match &obj.body {
            Body::Rect(r) => Some(Geometry::Rect(r.corners().map(|p| t.apply(p)))),
            Body::Polygon(points) => Some(Geometry::Polygon(points.iter().map(|p| t.apply(*p)).collect())),
            Body::Marker { .. } | Body::Segment { .. } => None,
        }
    }

    fn remove(&mut self, id: &ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| &o.id != id);
        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        self.objects.len() != before
    }

    fn hit_test(&self, p: Point) -> Option<ObjectId> {
        self.objects.iter().rev().find_map(|obj| {
            let local = obj.transform.invert()?.apply(p);
            let inside = match &obj.body {
                Body::Rect(r) => hit::point_in_rect(local, r, HIT_SLOP_PX),
                Body::Polygon(points) => hit::polygon_hit(local, points, HIT_SLOP_PX),
                Body::Marker { .. } | Body::Segment { .. } => false,
            };
            inside.then_some(obj.id)
        })
    }

    fn set_selection(&mut self, id: Option<ObjectId>) {
        self.selection = id;
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.selection = None;
    }
}
