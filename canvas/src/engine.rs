//! Drawing engine: interaction state machine and image-space conversion.
//!
//! `EngineCore` owns the render binding, the shape store, the current mode,
//! the in-progress gesture, and the viewport for the loaded image. Every
//! input handler takes `&mut self` and returns the [`Action`]s the host must
//! react to (redraw, prompt for a label, show a notice). Nothing blocks: a
//! finished shape parks in [`Gesture::AwaitingLabel`] until the host answers
//! with [`EngineCore::submit_label`] or [`EngineCore::cancel_label`].

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::fmt;

use tracing::debug;

use crate::consts::{DEFAULT_LABEL, MARKER_RADIUS_PX, MIN_POLYGON_POINTS, UNLABELED};
use crate::doc::{Annotation, ObjectId, Shape, ShapeError, ShapeKind, ShapeStore};
use crate::input::{Gesture, Key, KeyCommand, Mode, PolygonDraft};
use crate::render::RenderBinding;
use crate::viewport::{CornerOrder, FitPolicy, Point, Rect, Size, Viewport, ViewportError};

/// A user-visible message for the host to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A drawing mode was switched on.
    ModeEnabled(Mode),
    /// Polygon completion was attempted with too few vertices.
    TooFewPolygonPoints { count: usize },
    /// The annotation was stored by the server.
    Saved,
    /// The save request failed; the in-memory shapes are untouched.
    SaveFailed(String),
    /// The annotation for the current image could not be loaded.
    LoadFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModeEnabled(Mode::Idle) => write!(f, "Selection mode enabled."),
            Self::ModeEnabled(Mode::DrawingRect) => write!(f, "Rectangle draw mode enabled."),
            Self::ModeEnabled(Mode::DrawingPolygon) => {
                write!(f, "Polygon draw mode enabled. Click to add points, double click to finish.")
            }
            Self::TooFewPolygonPoints { .. } => {
                write!(f, "Need at least {MIN_POLYGON_POINTS} points for a polygon.")
            }
            Self::Saved => write!(f, "Annotation saved!"),
            Self::SaveFailed(reason) => write!(f, "Save failed: {reason}"),
            Self::LoadFailed(reason) => write!(f, "Load failed: {reason}"),
        }
    }
}

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The scene changed and should be redrawn.
    RenderNeeded,
    /// A new image was loaded; draw it with its top-left at the offset, scaled by `scale`.
    BackgroundPlaced(Viewport),
    /// The selected shape changed.
    SelectionChanged(Option<ObjectId>),
    /// A shape was finalized into the store with this label.
    ShapeCreated { id: ObjectId, label: String },
    /// A shape was removed from the store.
    ShapeDeleted { id: ObjectId },
    /// Ask the user for a label; answer with `submit_label` or `cancel_label`.
    LabelRequested { id: ObjectId, default: String },
    /// Show a message to the user.
    Notice(Notice),
}

/// Behavior knobs fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// How images are fitted into the display.
    pub fit: FitPolicy,
    /// Size of the drawing surface in canvas pixels.
    pub display: Size,
    /// Stay in rectangle mode after each rectangle instead of returning to idle.
    pub sticky_rect_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fit: FitPolicy::Letterbox, display: Size::new(800.0, 600.0), sticky_rect_mode: false }
    }
}

/// Core engine state, generic over the drawing backend.
pub struct EngineCore<R> {
    binding: R,
    store: ShapeStore,
    mode: Mode,
    gesture: Gesture,
    polygon: PolygonDraft,
    viewport: Viewport,
    selection: Option<ObjectId>,
    config: EngineConfig,
}

impl<R: RenderBinding> EngineCore<R> {
    #[must_use]
    pub fn new(binding: R, config: EngineConfig) -> Self {
        Self {
            binding,
            store: ShapeStore::new(),
            mode: Mode::Idle,
            gesture: Gesture::None,
            polygon: PolygonDraft::default(),
            viewport: Viewport::default(),
            selection: None,
            config,
        }
    }

    // --- Image / annotation ---

    /// Start a new image: fit it to the display and discard every shape.
    ///
    /// The drawing mode is kept; any gesture or polygon in progress is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError`] for unusable sizes, leaving the engine untouched.
    pub fn load_image(&mut self, image: Size) -> Result<Vec<Action>, ViewportError> {
        let viewport = Viewport::fit(self.config.fit, image, self.config.display)?;
        self.binding.clear();
        self.store.clear();
        self.gesture = Gesture::None;
        self.polygon = PolygonDraft::default();
        self.selection = None;
        self.viewport = viewport;
        debug!(scale = viewport.scale, offset_x = viewport.offset_x, offset_y = viewport.offset_y, "image fitted");
        Ok(vec![Action::BackgroundPlaced(viewport), Action::SelectionChanged(None), Action::RenderNeeded])
    }

    /// Replace the displayed shapes with an image-space annotation.
    ///
    /// Any gesture in progress is dropped along with the previous shapes,
    /// including a shape still waiting for its label. The mode is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if any shape is malformed; nothing changes in that case.
    pub fn load_annotation(&mut self, annotation: &Annotation) -> Result<Vec<Action>, ShapeError> {
        annotation.validate()?;
        self.drop_gesture();
        self.remove_all_shapes();
        for shape in &annotation.shapes {
            let canvas: Vec<Point> = shape.points.iter().map(|p| self.viewport.to_canvas((*p).into())).collect();
            match shape.kind() {
                Some(ShapeKind::Rect) => {
                    let id = self.binding.create_rect(Rect::from_corners(canvas[0], canvas[1]));
                    self.store.insert_rect(id, shape.label.clone(), CornerOrder::of(canvas[0], canvas[1]));
                }
                _ => {
                    let id = self.binding.create_polygon(&canvas);
                    self.store.insert(id, shape.label.clone());
                }
            }
        }
        debug!(shapes = annotation.len(), "annotation loaded");
        Ok(vec![Action::RenderNeeded])
    }

    /// Read every finished shape back in whole image pixels.
    ///
    /// Loaded rectangles are written with the same corner pair, in the same
    /// order, they were loaded with; drawn ones as top-left then bottom-right.
    /// Geometry comes from the binding, so moves, scales, and rotations the
    /// user applied after drawing are included.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::MissingGeometry`] if the binding lost a stored shape.
    pub fn export_annotation(&self) -> Result<Annotation, ShapeError> {
        let mut shapes = Vec::with_capacity(self.store.len());
        for stored in self.store.iter() {
            let geometry =
                self.binding.effective_geometry(&stored.id).ok_or(ShapeError::MissingGeometry { id: stored.id })?;
            let points: Vec<[f64; 2]> =
                geometry.points_in(stored.corner_order).into_iter().map(|p| self.viewport.to_image_rounded(p).into()).collect();
            let label = if stored.label.is_empty() { UNLABELED.to_string() } else { stored.label.clone() };
            shapes.push(Shape { label, points });
        }
        Ok(Annotation { shapes })
    }

    // --- Modes ---

    /// Switch to rectangle drawing, abandoning any polygon in progress.
    pub fn activate_rect(&mut self) -> Vec<Action> {
        if self.is_awaiting_label() {
            return Vec::new();
        }
        self.abandon_rect();
        self.discard_polygon();
        self.mode = Mode::DrawingRect;
        debug!("rectangle mode");
        vec![Action::Notice(Notice::ModeEnabled(Mode::DrawingRect)), Action::RenderNeeded]
    }

    /// Switch to polygon drawing with an empty point buffer.
    pub fn activate_polygon(&mut self) -> Vec<Action> {
        if self.is_awaiting_label() {
            return Vec::new();
        }
        self.abandon_rect();
        self.discard_polygon();
        self.mode = Mode::DrawingPolygon;
        debug!("polygon mode");
        vec![Action::Notice(Notice::ModeEnabled(Mode::DrawingPolygon)), Action::RenderNeeded]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, p: Point) -> Vec<Action> {
        if self.gesture != Gesture::None {
            return Vec::new();
        }
        match self.mode {
            Mode::Idle => match self.hit_shape(p) {
                Some(id) => self.select(Some(id)),
                None => self.select(None),
            },
            Mode::DrawingRect => match self.hit_shape(p) {
                Some(id) => self.select(Some(id)),
                None => self.begin_rect(p),
            },
            Mode::DrawingPolygon => self.add_polygon_point(p),
        }
    }

    pub fn on_pointer_move(&mut self, p: Point) -> Vec<Action> {
        match self.gesture {
            Gesture::BuildingRect { id, anchor } => {
                self.binding.update_rect(&id, Rect::from_corners(anchor, p));
                vec![Action::RenderNeeded]
            }
            Gesture::None if self.mode == Mode::DrawingPolygon => {
                let (Some(rb), Some(last)) = (self.polygon.rubber_band, self.polygon.last_point()) else {
                    return Vec::new();
                };
                self.binding.update_segment(&rb, last, p);
                vec![Action::RenderNeeded]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, p: Point) -> Vec<Action> {
        let Gesture::BuildingRect { id, anchor } = self.gesture else {
            return Vec::new();
        };
        self.binding.update_rect(&id, Rect::from_corners(anchor, p));
        let next_mode = if self.config.sticky_rect_mode { Mode::DrawingRect } else { Mode::Idle };
        self.request_label(id, next_mode)
    }

    pub fn on_double_click(&mut self, _p: Point) -> Vec<Action> {
        if self.mode != Mode::DrawingPolygon || self.gesture != Gesture::None {
            return Vec::new();
        }
        let count = self.polygon.points.len();
        if count < MIN_POLYGON_POINTS {
            debug!(count, "polygon rejected");
            return vec![Action::Notice(Notice::TooFewPolygonPoints { count })];
        }
        let points = std::mem::take(&mut self.polygon.points);
        self.discard_polygon();
        let id = self.binding.create_polygon(&points);
        self.request_label(id, Mode::Idle)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        match KeyCommand::from_key(key) {
            Some(KeyCommand::ActivateRect) => self.activate_rect(),
            Some(KeyCommand::ActivatePolygon) => self.activate_polygon(),
            Some(KeyCommand::DeleteSelected) => self.delete_selected(),
            None => Vec::new(),
        }
    }

    // --- Labels ---

    /// Finalize the pending shape. An empty or absent label becomes the default.
    pub fn submit_label(&mut self, label: Option<String>) -> Vec<Action> {
        let Gesture::AwaitingLabel { id, next_mode } = self.gesture else {
            return Vec::new();
        };
        let label = label.filter(|l| !l.is_empty()).unwrap_or_else(|| DEFAULT_LABEL.to_string());
        self.store.insert(id, label.clone());
        self.gesture = Gesture::None;
        self.mode = next_mode;
        debug!(%id, %label, "shape finalized");
        vec![Action::ShapeCreated { id, label }, Action::RenderNeeded]
    }

    /// Finalize the pending shape with the default label.
    pub fn cancel_label(&mut self) -> Vec<Action> {
        self.submit_label(None)
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    #[must_use]
    pub fn is_awaiting_label(&self) -> bool {
        matches!(self.gesture, Gesture::AwaitingLabel { .. })
    }

    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn store(&self) -> &ShapeStore {
        &self.store
    }

    /// Canvas-space vertices buffered for the polygon in progress.
    #[must_use]
    pub fn polygon_points(&self) -> &[Point] {
        &self.polygon.points
    }

    #[must_use]
    pub fn binding(&self) -> &R {
        &self.binding
    }

    /// Mutable access for backend-side manipulation (moving, scaling, rotating shapes).
    pub fn binding_mut(&mut self) -> &mut R {
        &mut self.binding
    }

    // --- Internals ---

    fn hit_shape(&self, p: Point) -> Option<ObjectId> {
        self.binding.hit_test(p).filter(|id| self.store.contains(id))
    }

    fn select(&mut self, id: Option<ObjectId>) -> Vec<Action> {
        if self.selection == id {
            return Vec::new();
        }
        self.selection = id;
        self.binding.set_selection(id);
        vec![Action::SelectionChanged(id), Action::RenderNeeded]
    }

    fn begin_rect(&mut self, anchor: Point) -> Vec<Action> {
        let mut actions = self.select(None);
        let id = self.binding.create_rect(Rect::from_corners(anchor, anchor));
        self.gesture = Gesture::BuildingRect { id, anchor };
        actions.push(Action::RenderNeeded);
        actions
    }

    fn add_polygon_point(&mut self, p: Point) -> Vec<Action> {
        let mut actions = self.select(None);
        let previous = self.polygon.last_point();
        self.polygon.points.push(p);

        let marker = self.binding.create_marker(p, MARKER_RADIUS_PX);
        self.polygon.helpers.push(marker);
        if let Some(prev) = previous {
            let edge = self.binding.create_segment(prev, p);
            self.polygon.helpers.push(edge);
        }
        match self.polygon.rubber_band {
            Some(rb) => {
                self.binding.update_segment(&rb, p, p);
            }
            None => {
                let rb = self.binding.create_segment(p, p);
                self.polygon.helpers.push(rb);
                self.polygon.rubber_band = Some(rb);
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn abandon_rect(&mut self) {
        if let Gesture::BuildingRect { id, .. } = self.gesture {
            self.binding.remove(&id);
            self.gesture = Gesture::None;
        }
    }

    fn drop_gesture(&mut self) {
        self.abandon_rect();
        if let Gesture::AwaitingLabel { id, .. } = self.gesture {
            self.binding.remove(&id);
            self.gesture = Gesture::None;
        }
        self.discard_polygon();
    }

    fn discard_polygon(&mut self) {
        let draft = std::mem::take(&mut self.polygon);
        for id in &draft.helpers {
            self.binding.remove(id);
        }
    }

    fn request_label(&mut self, id: ObjectId, next_mode: Mode) -> Vec<Action> {
        self.gesture = Gesture::AwaitingLabel { id, next_mode };
        vec![Action::RenderNeeded, Action::LabelRequested { id, default: DEFAULT_LABEL.to_string() }]
    }

    fn delete_selected(&mut self) -> Vec<Action> {
        if self.gesture != Gesture::None {
            return Vec::new();
        }
        let Some(id) = self.selection else {
            return Vec::new();
        };
        if self.store.remove(&id).is_none() {
            return Vec::new();
        }
        self.binding.remove(&id);
        self.selection = None;
        self.binding.set_selection(None);
        debug!(%id, "shape deleted");
        vec![Action::ShapeDeleted { id }, Action::SelectionChanged(None), Action::RenderNeeded]
    }

    fn remove_all_shapes(&mut self) {
        for stored in self.store.iter() {
            self.binding.remove(&stored.id);
        }
        self.store.clear();
        if self.selection.take().is_some() {
            self.binding.set_selection(None);
        }
    }
}
