//! Editor session: one image, one engine, one annotation server.
//!
//! `Editor` glues the synchronous [`EngineCore`] to an [`AnnotationStore`].
//! Opening an image fits the viewport and pulls the stored shapes; saving
//! reads the shapes back in image pixels and pushes them. Engine actions pass
//! through [`Editor::apply`] so user-visible notices are collected in one place.

use canvas::doc::ShapeError;
use canvas::engine::{Action, EngineConfig, EngineCore, Notice};
use canvas::input::Key;
use canvas::render::{RenderBinding, Scene};
use canvas::viewport::{Point, Size, ViewportError};
use serde::Deserialize;
use tracing::{info, warn};

use crate::client::{AnnotationStore, ClientError};

/// Errors produced by editor operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no image is open")]
    NoImage,

    #[error("annotation for {filename} was never loaded; refusing to overwrite it")]
    NotLoaded { filename: String },

    #[error(transparent)]
    Viewport(#[from] ViewportError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl EditorError {
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Client(e) if e.retryable())
    }
}

/// A host input event. Deserializes from `{"type": "pointer_down", "x": .., "y": ..}` style lines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    DoubleClick { x: f64, y: f64 },
    Key { key: String },
    /// Answer to a pending label request; `null` or `""` means the default.
    Label {
        #[serde(default)]
        text: Option<String>,
    },
    CancelLabel,
}

pub struct Editor<S, R = Scene> {
    engine: EngineCore<R>,
    store: S,
    filename: Option<String>,
    loaded: bool,
    notices: Vec<Notice>,
}

impl<S: AnnotationStore> Editor<S, Scene> {
    /// Editor drawing into an in-memory [`Scene`].
    #[must_use]
    pub fn headless(store: S, config: EngineConfig) -> Self {
        Self::new(store, Scene::new(), config)
    }
}

impl<S: AnnotationStore, R: RenderBinding> Editor<S, R> {
    #[must_use]
    pub fn new(store: S, binding: R, config: EngineConfig) -> Self {
        Self { engine: EngineCore::new(binding, config), store, filename: None, loaded: false, notices: Vec::new() }
    }

    /// Open `filename` (already decoded to `image` pixels) and load its shapes.
    ///
    /// The previous image's shapes are discarded first, so a failed load
    /// leaves the new image with no shapes. Saving is refused until a later
    /// `open` succeeds, so the empty canvas never replaces the stored shapes.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable image size, a failed fetch, or a
    /// malformed stored annotation. Fetch and validation failures also
    /// record a [`Notice::LoadFailed`].
    pub async fn open(&mut self, filename: &str, image: Size) -> Result<Vec<Action>, EditorError> {
        let mut actions = self.engine.load_image(image)?;
        self.filename = Some(filename.to_string());
        self.loaded = false;

        let annotation = match self.store.load_annotation(filename).await {
            Ok(annotation) => annotation,
            Err(err) => return Err(self.load_failed(filename, err.into())),
        };
        match self.engine.load_annotation(&annotation) {
            Ok(more) => actions.extend(more),
            Err(err) => return Err(self.load_failed(filename, err.into())),
        }
        self.loaded = true;
        info!(%filename, shapes = annotation.len(), scale = self.engine.viewport().scale, "image opened");
        Ok(self.record(actions))
    }

    /// Push every finished shape to the server in image pixels.
    ///
    /// The in-memory shapes are never modified; a failed save can simply be retried.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoImage`] before any image is opened and
    /// [`EditorError::NotLoaded`] while the open image's load has failed,
    /// otherwise the export or client error. Every failure except `NoImage`
    /// records a [`Notice::SaveFailed`].
    pub async fn save(&mut self) -> Result<Vec<Action>, EditorError> {
        let Some(filename) = self.filename.clone() else {
            return Err(EditorError::NoImage);
        };
        let result = if self.loaded {
            match self.engine.export_annotation() {
                Ok(annotation) => self.store.save_annotation(&filename, &annotation).await.map_err(EditorError::from),
                Err(err) => Err(err.into()),
            }
        } else {
            Err(EditorError::NotLoaded { filename: filename.clone() })
        };
        match result {
            Ok(()) => Ok(self.record(vec![Action::Notice(Notice::Saved)])),
            Err(err) => {
                warn!(%filename, error = %err, retryable = err.retryable(), "save failed");
                self.notices.push(Notice::SaveFailed(err.to_string()));
                Err(err)
            }
        }
    }

    /// Feed one input event to the engine.
    pub fn apply(&mut self, event: &InputEvent) -> Vec<Action> {
        let actions = match event {
            InputEvent::PointerDown { x, y } => self.engine.on_pointer_down(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y } => self.engine.on_pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y } => self.engine.on_pointer_up(Point::new(*x, *y)),
            InputEvent::DoubleClick { x, y } => self.engine.on_double_click(Point::new(*x, *y)),
            InputEvent::Key { key } => self.engine.on_key_down(&Key::new(key.as_str())),
            InputEvent::Label { text } => self.engine.submit_label(text.clone()),
            InputEvent::CancelLabel => self.engine.cancel_label(),
        };
        self.record(actions)
    }

    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Whether the open image's stored shapes were loaded, so saving is allowed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn engine(&self) -> &EngineCore<R> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EngineCore<R> {
        &mut self.engine
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the notices collected so far.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn record(&mut self, actions: Vec<Action>) -> Vec<Action> {
        for action in &actions {
            if let Action::Notice(notice) = action {
                self.notices.push(notice.clone());
            }
        }
        actions
    }

    fn load_failed(&mut self, filename: &str, err: EditorError) -> EditorError {
        warn!(%filename, error = %err, "annotation load failed");
        self.notices.push(Notice::LoadFailed(err.to_string()));
        err
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
