//! Viewport transform between image-pixel space and canvas space.
//!
//! Every on-screen coordinate satisfies `canvas = image * scale + offset`.
//! The transform is computed once per image load by [`Viewport::fit`] and is
//! never touched during interaction, so converting back with
//! [`Viewport::to_image`] recovers the original image coordinates up to
//! floating-point error. Rounding to whole pixels happens only at save time
//! through [`Viewport::to_image_rounded`].

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

/// A point in either image or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise minimum of two points.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self { x: self.x.min(other.x), y: self.y.min(other.y) }
    }

    /// Component-wise maximum of two points.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self { x: self.x.max(other.x), y: self.y.max(other.y) }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Axis-aligned rectangle with non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Build a well-formed rectangle from any two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let top_left = a.min(b);
        Self {
            x: top_left.x,
            y: top_left.y,
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Corners clockwise from the top-left: `[tl, tr, br, bl]`.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        let (l, t) = (self.x, self.y);
        let (r, b) = (self.x + self.width, self.y + self.height);
        [Point::new(l, t), Point::new(r, t), Point::new(r, b), Point::new(l, b)]
    }
}

/// Which two opposite corners a two-point rectangle names, and in what order.
///
/// A rectangle is displayed normalized, but its wire form is whatever pair of
/// corners it arrived with; this records that pair so it can be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CornerOrder {
    #[default]
    TopLeftFirst,
    BottomRightFirst,
    TopRightFirst,
    BottomLeftFirst,
}

impl CornerOrder {
    /// Order of the corner pair `(a, b)`. Ties count as not reversed.
    #[must_use]
    pub fn of(a: Point, b: Point) -> Self {
        match (a.x > b.x, a.y > b.y) {
            (false, false) => Self::TopLeftFirst,
            (true, true) => Self::BottomRightFirst,
            (true, false) => Self::TopRightFirst,
            (false, true) => Self::BottomLeftFirst,
        }
    }

    /// Indices into [`Rect::corners`] of the first and second wire point.
    #[must_use]
    pub fn indices(self) -> [usize; 2] {
        match self {
            Self::TopLeftFirst => [0, 2],
            Self::BottomRightFirst => [2, 0],
            Self::TopRightFirst => [1, 3],
            Self::BottomLeftFirst => [3, 1],
        }
    }
}

/// Width and height of an image or a display area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_usable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// How an image is fitted into the display area.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FitPolicy {
    /// Scale to fit both dimensions and center the result, leaving uniform margins.
    #[default]
    Letterbox,
    /// Scale so the image is exactly `width` canvas pixels wide, anchored at the origin.
    FixedWidth { width: f64 },
}

/// Errors from computing a viewport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("image size must be positive and finite, got {width}x{height}")]
    InvalidImageSize { width: f64, height: f64 },
    #[error("display size must be positive and finite, got {width}x{height}")]
    InvalidDisplaySize { width: f64, height: f64 },
    #[error("fixed display width must be positive and finite, got {0}")]
    InvalidFixedWidth(f64),
}

/// Scale and offset relating image pixels to canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

impl Viewport {
    /// Fit an image of `image` size into a display area of `display` size.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError`] if either size (or the fixed width) is zero,
    /// negative, or not finite.
    pub fn fit(policy: FitPolicy, image: Size, display: Size) -> Result<Self, ViewportError> {
        if !image.is_usable() {
            return Err(ViewportError::InvalidImageSize { width: image.width, height: image.height });
        }
        match policy {
            FitPolicy::Letterbox => {
                if !display.is_usable() {
                    return Err(ViewportError::InvalidDisplaySize { width: display.width, height: display.height });
                }
                let scale = (display.width / image.width).min(display.height / image.height);
                Ok(Self {
                    scale,
                    offset_x: (display.width - image.width * scale) / 2.0,
                    offset_y: (display.height - image.height * scale) / 2.0,
                })
            }
            FitPolicy::FixedWidth { width } => {
                if !(width.is_finite() && width > 0.0) {
                    return Err(ViewportError::InvalidFixedWidth(width));
                }
                Ok(Self { scale: width / image.width, offset_x: 0.0, offset_y: 0.0 })
            }
        }
    }

    /// Convert an image-space point to canvas coordinates.
    #[must_use]
    pub fn to_canvas(&self, image: Point) -> Point {
        Point {
            x: image.x * self.scale + self.offset_x,
            y: image.y * self.scale + self.offset_y,
        }
    }

    /// Convert a canvas point back to image coordinates, without rounding.
    #[must_use]
    pub fn to_image(&self, canvas: Point) -> Point {
        Point {
            x: (canvas.x - self.offset_x) / self.scale,
            y: (canvas.y - self.offset_y) / self.scale,
        }
    }

    /// Convert a canvas point to whole image pixels. Only used when serializing.
    #[must_use]
    pub fn to_image_rounded(&self, canvas: Point) -> Point {
        let p = self.to_image(canvas);
        Point { x: p.x.round(), y: p.y.round() }
    }
}
