//! Geometric containment tests used for hit-testing.
//!
//! All functions work in a single coordinate space; callers are responsible
//! for mapping the query point into the shape's local space first.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::viewport::{Point, Rect};

/// Whether `p` lies inside `rect`, grown by `slop` on every side.
#[must_use]
pub fn point_in_rect(p: Point, rect: &Rect, slop: f64) -> bool {
    p.x >= rect.x - slop
        && p.x <= rect.x + rect.width + slop
        && p.y >= rect.y - slop
        && p.y <= rect.y + rect.height + slop
}

/// Even-odd containment test for a closed polygon.
#[must_use]
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Shortest distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Whether `p` is inside the closed polygon or within `slop` of its outline.
#[must_use]
pub fn polygon_hit(p: Point, vertices: &[Point], slop: f64) -> bool {
    if point_in_polygon(p, vertices) {
        return true;
    }
    let n = vertices.len();
    (0..n).any(|i| distance_to_segment(p, vertices[i], vertices[(i + 1) % n]) <= slop)
}
