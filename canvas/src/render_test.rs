#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
    Rect { x, y, width: w, height: h }
}

// =============================================================
// Affine
// =============================================================

#[test]
fn identity_leaves_points_alone() {
    assert_eq!(Affine::IDENTITY.apply(pt(3.0, -4.0)), pt(3.0, -4.0));
    assert_eq!(Affine::default(), Affine::IDENTITY);
}

#[test]
fn translate_moves_points() {
    assert_eq!(Affine::translate(5.0, -2.0).apply(pt(1.0, 1.0)), pt(6.0, -1.0));
}

#[test]
fn scale_about_keeps_center_fixed() {
    let t = Affine::scale_about(pt(10.0, 10.0), 2.0, 3.0);
    assert_eq!(t.apply(pt(10.0, 10.0)), pt(10.0, 10.0));
    assert_eq!(t.apply(pt(11.0, 11.0)), pt(12.0, 13.0));
}

#[test]
fn rotate_quarter_turn_is_clockwise_on_screen() {
    let t = Affine::rotate_about(pt(0.0, 0.0), 90.0);
    assert!(point_approx_eq(t.apply(pt(1.0, 0.0)), pt(0.0, 1.0)));
    assert!(point_approx_eq(t.apply(pt(0.0, 1.0)), pt(-1.0, 0.0)));
}

#[test]
fn then_applies_left_first() {
    let t = Affine::translate(10.0, 0.0).then(Affine::scale_about(pt(0.0, 0.0), 2.0, 2.0));
    assert_eq!(t.apply(pt(1.0, 1.0)), pt(22.0, 2.0));
}

#[test]
fn invert_undoes_transform() {
    let t = Affine::rotate_about(pt(5.0, 5.0), 33.0)
        .then(Affine::scale_about(pt(1.0, 2.0), 1.5, 0.5))
        .then(Affine::translate(-7.0, 4.0));
    let inv = t.invert().unwrap();
    let p = pt(12.5, -3.25);
    assert!(point_approx_eq(inv.apply(t.apply(p)), p));
}

#[test]
fn invert_degenerate_is_none() {
    let t = Affine::scale_about(pt(0.0, 0.0), 0.0, 1.0);
    assert!(t.invert().is_none());
}

// =============================================================
// Scene: object lifecycle
// =============================================================

#[test]
fn scene_counts_shapes_and_helpers() {
    let mut scene = Scene::new();
    scene.create_rect(rect(0.0, 0.0, 10.0, 10.0));
    scene.create_polygon(&[pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0)]);
    scene.create_marker(pt(1.0, 1.0), 3.0);
    scene.create_segment(pt(0.0, 0.0), pt(1.0, 1.0));
    assert_eq!(scene.shape_count(), 2);
    assert_eq!(scene.helper_count(), 2);
    assert_eq!(scene.objects().count(), 4);
}

#[test]
fn update_rect_only_applies_to_rects() {
    let mut scene = Scene::new();
    let r = scene.create_rect(rect(0.0, 0.0, 1.0, 1.0));
    let s = scene.create_segment(pt(0.0, 0.0), pt(1.0, 1.0));
    assert!(scene.update_rect(&r, rect(2.0, 3.0, 4.0, 5.0)));
    assert!(!scene.update_rect(&s, rect(2.0, 3.0, 4.0, 5.0)));
    assert_eq!(scene.get(&r).map(|o| o.body.clone()), Some(Body::Rect(rect(2.0, 3.0, 4.0, 5.0))));
}

#[test]
fn update_segment_moves_endpoints() {
    let mut scene = Scene::new();
    let s = scene.create_segment(pt(0.0, 0.0), pt(1.0, 1.0));
    assert!(scene.update_segment(&s, pt(2.0, 2.0), pt(9.0, 9.0)));
    assert_eq!(scene.get(&s).map(|o| o.body.clone()), Some(Body::Segment { a: pt(2.0, 2.0), b: pt(9.0, 9.0) }));
}

#[test]
fn remove_clears_selection_of_removed_object() {
    let mut scene = Scene::new();
    let r = scene.create_rect(rect(0.0, 0.0, 1.0, 1.0));
    scene.set_selection(Some(r));
    assert!(scene.remove(&r));
    assert!(scene.selection().is_none());
    assert!(!scene.remove(&r));
}

#[test]
fn clear_removes_everything() {
    let mut scene = Scene::new();
    let r = scene.create_rect(rect(0.0, 0.0, 1.0, 1.0));
    scene.create_marker(pt(0.0, 0.0), 3.0);
    scene.set_selection(Some(r));
    scene.clear();
    assert_eq!(scene.objects().count(), 0);
    assert!(scene.selection().is_none());
}

// =============================================================
// Scene: effective geometry
// =============================================================

#[test]
fn rect_geometry_without_transform() {
    let mut scene = Scene::new();
    let r = scene.create_rect(rect(5.0, 5.0, 20.0, 10.0));
    assert_eq!(
        scene.effective_geometry(&r),
        Some(Geometry::Rect([pt(5.0, 5.0), pt(25.0, 5.0), pt(25.0, 15.0), pt(5.0, 15.0)]))
    );
}

#[test]
fn rect_geometry_follows_move_and_scale() {
    let mut scene = Scene::new();
    let r = scene.create_rect(rect(0.0, 0.0, 10.0, 10.0));
    assert!(scene.transform(&r, Affine::scale_about(pt(0.0, 0.0), 2.0, 3.0)));
    assert!(scene.transform(&r, Affine::translate(100.0, 50.0)));
    assert_eq!(
        scene.effective_geometry(&r),
        Some(Geometry::Rect([pt(100.0, 50.0), pt(120.0, 50.0), pt(120.0, 80.0), pt(100.0, 80.0)]))
    );
}

#[test]
fn polygon_geometry_follows_rotation() {
    let mut scene = Scene::new();
    let p = scene.create_polygon(&[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)]);
    scene.transform(&p, Affine::rotate_about(pt(0.0, 0.0), 90.0));
    let Some(Geometry::Polygon(points)) = scene.effective_geometry(&p) else {
        panic!("expected polygon geometry");
    };
    assert!(point_approx_eq(points[0], pt(0.0, 0.0)));
    assert!(point_approx_eq(points[1], pt(0.0, 10.0)));
    assert!(point_approx_eq(points[2], pt(-10.0, 10.0)));
}

#[test]
fn helpers_have_no_geometry() {
    let mut scene = Scene::new();
    let m = scene.create_marker(pt(1.0, 1.0), 3.0);
    let s = scene.create_segment(pt(0.0, 0.0), pt(1.0, 1.0));
    assert!(scene.effective_geometry(&m).is_none());
    assert!(scene.effective_geometry(&s).is_none());
}

#[test]
fn geometry_points_wire_order() {
    let g = Geometry::Rect([pt(1.0, 2.0), pt(3.0, 2.0), pt(3.0, 4.0), pt(1.0, 4.0)]);
    assert_eq!(g.points(), vec![pt(1.0, 2.0), pt(3.0, 4.0)]);
    assert_eq!(g.points_in(CornerOrder::BottomRightFirst), vec![pt(3.0, 4.0), pt(1.0, 2.0)]);
    assert_eq!(g.points_in(CornerOrder::TopRightFirst), vec![pt(3.0, 2.0), pt(1.0, 4.0)]);
}

// =============================================================
// Scene: hit-testing
// =============================================================

#[test]
fn hit_test_finds_rect() {
    let mut scene = Scene::new();
    let r = scene.create_rect(rect(10.0, 10.0, 20.0, 20.0));
    assert_eq!(scene.hit_test(pt(15.0, 15.0)), Some(r));
    assert_eq!(scene.hit_test(pt(100.0, 100.0)), None);
}

#[test]
fn hit_test_prefers_topmost() {
    let mut scene = Scene::new();
    scene.create_rect(rect(0.0, 0.0, 50.0, 50.0));
    let top = scene.create_rect(rect(10.0, 10.0, 10.0, 10.0));
    assert_eq!(scene.hit_test(pt(15.0, 15.0)), Some(top));
}

#[test]
fn hit_test_ignores_helpers() {
    let mut scene = Scene::new();
    scene.create_marker(pt(5.0, 5.0), 3.0);
    scene.create_segment(pt(0.0, 0.0), pt(10.0, 10.0));
    assert_eq!(scene.hit_test(pt(5.0, 5.0)), None);
}

#[test]
fn hit_test_follows_transform() {
    let mut scene = Scene::new();
    let r = scene.create_rect(rect(0.0, 0.0, 10.0, 10.0));
    scene.transform(&r, Affine::translate(200.0, 0.0));
    assert_eq!(scene.hit_test(pt(5.0, 5.0)), None);
    assert_eq!(scene.hit_test(pt(205.0, 5.0)), Some(r));
}

#[test]
fn hit_test_polygon_interior() {
    let mut scene = Scene::new();
    let p = scene.create_polygon(&[pt(0.0, 0.0), pt(100.0, 0.0), pt(50.0, 100.0)]);
    assert_eq!(scene.hit_test(pt(50.0, 30.0)), Some(p));
    assert_eq!(scene.hit_test(pt(5.0, 90.0)), None);
}
