//! End-to-end scenarios and quantified invariants (spec §8), run through the
//! public `Engine` API rather than any individual module directly.

use cam_core::{signed_area, Point};
use cam_geometry::primitives::{Circle, Obround, Polarity, Primitive, Properties, Rectangle};
use cam_geometry::{Engine, EngineConfig, FillRule};

fn dark_circle(center: Point, radius: f64) -> Primitive {
    Primitive::Circle(Circle::new(center, radius, Properties::new(Polarity::Dark)).unwrap())
}

fn clear_circle(center: Point, radius: f64) -> Primitive {
    Primitive::Circle(Circle::new(center, radius, Properties::new(Polarity::Clear)).unwrap())
}

fn dark_rectangle(origin: Point, width: f64, height: f64) -> Primitive {
    Primitive::Rectangle(Rectangle::new(origin, width, height, Properties::new(Polarity::Dark)).unwrap())
}

fn dark_obround(position: Point, width: f64, height: f64) -> Primitive {
    Primitive::Obround(Obround::new(position, width, height, Properties::new(Polarity::Dark)).unwrap())
}

async fn ready_engine() -> Engine {
    let mut engine = Engine::new();
    engine.initialize(EngineConfig::default()).await.unwrap();
    engine
}

fn assert_p1_winding(path: &cam_geometry::Path) {
    for contour in &path.contours {
        let area = signed_area(&contour.points);
        if contour.is_hole {
            assert!(area < 0.0, "hole contour must wind clockwise (signed area < 0), got {area}");
        } else {
            assert!(area >= 0.0, "outer contour must wind CCW (signed area >= 0), got {area}");
        }
    }
}

fn assert_p2_closure(path: &cam_geometry::Path, tolerance: f64) {
    for contour in &path.contours {
        let first = contour.points.first().unwrap();
        let last = contour.points.last().unwrap();
        let d = ((first.x - last.x).powi(2) + (first.y - last.y).powi(2)).sqrt();
        assert!(d <= tolerance, "ring did not close within tolerance: {d}");
    }
}

/// `Path` itself caches no public `bounds()` accessor — only `Primitive`
/// does, recomputing the stroke expansion at call time — so tests that need
/// a path's bounds go through the enum wrapper.
fn path_bounds(path: &cam_geometry::Path) -> cam_core::BoundingBox {
    Primitive::Path(path.clone()).bounds()
}

// ---------------------------------------------------------------------------
// Scenario 1: two overlapping disks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_overlapping_disks_fuse_into_one_path_with_two_arcs() {
    let mut engine = ready_engine().await;

    let a = dark_circle(Point::new(0.0, 0.0), 1.0);
    let b = dark_circle(Point::new(1.0, 0.0), 1.0);

    let fused = engine.fuse(&[a, b], FillRule::NonZero).await.unwrap().paths;
    assert_eq!(fused.len(), 1);
    let path = &fused[0];
    assert_eq!(path.contours.iter().filter(|c| !c.is_hole).count(), 1);
    assert_p1_winding(path);
    assert_p2_closure(path, 1e-6);

    let bounds = path_bounds(path);
    assert!((bounds.min.x - (-1.0)).abs() < 1e-6);
    assert!((bounds.min.y - (-1.0)).abs() < 1e-6);
    assert!((bounds.max.x - 2.0).abs() < 1e-6);
    assert!((bounds.max.y - 1.0).abs() < 1e-6);

    let outer = path.contours.iter().find(|c| !c.is_hole).unwrap();
    let arc_segments = outer.arc_segments.as_ref().expect("fused disks must carry arc metadata");
    assert_eq!(arc_segments.len(), 2, "expected one surviving arc per disk, got {}", arc_segments.len());
    for seg in arc_segments {
        let sweep = (seg.end_angle - seg.start_angle).abs();
        assert!((3.5..4.5).contains(&sweep), "expected a ~240 degree surviving arc, got {sweep} rad");
    }
}

// ---------------------------------------------------------------------------
// Scenario 2: annulus via difference (dark disk, clear disk)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn annulus_via_fill_rule_difference() {
    let mut engine = ready_engine().await;

    let outer = dark_circle(Point::ZERO, 2.0);
    let inner = clear_circle(Point::ZERO, 1.0);

    let fused = engine.fuse(&[outer, inner], FillRule::NonZero).await.unwrap().paths;
    assert_eq!(fused.len(), 1);
    let path = &fused[0];

    let outer_contours: Vec<_> = path.contours.iter().filter(|c| !c.is_hole).collect();
    let hole_contours: Vec<_> = path.contours.iter().filter(|c| c.is_hole).collect();
    assert_eq!(outer_contours.len(), 1);
    assert_eq!(hole_contours.len(), 1);
    assert_p1_winding(path);

    assert!(outer_contours[0].arc_segments.as_ref().is_some_and(|s| !s.is_empty()), "outer boundary must keep its arc");
    assert!(hole_contours[0].arc_segments.as_ref().is_some_and(|s| !s.is_empty()), "hole boundary must keep its arc");

    let stats = engine.get_arc_reconstruction_stats();
    assert!(stats.curves_registered >= 2);
}

// ---------------------------------------------------------------------------
// Scenario 3: rectangle outward offset rounds corners
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rectangle_outward_offset_gets_four_corner_arcs() {
    let mut engine = ready_engine().await;

    let rect = dark_rectangle(Point::new(0.0, 0.0), 10.0, 5.0);
    let fused = engine.fuse(&[rect], FillRule::NonZero).await.unwrap().paths;
    let preprocessed = engine.prepare_offset(&fused).await.unwrap();
    let offset_paths = engine.generate_offset(&preprocessed, 1.0, 1).await.unwrap();

    assert_eq!(offset_paths.len(), 1);
    let path = &offset_paths[0];
    let arc_count: usize = path
        .contours
        .iter()
        .filter_map(|c| c.arc_segments.as_ref())
        .map(|segs| segs.len())
        .sum();
    assert_eq!(arc_count, 4, "expected four rounded corners, got {arc_count}");

    let bounds = path_bounds(path);
    assert!((bounds.max.x - bounds.min.x - 12.0).abs() < 0.2);
    assert!((bounds.max.y - bounds.min.y - 7.0).abs() < 0.2);
}

// ---------------------------------------------------------------------------
// Scenario 4: trace fusion of two collinear pills
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collinear_pills_fuse_into_one_trace() {
    let mut engine = ready_engine().await;

    let width = 0.2;
    let half = width / 2.0;
    let first = dark_obround(Point::new(0.0, -half), 5.0, width);
    let second = dark_obround(Point::new(5.0, -half), 5.0, width);

    let fused = engine.fuse(&[first, second], FillRule::NonZero).await.unwrap().paths;
    assert_eq!(fused.len(), 1);
    let path = &fused[0];
    assert_eq!(path.contours.iter().filter(|c| !c.is_hole).count(), 1);

    let bounds = path_bounds(path);
    assert!((bounds.max.x - bounds.min.x - 10.0).abs() < 1e-3);
    assert!((bounds.max.y - bounds.min.y - width).abs() < 1e-3);
}

// ---------------------------------------------------------------------------
// Scenario 5: inward collapse
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inward_offset_past_radius_collapses_without_error() {
    let mut engine = ready_engine().await;

    let circle = dark_circle(Point::ZERO, 0.5);
    let fused = engine.fuse(&[circle], FillRule::NonZero).await.unwrap().paths;
    let preprocessed = engine.prepare_offset(&fused).await.unwrap();

    let before = engine.get_arc_reconstruction_stats();
    let offset_paths = engine.generate_offset(&preprocessed, -1.0, 1).await.unwrap();
    assert!(offset_paths.is_empty());

    let after = engine.get_arc_reconstruction_stats();
    assert_eq!(after.curves_lost, before.curves_lost + 1);
}

// ---------------------------------------------------------------------------
// Scenario 6: multi-pass isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_outward_passes_produce_three_concentric_rings() {
    let mut engine = ready_engine().await;

    let circle = dark_circle(Point::ZERO, 1.0);
    let fused = engine.fuse(&[circle], FillRule::NonZero).await.unwrap().paths;
    let preprocessed = engine.prepare_offset(&fused).await.unwrap();

    let offset_paths = engine.generate_offset(&preprocessed, 0.1, 3).await.unwrap();
    assert_eq!(offset_paths.len(), 3, "expected one ring per pass, got {}", offset_paths.len());
    for (path, expected_radius) in offset_paths.iter().zip([1.1, 1.2, 1.3]) {
        assert_eq!(path.contours.len(), 1);
        let arc_segments = path.contours[0].arc_segments.as_ref().unwrap();
        assert_eq!(arc_segments.len(), 1, "expected a single full-circle arc entry");
        assert!(
            (arc_segments[0].radius - expected_radius).abs() < 0.02,
            "expected radius ~{expected_radius}, got {}",
            arc_segments[0].radius
        );
    }
}

// ---------------------------------------------------------------------------
// P7: arc round-trip for a single circle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn arc_round_trip_recovers_grown_radius_and_same_center() {
    let mut engine = ready_engine().await;

    let radius = 3.0;
    let distance = 0.5;
    let circle = dark_circle(Point::new(2.0, -1.0), radius);
    let fused = engine.fuse(&[circle], FillRule::NonZero).await.unwrap().paths;
    let preprocessed = engine.prepare_offset(&fused).await.unwrap();
    let offset_paths = engine.generate_offset(&preprocessed, distance, 1).await.unwrap();

    assert_eq!(offset_paths.len(), 1);
    let segments = offset_paths[0].contours[0].arc_segments.as_ref().unwrap();
    assert_eq!(segments.len(), 1);
    let seg = &segments[0];
    assert!((seg.radius - (radius + distance)).abs() < 0.02);
    assert!((seg.center.x - 2.0).abs() < 1e-6);
    assert!((seg.center.y - (-1.0)).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// P8: registry ids strictly increase, never duplicate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registry_ids_strictly_increase_across_repeated_fuses() {
    let mut engine = ready_engine().await;

    let mut previous_max: Option<u64> = None;
    for i in 0..3 {
        let circle = dark_circle(Point::new(i as f64 * 10.0, 0.0), 1.0);
        let fused = engine.fuse(&[circle], FillRule::NonZero).await.unwrap().paths;
        let preprocessed = engine.prepare_offset(&fused).await.unwrap();
        let offset_paths = engine.generate_offset(&preprocessed, 0.2, 1).await.unwrap();

        let seg = &offset_paths[0].contours[0].arc_segments.as_ref().unwrap()[0];
        let id = seg.curve_id.as_raw();
        if let Some(prev) = previous_max {
            assert!(id > prev, "curve id {id} did not strictly increase past {prev}");
        }
        previous_max = Some(id);
    }
}

// ---------------------------------------------------------------------------
// P6: offset monotonicity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn larger_outward_offset_strictly_contains_smaller_one() {
    let mut engine = ready_engine().await;

    let circle = dark_circle(Point::ZERO, 1.0);
    let fused = engine.fuse(&[circle], FillRule::NonZero).await.unwrap().paths;
    let preprocessed = engine.prepare_offset(&fused).await.unwrap();

    let small = engine.generate_offset(&preprocessed, 0.2, 1).await.unwrap();
    let large = engine.generate_offset(&preprocessed, 0.5, 1).await.unwrap();

    let r_small = small[0].contours[0].arc_segments.as_ref().unwrap()[0].radius;
    let r_large = large[0].contours[0].arc_segments.as_ref().unwrap()[0].radius;
    assert!(r_small < r_large);
}

// ---------------------------------------------------------------------------
// Rounded-rectangle corners are fully finite, distinct registry entries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rounded_rectangle_corners_each_get_a_distinct_curve_id() {
    let mut engine = ready_engine().await;

    let rect = dark_rectangle(Point::new(0.0, 0.0), 4.0, 4.0);
    let fused = engine.fuse(&[rect], FillRule::NonZero).await.unwrap().paths;
    let preprocessed = engine.prepare_offset(&fused).await.unwrap();
    let offset_paths = engine.generate_offset(&preprocessed, 0.5, 1).await.unwrap();

    let segments = offset_paths[0].contours[0].arc_segments.as_ref().unwrap();
    assert_eq!(segments.len(), 4);
    let mut ids: Vec<u64> = segments.iter().map(|s| s.curve_id.as_raw()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4, "each rounded corner must register its own curve id");
}
