//! Geometry Utilities (spec §4.B)
//!
//! Pure functions converting analytic/stroked primitives into CCW vertex
//! rings, registering every curved segment with the [`CurveRegistry`] so
//! arc reconstruction (§4.E.3) can later recover true arcs on an offset
//! result. Curve metadata is carried in a side array parallel to the vertex
//! list (`Vec<Option<PointCurveInfo>>`), per the `crate::registry`
//! discipline of keeping provenance out of the geometry type itself (§9
//! REDESIGN FLAGS: per-vertex side-channel metadata as a parallel array
//! indexed by vertex position).

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use cam_core::{normalize_winding, Point, Winding};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::TessellationConfig;
use crate::primitives::{endpoint_to_center, ArcSegment, BezierControlPoints};
use crate::registry::{CurveRegistry, CurveSource, CurveVariant};
use cam_core::CurveId;

/// Per-vertex curve provenance (spec §3.3). `None` for vertices generated
/// by a straight (non-curved) edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PointCurveInfo {
    pub curve_id: CurveId,
    pub segment_index: u32,
    pub total_segments: u32,
    pub t: f64,
    pub is_connection_point: bool,
}

/// A tessellated ring plus its parallel curve-provenance array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TessellatedRing {
    pub points: Vec<Point>,
    pub metadata: Vec<Option<PointCurveInfo>>,
}

impl TessellatedRing {
    fn new() -> Self {
        Self {
            points: Vec::new(),
            metadata: Vec::new(),
        }
    }

    fn push(&mut self, point: Point, info: Option<PointCurveInfo>) {
        self.points.push(point);
        self.metadata.push(info);
    }

    fn extend_skip_first(&mut self, points: Vec<Point>, metadata: Vec<Option<PointCurveInfo>>) {
        for (p, m) in points.into_iter().zip(metadata).skip(1) {
            self.push(p, m);
        }
    }
}

// =============================================================================
// SEGMENT COUNT (spec §4.B)
// =============================================================================

/// `clamp(round(len / L / 8) * 8, min, max)`: the adaptive segment-count
/// formula in terms of an estimated arc length directly, so a caller that
/// already knows the length (an elliptical arc sample, a Bézier's control
/// polygon) doesn't need to back it out of a radius+sweep pair.
pub fn segment_count_for_length(length: f64, config: &TessellationConfig) -> u32 {
    let raw = (length / config.target_segment_length / 8.0).round() * 8.0;
    let n = raw.max(8.0) as u32;
    n.clamp(config.min_segments, config.max_segments)
}

/// `clamp(round(2*pi*r / L / 8) * 8, min, max)` generalized to an arbitrary
/// angular sweep rather than a full circle (`sweep = TAU` recovers the
/// spec's circle formula exactly).
pub fn segment_count_for_sweep(radius: f64, sweep: f64, config: &TessellationConfig) -> u32 {
    segment_count_for_length(radius * sweep.abs(), config)
}

/// Segment count for a full circle of the given radius (spec §4.B).
pub fn segment_count(radius: f64, config: &TessellationConfig) -> u32 {
    segment_count_for_sweep(radius, TAU, config)
}

// =============================================================================
// ANGLE HELPERS
// =============================================================================

fn resolve_sweep_end(start: f64, end: f64, clockwise: bool) -> f64 {
    if !clockwise {
        if end < start {
            end + TAU
        } else {
            end
        }
    } else if end > start {
        end - TAU
    } else {
        end
    }
}

fn arc_points(center: Point, radius: f64, start_angle: f64, end_angle: f64, clockwise: bool, n: u32) -> Vec<Point> {
    let resolved_end = resolve_sweep_end(start_angle, end_angle, clockwise);
    (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let angle = start_angle + (resolved_end - start_angle) * t;
            Point::from_polar(center, radius, angle)
        })
        .collect()
}

/// A semicircular cap: `n + 1` points sweeping from `start_angle` through
/// `base_angle` to `start_angle + 2*(base_angle - start_angle)`. Used for
/// both the caps of a stroked line/polyline and the caps of a stroked arc
/// (spec §4.B); `base_angle` is always exactly `start_angle +- pi/2`, so the
/// arithmetic lands exactly on the antipodal point with no wraparound.
fn cap_points(center: Point, radius: f64, start_angle: f64, base_angle: f64, n: u32) -> Vec<Point> {
    let delta = 2.0 * (base_angle - start_angle);
    (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            Point::from_polar(center, radius, start_angle + delta * t)
        })
        .collect()
}

fn cap_metadata(curve_id: CurveId, n: u32) -> Vec<Option<PointCurveInfo>> {
    (0..=n)
        .map(|i| {
            Some(PointCurveInfo {
                curve_id,
                segment_index: i,
                total_segments: n,
                t: i as f64 / n as f64,
                is_connection_point: i == 0 || i == n,
            })
        })
        .collect()
}

// =============================================================================
// CIRCLE
// =============================================================================

/// Circle -> CCW ring (spec §4.B).
pub fn tessellate_circle(center: Point, radius: f64, config: &TessellationConfig, registry: &mut CurveRegistry) -> TessellatedRing {
    let n = segment_count(radius, config);
    let curve_id = registry.register(
        CurveVariant::Circle,
        center,
        radius,
        0.0,
        TAU,
        false,
        CurveSource::ArcOuter,
        false,
    );
    let mut ring = TessellatedRing::new();
    for i in 0..n {
        let t = i as f64 / n as f64;
        let point = Point::from_polar(center, radius, t * TAU);
        ring.push(
            point,
            Some(PointCurveInfo {
                curve_id,
                segment_index: i,
                total_segments: n,
                t,
                is_connection_point: i == 0,
            }),
        );
    }
    ring
}

// =============================================================================
// PILL (line/obround core, spec §4.B "Line + width" and "Obround")
// =============================================================================

/// A line segment widened into a rounded-cap rectangle ("pill"). Degenerates
/// to a circle when `p0 == p1` (spec §4.B: "Zero-length degenerates to a
/// circle"). Both caps are registered as arcs; their first and last points
/// are marked `is_connection_point` for later merging by a caller stitching
/// adjacent pills into a polyline.
pub fn tessellate_pill(p0: Point, p1: Point, width: f64, config: &TessellationConfig, registry: &mut CurveRegistry) -> TessellatedRing {
    let hw = width / 2.0;
    let dir_vec = p1 - p0;
    if dir_vec.length() < 1e-12 {
        return tessellate_circle(p0, hw, config, registry);
    }
    let dir = dir_vec.normalize();
    let base_angle = dir.angle();
    let cap_n = (segment_count(hw, config) / 2).max(1);

    // End cap, centered at p1: outer side at base-pi/2, inner side at base+pi/2.
    let end_outer_angle = base_angle - FRAC_PI_2;
    let end_cap_id = registry.register(
        CurveVariant::Arc,
        p1,
        hw,
        end_outer_angle,
        end_outer_angle + PI,
        false,
        CurveSource::EndCap,
        false,
    );
    let end_cap_pts = cap_points(p1, hw, end_outer_angle, base_angle, cap_n);
    let end_cap_meta = cap_metadata(end_cap_id, cap_n);

    // Start cap, centered at p0: begins where the top edge arrives (base+pi/2)
    // and sweeps back through -dir to close at the bottom edge (base+3pi/2).
    let start_outer_angle = base_angle + FRAC_PI_2;
    let start_cap_id = registry.register(
        CurveVariant::Arc,
        p0,
        hw,
        start_outer_angle,
        start_outer_angle + PI,
        false,
        CurveSource::EndCap,
        false,
    );
    let reverse_base = base_angle + PI;
    let start_cap_pts = cap_points(p0, hw, start_outer_angle, reverse_base, cap_n);
    let start_cap_meta = cap_metadata(start_cap_id, cap_n);

    let mut ring = TessellatedRing::new();
    ring.push(end_cap_pts[0], end_cap_meta[0]);
    ring.extend_skip_first(end_cap_pts, end_cap_meta);
    ring.extend_skip_first(start_cap_pts, start_cap_meta);
    ring
}

/// Line + width -> rounded-cap rectangle ring (spec §4.B).
pub fn tessellate_line_with_width(p0: Point, p1: Point, width: f64, config: &TessellationConfig, registry: &mut CurveRegistry) -> TessellatedRing {
    tessellate_pill(p0, p1, width, config, registry)
}

/// Obround -> ring: two half-circle caps joined by a connecting rectangle,
/// oriented along the obround's longer axis (spec §4.B, §3.1: corner radius
/// = min(w,h)/2).
pub fn tessellate_obround(position: Point, width: f64, height: f64, config: &TessellationConfig, registry: &mut CurveRegistry) -> TessellatedRing {
    let diameter = width.min(height);
    let hw = diameter / 2.0;
    let (p0, p1) = if width >= height {
        (
            Point::new(position.x + hw, position.y + hw),
            Point::new(position.x + width - hw, position.y + hw),
        )
    } else {
        (
            Point::new(position.x + hw, position.y + hw),
            Point::new(position.x + hw, position.y + height - hw),
        )
    };
    tessellate_pill(p0, p1, diameter, config, registry)
}

// =============================================================================
// POLYLINE + WIDTH (spec §4.B: line rule per segment, miter join clamped to
// 2*halfWidth, bevel beyond that)
// =============================================================================

fn line_intersect(p1: Point, d1: Point, p2: Point, d2: Point) -> Option<Point> {
    let denom = d1.cross(&d2);
    if denom.abs() < 1e-12 {
        return None;
    }
    let diff = p2 - p1;
    let t = diff.cross(&d2) / denom;
    Some(p1 + d1 * t)
}

/// One side (left or right, `side = +-1.0`) of a widened polyline, with a
/// miter join at each interior vertex that falls back to a bevel (the two
/// raw offset endpoints, unjoined) past `2 * half_width` (spec §4.B).
fn offset_side(points: &[Point], hw: f64, side: f64) -> Vec<Point> {
    let n = points.len();
    let perp_at = |i: usize| -> Point {
        let dir = if i == 0 {
            (points[1] - points[0]).normalize()
        } else if i == n - 1 {
            (points[n - 1] - points[n - 2]).normalize()
        } else {
            (points[i] - points[i - 1]).normalize()
        };
        dir.perpendicular() * side
    };

    let mut out = Vec::with_capacity(n);
    out.push(points[0] + perp_at(0) * hw);
    for i in 1..n - 1 {
        let d1 = (points[i] - points[i - 1]).normalize();
        let d2 = (points[i + 1] - points[i]).normalize();
        let n1 = d1.perpendicular() * side;
        let n2 = d2.perpendicular() * side;
        let p1a = points[i - 1] + n1 * hw;
        let p2a = points[i] + n2 * hw;
        match line_intersect(p1a, d1, p2a, d2) {
            Some(miter) if (miter - points[i]).length() <= 2.0 * hw + 1e-9 => out.push(miter),
            _ => {
                // Bevel: two raw offset endpoints instead of one miter point.
                out.push(points[i] + n1 * hw);
                out.push(points[i] + n2 * hw);
            }
        }
    }
    out.push(points[n - 1] + perp_at(n - 1) * hw);
    out
}

/// Polyline + width -> ring (spec §4.B). Delegates to [`tessellate_pill`]
/// for the common two-point case; for longer polylines, builds both offset
/// sides with mitered/beveled interior joins and caps the two ends with
/// semicircles exactly as a single pill would.
pub fn tessellate_polyline_with_width(points: &[Point], width: f64, config: &TessellationConfig, registry: &mut CurveRegistry) -> TessellatedRing {
    assert!(points.len() >= 2, "polyline needs at least two points");
    if points.len() == 2 {
        return tessellate_pill(points[0], points[1], width, config, registry);
    }

    let hw = width / 2.0;
    let left = offset_side(points, hw, 1.0);
    let right = offset_side(points, hw, -1.0);

    let first_dir = (points[1] - points[0]).normalize();
    let last_dir = (points[points.len() - 1] - points[points.len() - 2]).normalize();
    let cap_n = (segment_count(hw, config) / 2).max(1);

    let end_base = last_dir.angle();
    let end_outer_angle = end_base - FRAC_PI_2;
    let end_cap_id = registry.register(
        CurveVariant::Arc,
        points[points.len() - 1],
        hw,
        end_outer_angle,
        end_outer_angle + PI,
        false,
        CurveSource::EndCap,
        false,
    );
    let end_cap_pts = cap_points(points[points.len() - 1], hw, end_outer_angle, end_base, cap_n);
    let end_cap_meta = cap_metadata(end_cap_id, cap_n);

    let start_base = first_dir.angle() + PI;
    let start_outer_angle = first_dir.angle() + FRAC_PI_2;
    let start_cap_id = registry.register(
        CurveVariant::Arc,
        points[0],
        hw,
        start_outer_angle,
        start_outer_angle + PI,
        false,
        CurveSource::EndCap,
        false,
    );
    let start_cap_pts = cap_points(points[0], hw, start_outer_angle, start_base, cap_n);
    let start_cap_meta = cap_metadata(start_cap_id, cap_n);

    let mut ring = TessellatedRing::new();
    // left side, forward, skipping the last point (replaced by the end cap's first point)
    for p in &left[..left.len() - 1] {
        ring.push(*p, None);
    }
    ring.extend_skip_first(end_cap_pts, end_cap_meta);
    // right side, reversed, skipping its last (= start cap's first) point
    for p in right.iter().rev().take(right.len() - 1) {
        ring.push(*p, None);
    }
    ring.extend_skip_first(start_cap_pts, start_cap_meta);
    ring
}

// =============================================================================
// ARC + WIDTH (spec §4.B: outer arc -> end cap -> inner arc (reversed) ->
// start cap, force-closed, with an arcSegments[] table)
// =============================================================================

/// Arc + width -> ring plus the four-entry `arcSegments[]` table (outer
/// arc, end cap, inner arc, start cap), each carrying its registry id,
/// center, radius, angles, and clockwise flag (spec §4.B, §3.4).
#[allow(clippy::too_many_arguments)]
pub fn tessellate_arc_with_width(
    center: Point,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    clockwise: bool,
    width: f64,
    config: &TessellationConfig,
    registry: &mut CurveRegistry,
) -> (TessellatedRing, Vec<ArcSegment>) {
    let hw = width / 2.0;
    let outer_radius = radius + hw;
    let inner_radius = (radius - hw).max(0.0);
    let sweep = resolve_sweep_end(start_angle, end_angle, clockwise) - start_angle;
    let n = segment_count_for_sweep(radius, sweep, config);
    let cap_n = (segment_count(hw, config) / 2).max(1);

    let outer_id = registry.register(
        CurveVariant::Arc,
        center,
        outer_radius,
        start_angle,
        end_angle,
        clockwise,
        CurveSource::ArcOuter,
        false,
    );
    let inner_id = registry.register(
        CurveVariant::Arc,
        center,
        inner_radius,
        start_angle,
        end_angle,
        clockwise,
        CurveSource::ArcInner,
        false,
    );

    let outer_pts = arc_points(center, outer_radius, start_angle, end_angle, clockwise, n);
    let inner_pts = arc_points(center, inner_radius, start_angle, end_angle, clockwise, n);

    let end_base = if clockwise { end_angle - FRAC_PI_2 } else { end_angle + FRAC_PI_2 };
    let end_cap_center = Point::from_polar(center, radius, end_angle);
    let end_cap_id = registry.register(
        CurveVariant::Arc,
        end_cap_center,
        hw,
        end_angle,
        end_angle + PI,
        false,
        CurveSource::ArcEndCap,
        false,
    );
    let end_cap_pts = cap_points(end_cap_center, hw, end_angle, end_base, cap_n);

    let start_base = if clockwise { start_angle + FRAC_PI_2 } else { start_angle - FRAC_PI_2 };
    let start_cap_center = Point::from_polar(center, radius, start_angle);
    let start_cap_id = registry.register(
        CurveVariant::Arc,
        start_cap_center,
        hw,
        start_angle + PI,
        start_angle,
        false,
        CurveSource::ArcEndCap,
        false,
    );
    let start_cap_pts = cap_points(start_cap_center, hw, start_angle + PI, start_base, cap_n);

    let mut ring = TessellatedRing::new();
    let outer_start_idx = 0;
    for (i, p) in outer_pts.iter().enumerate() {
        let t = i as f64 / n as f64;
        ring.push(
            *p,
            Some(PointCurveInfo {
                curve_id: outer_id,
                segment_index: i as u32,
                total_segments: n,
                t,
                is_connection_point: i == 0 || i == outer_pts.len() - 1,
            }),
        );
    }
    let outer_end_idx = ring.points.len() - 1;

    let end_cap_meta = cap_metadata(end_cap_id, cap_n);
    ring.extend_skip_first(end_cap_pts, end_cap_meta);
    let end_cap_end_idx = ring.points.len() - 1;

    let mut inner_rev = inner_pts.clone();
    inner_rev.reverse();
    let inner_start_idx = ring.points.len() - 1;
    for (j, p) in inner_rev.iter().enumerate().skip(1) {
        let i = inner_pts.len() - 1 - j;
        let t = i as f64 / n as f64;
        ring.push(
            *p,
            Some(PointCurveInfo {
                curve_id: inner_id,
                segment_index: i as u32,
                total_segments: n,
                t,
                is_connection_point: j == 1 || j == inner_rev.len() - 1,
            }),
        );
    }
    let inner_end_idx = ring.points.len() - 1;

    let start_cap_meta = cap_metadata(start_cap_id, cap_n);
    ring.extend_skip_first(start_cap_pts, start_cap_meta);
    let start_cap_end_idx = ring.points.len() - 1;

    // Force-close if the last point doesn't coincide with the first within
    // 0.1 * precision (spec §4.B).
    let closure_tol = 0.1 * config.coordinate_precision;
    if let (Some(&first), Some(&last)) = (ring.points.first(), ring.points.last()) {
        if first.distance_to(&last) > closure_tol {
            ring.push(first, ring.metadata[0]);
        }
    }

    let arc_segments = vec![
        ArcSegment {
            start_index: outer_start_idx,
            end_index: outer_end_idx,
            curve_id: outer_id,
            center,
            radius: outer_radius,
            start_angle,
            end_angle,
            clockwise,
        },
        ArcSegment {
            start_index: outer_end_idx,
            end_index: end_cap_end_idx,
            curve_id: end_cap_id,
            center: end_cap_center,
            radius: hw,
            start_angle: end_angle,
            end_angle: end_angle + PI,
            clockwise: false,
        },
        ArcSegment {
            start_index: end_cap_end_idx,
            end_index: inner_end_idx,
            curve_id: inner_id,
            center,
            radius: inner_radius,
            start_angle: end_angle,
            end_angle: start_angle,
            clockwise: !clockwise,
        },
        ArcSegment {
            start_index: inner_end_idx,
            end_index: start_cap_end_idx,
            curve_id: start_cap_id,
            center: start_cap_center,
            radius: hw,
            start_angle: start_angle + PI,
            end_angle: start_angle,
            clockwise: false,
        },
    ];
    let _ = inner_start_idx;

    (ring, arc_segments)
}

/// Rectangle -> CCW ring. No curve metadata: all edges are straight.
pub fn tessellate_rectangle(origin: Point, width: f64, height: f64) -> Vec<Point> {
    vec![
        origin,
        Point::new(origin.x + width, origin.y),
        Point::new(origin.x + width, origin.y + height),
        Point::new(origin.x, origin.y + height),
    ]
}

// =============================================================================
// ELLIPTICAL ARC + WIDTH (spec §3.1: never offset analytically, flattened
// via the SVG endpoint-to-center parameterization then widened like any
// other polyline)
// =============================================================================

/// Samples an SVG-style elliptical arc into a centerline polyline. `None` if
/// the arc is degenerate (coincident endpoints — `endpoint_to_center`
/// already rejects that case).
fn flatten_elliptical_arc(start: Point, end: Point, rx: f64, ry: f64, phi: f64, large_arc: bool, sweep: bool, config: &TessellationConfig) -> Option<Vec<Point>> {
    let (center, theta1, delta_theta) = endpoint_to_center(start, end, rx, ry, phi, large_arc, sweep)?;
    let n = segment_count_for_length(rx.max(ry) * delta_theta.abs(), config);
    let (cos_phi, sin_phi) = (phi.cos(), phi.sin());
    Some(
        (0..=n)
            .map(|i| {
                let t = theta1 + delta_theta * (i as f64 / n as f64);
                let (ct, st) = (t.cos(), t.sin());
                Point::new(
                    center.x + rx * ct * cos_phi - ry * st * sin_phi,
                    center.y + rx * ct * sin_phi + ry * st * cos_phi,
                )
            })
            .collect(),
    )
}

/// `EllipticalArc` + width -> ring (spec §4.B generalized to the elliptical
/// case: flatten the centerline, then widen exactly like any other
/// polyline). `None` when the arc degenerates to a point. Unlike a circular
/// `Arc`, the flattened centerline carries no curve-registry metadata of its
/// own — an ellipse's offset boundary isn't itself a circle, so there's no
/// `(center, radius)` pair for arc reconstruction to recover later; only the
/// stroke's round end caps (registered by `tessellate_polyline_with_width`)
/// carry provenance.
#[allow(clippy::too_many_arguments)]
pub fn tessellate_elliptical_arc_with_width(
    start: Point,
    end: Point,
    rx: f64,
    ry: f64,
    phi: f64,
    large_arc: bool,
    sweep: bool,
    width: f64,
    config: &TessellationConfig,
    registry: &mut CurveRegistry,
) -> Option<TessellatedRing> {
    let centerline = flatten_elliptical_arc(start, end, rx, ry, phi, large_arc, sweep, config)?;
    if centerline.len() < 2 {
        return None;
    }
    Some(tessellate_polyline_with_width(&centerline, width, config, registry))
}

// =============================================================================
// BEZIER + WIDTH (spec §3.1: flattened via De Casteljau subdivision, then
// widened like any other polyline)
// =============================================================================

/// One De Casteljau reduction step: linearly interpolates each adjacent pair
/// in `points` by `t`, shrinking the control polygon by one.
fn de_casteljau_step(points: &[Point], t: f64) -> Vec<Point> {
    points.windows(2).map(|w| w[0] + (w[1] - w[0]) * t).collect()
}

fn bezier_point(control: &[Point], t: f64) -> Point {
    let mut points = control.to_vec();
    while points.len() > 1 {
        points = de_casteljau_step(&points, t);
    }
    points[0]
}

/// Flattens a quadratic or cubic Bézier into a polyline. Segment count is
/// estimated from the control polygon's perimeter — never shorter than the
/// true curve length, so this only ever over-samples, never under-samples.
fn flatten_bezier(cp: &BezierControlPoints, config: &TessellationConfig) -> Vec<Point> {
    let control = cp.points();
    let perimeter: f64 = control.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
    let n = segment_count_for_length(perimeter, config);
    (0..=n).map(|i| bezier_point(&control, i as f64 / n as f64)).collect()
}

/// `Bezier` + width -> ring (spec §4.B generalized to Bézier curves: flatten
/// via De Casteljau subdivision, then widen like any other polyline). `None`
/// when the control polygon collapses to a single point.
pub fn tessellate_bezier_with_width(cp: &BezierControlPoints, width: f64, config: &TessellationConfig, registry: &mut CurveRegistry) -> Option<TessellatedRing> {
    let centerline = flatten_bezier(cp, config);
    if centerline.len() < 2 || centerline.iter().all(|p| centerline[0].distance_to(p) < 1e-12) {
        return None;
    }
    Some(tessellate_polyline_with_width(&centerline, width, config, registry))
}

fn precision_key(p: Point, precision: f64) -> (i64, i64) {
    ((p.x / precision).round() as i64, (p.y / precision).round() as i64)
}

/// Re-associates curve provenance onto a ring produced by a boolean/offset
/// operation, by matching its vertices back to a pre-op vertex+metadata set
/// within `precision`. `geo`'s coordinates carry no side channel for
/// provenance the way the source system's `Z`-field hack did, so survival of
/// curve identity through an operation is recovered spatially instead:
/// vertices the solver left untouched land within `precision` of their
/// pre-op position and pick their metadata back up; brand-new
/// intersection vertices introduced by clipping match nothing and
/// correctly come back `None`.
pub fn reattach_curve_metadata(output_ring: &[Point], source: &[(Point, PointCurveInfo)], precision: f64) -> Vec<Option<PointCurveInfo>> {
    use std::collections::HashMap;
    let mut index: HashMap<(i64, i64), PointCurveInfo> = HashMap::with_capacity(source.len());
    for (p, info) in source {
        index.entry(precision_key(*p, precision)).or_insert(*info);
    }
    output_ring
        .iter()
        .map(|p| index.get(&precision_key(*p, precision)).copied())
        .collect()
}

/// Reverses a ring in place if its signed area is negative (spec §4.B).
/// End caps are always constructed CCW, so they never trigger a reversal.
pub fn normalize_ring_winding(ring: &mut TessellatedRing) {
    let mut tagged: Vec<(Point, Option<PointCurveInfo>)> = ring
        .points
        .iter()
        .copied()
        .zip(ring.metadata.iter().copied())
        .collect();
    let mut points: Vec<Point> = tagged.iter().map(|(p, _)| *p).collect();
    let before = points.clone();
    normalize_winding(&mut points, Winding::CounterClockwise);
    if points != before {
        tagged.reverse();
        ring.points = tagged.iter().map(|(p, _)| *p).collect();
        ring.metadata = tagged.iter().map(|(_, m)| *m).collect();
    }
}
