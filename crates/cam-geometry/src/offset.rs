//! Offset + Arc Reconstructor (spec §4.E)
//!
//! Two distinct code paths, per the analytic/polygonal split already made by
//! [`crate::primitives::Primitive::can_offset_analytically`]:
//!
//! - **Analytic fast path** (§4.E.1): `Circle`, `Rectangle`, `Obround`, and
//!   a stroked `Arc` grow or shrink algebraically and never touch the
//!   integer engine. A `Rectangle`'s outward offset is the one case that
//!   changes shape (sharp corners need rounding), so it returns a `Path`
//!   with an explicit `arcSegments[]` table instead of another `Rectangle`.
//! - **General path** (§4.E.2): tessellate, scale, buffer with `geo-buf`
//!   (`crate::boolean::inflate_path`), de-scale, then recover arcs.
//!
//! `geo`'s coordinates have no side channel for curve identity, so arc
//! recovery (§4.E.3) can't group "vertices sharing a carried curveId" the
//! way the source system's per-vertex `Z`-field hack did — a Minkowski
//! buffer moves every vertex, so [`crate::tessellate::reattach_curve_metadata`]'s
//! spatial match (built for `boolean.rs`'s fold, where most vertices are
//! untouched) doesn't apply here either. Instead, each vertex is tested
//! directly against every curve still live in the registry: does it lie
//! within tolerance of that curve's center at the expected offset radius?
//! Maximal contiguous runs of vertices agreeing on the same curve become the
//! recovered arc. Grounded on `atomCAD-atomCAD/csgrs/src/sketch/offset.rs`'s
//! `geo-buf` wrapping and on `cadhy_cad::projection::Arc2D` for the
//! recovered-arc shape.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use cam_core::{CurveId, Point};

use crate::boolean::{self, PolygonRings};
use crate::config::{EngineConfig, JoinType, TessellationConfig};
use crate::error::{CamGeometryError, CamResult};
use crate::primitives::{Arc, ArcSegment, Circle, Contour, Obround, Path, Primitive, Rectangle, StrokeStyle};
use crate::registry::{CurveDescriptor, CurveRegistry, CurveSource, CurveVariant};
use crate::tessellate;

/// Arc-fit tolerance as a fraction of the target segment length (spec
/// §4.E.3). Default target segment length 0.05 gives τ = 0.0125.
const ARC_FIT_TAU_FACTOR: f64 = 0.25;

// =============================================================================
// ANALYTIC FAST PATHS (spec §4.E.1)
// =============================================================================

/// `Circle` -> `Circle`, radius shrinking or growing by `distance`. Collapses
/// (`Ok(None)`) when the new radius is non-positive (§4.E.4).
pub fn offset_circle(circle: &Circle, distance: f64) -> CamResult<Option<Primitive>> {
    let radius = circle.radius + distance;
    if radius <= 0.0 {
        return Ok(None);
    }
    Ok(Some(Primitive::Circle(Circle::new(circle.center, radius, circle.properties)?)))
}

/// `Obround` -> `Obround`, both dimensions growing by `2 * distance` (the
/// corner radius, `min(w,h)/2`, follows automatically). Collapses when
/// either dimension goes non-positive.
pub fn offset_obround(obround: &Obround, distance: f64) -> CamResult<Option<Primitive>> {
    let width = obround.width + 2.0 * distance;
    let height = obround.height + 2.0 * distance;
    if width <= 0.0 || height <= 0.0 {
        return Ok(None);
    }
    let position = Point::new(obround.position.x - distance, obround.position.y - distance);
    Ok(Some(Primitive::Obround(Obround::new(position, width, height, obround.properties)?)))
}

/// A stroked `Arc` -> `Arc` with the same centerline radius and angles: both
/// boundaries of the annulus move outward by `distance`, so the stroke width
/// simply grows by `2 * distance`. A bare (unstroked) arc has no area to
/// offset at all, matching `boolean::primitive_rings`'s treatment of it as
/// contributing no fusable ring.
pub fn offset_arc(arc: &Arc, distance: f64) -> CamResult<Option<Primitive>> {
    let stroke = match arc.properties.stroke {
        Some(s) => s,
        None => return Err(CamGeometryError::OffsetDegenerate),
    };
    let width = stroke.width + 2.0 * distance;
    if width <= 0.0 {
        return Ok(None);
    }
    let mut properties = arc.properties;
    properties.stroke = Some(StrokeStyle { width });
    Ok(Some(Primitive::Arc(Arc::new(arc.center, arc.radius, arc.start_angle, arc.end_angle, arc.clockwise, properties)?)))
}

/// Four quarter-circle corners plus their connecting straight edges (left
/// implicit between each pair of corner arcs, as with any polygon edge).
/// Ring starts at the bottom-right corner and sweeps CCW.
fn rounded_rectangle_contour(
    origin: Point,
    width: f64,
    height: f64,
    radius: f64,
    tess: &TessellationConfig,
    registry: &mut CurveRegistry,
) -> (Vec<Point>, Vec<ArcSegment>) {
    let n = tessellate::segment_count_for_sweep(radius, FRAC_PI_2, tess).max(2);
    let corners = [
        (Point::new(origin.x + width, origin.y), -FRAC_PI_2),
        (Point::new(origin.x + width, origin.y + height), 0.0),
        (Point::new(origin.x, origin.y + height), FRAC_PI_2),
        (Point::new(origin.x, origin.y), PI),
    ];

    let mut points = Vec::new();
    let mut arc_segments = Vec::new();
    for (center, start_angle) in corners {
        let end_angle = start_angle + FRAC_PI_2;
        let curve_id = registry.register(CurveVariant::Arc, center, radius, start_angle, end_angle, false, CurveSource::ArcOuter, true);
        let start_index = points.len();
        for i in 0..=n {
            let t = i as f64 / n as f64;
            points.push(Point::from_polar(center, radius, start_angle + FRAC_PI_2 * t));
        }
        let end_index = points.len() - 1;
        arc_segments.push(ArcSegment {
            start_index,
            end_index,
            curve_id,
            center,
            radius,
            start_angle,
            end_angle,
            clockwise: false,
        });
    }
    (points, arc_segments)
}

/// `Rectangle` -> `Rectangle` (sharp inward shrink, convex corners need no
/// rounding to offset inward) or `Rectangle` -> `Path` (outward growth,
/// corners rounded to radius `distance`, spec §4.E.1). Collapses when an
/// inward shrink drives either dimension non-positive.
pub fn offset_rectangle(rect: &Rectangle, distance: f64, tess: &TessellationConfig, registry: &mut CurveRegistry) -> CamResult<Option<Primitive>> {
    if distance <= 0.0 {
        let width = rect.width + 2.0 * distance;
        let height = rect.height + 2.0 * distance;
        if width <= 0.0 || height <= 0.0 {
            return Ok(None);
        }
        let origin = Point::new(rect.origin.x - distance, rect.origin.y - distance);
        return Ok(Some(Primitive::Rectangle(Rectangle::new(origin, width, height, rect.properties)?)));
    }

    let (points, arc_segments) = rounded_rectangle_contour(rect.origin, rect.width, rect.height, distance, tess, registry);
    let mut contour = Contour::new(points, false);
    contour.arc_segments = Some(arc_segments);
    Ok(Some(Primitive::Path(Path::new(vec![contour], rect.properties)?)))
}

/// Dispatches to the matching analytic fast path, per
/// `Primitive::can_offset_analytically`. Returns `Ok(None)` if `primitive`
/// isn't analytically offsettable (caller should fall back to
/// [`generate_offset`] after tessellating it into a `Path`) or if the
/// analytic result collapsed.
pub fn offset_analytic(primitive: &Primitive, distance: f64, tess: &TessellationConfig, registry: &mut CurveRegistry) -> CamResult<Option<Primitive>> {
    match primitive {
        Primitive::Circle(c) => offset_circle(c, distance),
        Primitive::Obround(o) => offset_obround(o, distance),
        Primitive::Arc(a) => offset_arc(a, distance),
        Primitive::Rectangle(r) => offset_rectangle(r, distance, tess, registry),
        _ => Ok(None),
    }
}

/// A full-circle ring plus its single `arcSegment`, registered as offset-
/// derived. Mirrors `tessellate::tessellate_circle`'s sampling, but that
/// function always registers with `is_offset_derived: false` (correct for a
/// primitive going *into* a fuse) — the circle coming *out* of an analytic
/// offset needs its own, newly derived registry entry.
fn full_circle_contour(center: Point, radius: f64, tess: &TessellationConfig, registry: &mut CurveRegistry) -> (Vec<Point>, ArcSegment) {
    let n = tessellate::segment_count(radius, tess);
    let curve_id = registry.register(CurveVariant::Circle, center, radius, 0.0, TAU, false, CurveSource::ArcOuter, true);
    let mut points = Vec::with_capacity(n as usize);
    for i in 0..n {
        let t = i as f64 / n as f64;
        points.push(Point::from_polar(center, radius, t * TAU));
    }
    let segment = ArcSegment {
        start_index: 0,
        end_index: points.len() - 1,
        curve_id,
        center,
        radius,
        start_angle: 0.0,
        end_angle: TAU,
        clockwise: false,
    };
    (points, segment)
}

/// Tessellates the result of an analytic offset into the `Path` shape
/// `Engine::generate_offset` always returns, attaching whatever arc metadata
/// the shape carries (a full circle, a rounded rectangle's four corners, an
/// arc's recovered outer/inner/caps). A `Path` result (already the rounded-
/// rectangle case from [`offset_rectangle`]) passes through unchanged.
fn primitive_to_path(primitive: &Primitive, tess: &TessellationConfig, registry: &mut CurveRegistry) -> CamResult<Path> {
    match primitive {
        Primitive::Circle(c) => {
            let (points, segment) = full_circle_contour(c.center, c.radius, tess, registry);
            let mut contour = Contour::new(points, false);
            contour.arc_segments = Some(vec![segment]);
            Path::new(vec![contour], c.properties)
        }
        Primitive::Obround(o) => {
            let ring = tessellate::tessellate_obround(o.position, o.width, o.height, tess, registry);
            Path::new(vec![Contour::new(ring.points, false)], o.properties)
        }
        Primitive::Arc(a) => {
            let width = a.properties.stroke.map(|s| s.width).unwrap_or(0.0);
            let (ring, segments) = tessellate::tessellate_arc_with_width(a.center, a.radius, a.start_angle, a.end_angle, a.clockwise, width, tess, registry);
            let mut contour = Contour::new(ring.points, false);
            contour.arc_segments = Some(segments);
            Path::new(vec![contour], a.properties)
        }
        Primitive::Rectangle(r) => {
            let points = tessellate::tessellate_rectangle(r.origin, r.width, r.height);
            Path::new(vec![Contour::new(points, false)], r.properties)
        }
        Primitive::Path(p) => Ok(p.clone()),
        _ => Err(CamGeometryError::InvalidPrimitive("primitive has no polygonal representation".to_string())),
    }
}

/// Runs `passes` applications of the analytic fast path directly on the
/// original (pre-fuse) primitive, per §4.E.1 ("these paths do not visit the
/// integer engine"). `Ok(None)` means `original` isn't analytically
/// offsettable at all — the caller should fall back to [`generate_offset`]
/// on the tessellated `Path` instead. A pass that collapses the shape
/// entirely (§4.E.4) stops early, records one `curvesLost`, and returns an
/// empty result rather than an error.
pub fn generate_offset_analytic(
    original: &Primitive,
    stepover: f64,
    passes: u32,
    config: &EngineConfig,
    registry: &mut CurveRegistry,
) -> CamResult<Option<Vec<Path>>> {
    if !original.can_offset_analytically() {
        return Ok(None);
    }
    let mut current = original.clone();
    let mut results = Vec::new();
    for _ in 0..passes.max(1) {
        match offset_analytic(&current, stepover, &config.tessellation, registry)? {
            Some(next) => {
                current = next;
                results.push(primitive_to_path(&current, &config.tessellation, registry)?);
            }
            None => {
                registry.record_lost();
                break;
            }
        }
    }
    Ok(Some(results))
}

// =============================================================================
// GENERAL PATH (spec §4.E.2)
// =============================================================================

fn path_to_polygon_rings(path: &Path) -> PolygonRings {
    let mut exterior = Vec::new();
    let mut holes = Vec::new();
    for c in &path.contours {
        if c.is_hole {
            holes.push(c.points.clone());
        } else {
            exterior = c.points.clone();
        }
    }
    PolygonRings { exterior, holes }
}

/// Best-fitting live registry curve for `vertex`, trying both the grown and
/// shrunk expected radius (the local outward-normal sign for a given curve
/// isn't tracked once it's folded into a fused `Path`, so both are tried and
/// the closer one wins, per-vertex).
fn best_fit(vertex: Point, candidates: &[CurveDescriptor], distance: f64, tau: f64) -> Option<CurveId> {
    candidates
        .iter()
        .filter_map(|c| {
            let dist = vertex.distance_to(&c.center);
            [c.radius + distance, c.radius - distance]
                .into_iter()
                .map(|expected| (expected - dist).abs())
                .filter(|err| *err < tau)
                .map(|err| (err, c.curve_id))
                .min_by(|a, b| a.0.total_cmp(&b.0))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

pub(crate) struct Run {
    pub(crate) curve_id: CurveId,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// Maximal contiguous runs of vertices agreeing on the same curve (spec
/// §4.E.3 step 1). A run of length 1 is always rejected (tie-break rule);
/// ambiguity between two candidate curves at a given vertex is resolved
/// already, at `best_fit` time, by picking the closer fit. `pub(crate)` so
/// `boolean::arc_segments_from_metadata` can reuse the same grouping logic
/// on exact-match curve ids instead of re-implementing run detection.
pub(crate) fn group_runs(assignments: &[Option<CurveId>]) -> Vec<Run> {
    let n = assignments.len();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < n {
        match assignments[i] {
            None => i += 1,
            Some(id) => {
                let start = i;
                let mut j = i;
                while j + 1 < n && assignments[j + 1] == Some(id) {
                    j += 1;
                }
                if j > start {
                    runs.push(Run { curve_id: id, start, end: j });
                }
                i = j + 1;
            }
        }
    }
    runs
}

/// Recovers arcs on a single ring's vertices (spec §4.E.3). Confirms each
/// surviving run's fit by re-measuring its actual radius from the matched
/// vertices rather than trusting the expected value used to group it, and
/// records reconstruction stats on `registry` (one `record_reconstructed`
/// per surviving run, one `record_lost` per candidate with no surviving
/// run at all).
fn recover_arcs(points: &[Point], candidates: &[CurveDescriptor], distance: f64, tau: f64, registry: &mut CurveRegistry) -> Vec<ArcSegment> {
    let assignments: Vec<Option<CurveId>> = points.iter().map(|p| best_fit(*p, candidates, distance, tau)).collect();
    let runs = group_runs(&assignments);

    let mut matched = std::collections::HashSet::new();
    let mut segments = Vec::with_capacity(runs.len());
    for run in &runs {
        let candidate = match candidates.iter().find(|c| c.curve_id == run.curve_id) {
            Some(c) => c,
            None => continue,
        };
        let run_points = &points[run.start..=run.end];
        let actual_radius = run_points.iter().map(|p| p.distance_to(&candidate.center)).sum::<f64>() / run_points.len() as f64;
        let start_angle = (run_points[0] - candidate.center).angle();
        let end_angle = (run_points[run_points.len() - 1] - candidate.center).angle();
        segments.push(ArcSegment {
            start_index: run.start,
            end_index: run.end,
            curve_id: candidate.curve_id,
            center: candidate.center,
            radius: actual_radius,
            start_angle,
            end_angle,
            clockwise: candidate.clockwise,
        });
        matched.insert(run.curve_id);
        registry.record_reconstructed();
    }
    for candidate in candidates {
        if !matched.contains(&candidate.curve_id) {
            registry.record_lost();
        }
    }
    segments
}

/// `generate_offset`: tessellate -> scale -> `Inflate` (round join only) ->
/// de-scale -> arc recovery, applied `passes` times at `stepover` each (spec
/// §4.E.2, multi-pass support for deep pocket clearing). Every pass emits
/// its own ring at cumulative distance `k * stepover` rather than only the
/// final one — a caller asking for `passes = 3` gets three concentric
/// results from a single call. Only `JoinType::Round` is implemented,
/// matching `boolean::inflate`'s `geo-buf` backend; any other configured
/// join is [`CamGeometryError::EngineMissingFunction`].
pub fn generate_offset(path: &Path, stepover: f64, passes: u32, config: &EngineConfig, registry: &mut CurveRegistry) -> CamResult<Vec<Path>> {
    if !matches!(config.join, JoinType::Round) {
        return Err(CamGeometryError::EngineMissingFunction(format!("join style {:?} is not implemented by the geo-buf backend", config.join)));
    }
    let passes = passes.max(1);
    let tau = config.tessellation.target_segment_length * ARC_FIT_TAU_FACTOR;

    let mut current = vec![path_to_polygon_rings(path)];
    let mut result = Vec::new();

    for pass in 1..=passes {
        if current.is_empty() {
            break;
        }
        current = boolean::inflate_path(&current, stepover, config.scale)?;

        // Self-intersecting inner offsets (typical of a large inward
        // stepover on a concave boundary) are resolved by folding this
        // pass's result through itself before emitting it (spec §4.E.4).
        // The un-resolved `current` still feeds the next pass's buffer so
        // successive passes keep compounding from the same baseline.
        let mut emitted = current.clone();
        if stepover < 0.0 && !emitted.is_empty() {
            let mut flat = Vec::new();
            for rings in &emitted {
                flat.push(rings.exterior.clone());
                flat.extend(rings.holes.iter().cloned());
            }
            emitted = boolean::union_self(&flat, config.scale, config.fill_rule)?;
        }

        let total_distance = stepover * pass as f64;
        let candidates: Vec<CurveDescriptor> = registry.iter().cloned().collect();

        for rings in emitted {
            // Collapsed entirely: drop, do not emit (§4.E.4).
            if rings.exterior.len() < 3 {
                continue;
            }
            let mut exterior_contour = Contour::new(rings.exterior.clone(), false);
            if config.enable_arc_reconstruction {
                let segments = recover_arcs(&rings.exterior, &candidates, total_distance, tau, registry);
                if !segments.is_empty() {
                    exterior_contour.arc_segments = Some(segments);
                }
            }
            let mut contours = vec![exterior_contour];

            for hole in rings.holes {
                // Collapsed inner ring: drop it, do not emit (§4.E.4).
                if hole.len() < 3 {
                    continue;
                }
                let mut hole_contour = Contour::new(hole.clone(), true);
                if config.enable_arc_reconstruction {
                    let segments = recover_arcs(&hole, &candidates, total_distance, tau, registry);
                    if !segments.is_empty() {
                        hole_contour.arc_segments = Some(segments);
                    }
                }
                contours.push(hole_contour);
            }

            result.push(Path::new(contours, path.properties)?);
        }
    }
    Ok(result)
}
