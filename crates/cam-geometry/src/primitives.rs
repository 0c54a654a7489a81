//! Primitive Model (spec §3.1, §4.A)
//!
//! A closed set of typed geometric entities, each carrying a stable
//! identifier, a small typed `Properties` record (polarity, stroke, trace
//! flag) in place of a dynamic property bag, a bounding rectangle computed
//! once at construction, and an analytic/offsettable capability exposed
//! through inherent methods rather than a trait object — matching this
//! crate's preference for closed enums with `match`-based capability methods
//! over dynamic dispatch.

use std::f64::consts::TAU;

use cam_core::{BoundingBox, CurveId, Point, PrimitiveId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CamGeometryError, CamResult};

// =============================================================================
// PROPERTIES
// =============================================================================

/// Semantic add/remove label on a primitive (spec §3.2). Used only by the
/// Boolean Engine; orthogonal to winding and to `isHole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Polarity {
    /// Adds material.
    Dark,
    /// Removes material.
    Clear,
}

/// A stroked primitive's width. Widening a zero-area edge into a filled
/// ring is handled in `tessellate`; this is just the stroke attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StrokeStyle {
    pub width: f64,
}

/// Typed property record replacing the source's dynamic property bag.
/// Unknown flags are rejected at ingestion by construction — there is no
/// open-ended map to put them in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Properties {
    pub polarity: Polarity,
    pub stroke: Option<StrokeStyle>,
    pub is_trace: bool,
}

impl Properties {
    pub fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            stroke: None,
            is_trace: false,
        }
    }

    pub fn with_stroke(mut self, width: f64) -> Self {
        self.stroke = Some(StrokeStyle { width });
        self
    }

    pub fn as_trace(mut self) -> Self {
        self.is_trace = true;
        self
    }
}

// =============================================================================
// ARC SEGMENT / CONTOUR (shared shapes, spec §3.1 Path, §3.4, §4.B)
// =============================================================================

/// An index range on a ring that corresponds to a preserved or recovered
/// arc (spec §4.B "arcSegments[] table", §4.E.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArcSegment {
    pub start_index: usize,
    pub end_index: usize,
    pub curve_id: CurveId,
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub clockwise: bool,
}

/// A single ring of a `Path` primitive: ordered points plus optional arc
/// provenance and hole classification (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Contour {
    pub points: Vec<Point>,
    pub arc_segments: Option<Vec<ArcSegment>>,
    pub is_hole: bool,
    pub closed: bool,
}

impl Contour {
    pub fn new(points: Vec<Point>, is_hole: bool) -> Self {
        Self {
            points,
            arc_segments: None,
            is_hole,
            closed: true,
        }
    }

    /// Invariant 1 (§3.2): every contour has ≥3 distinct vertices.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }
}

// =============================================================================
// PRIMITIVE VARIANTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Circle {
    pub id: PrimitiveId,
    pub center: Point,
    pub radius: f64,
    pub properties: Properties,
    bounds: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rectangle {
    pub id: PrimitiveId,
    /// Bottom-left corner.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    pub properties: Properties,
    bounds: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Obround {
    pub id: PrimitiveId,
    /// Bottom-left corner of the bounding rectangle.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub properties: Properties,
    bounds: BoundingBox,
}

impl Obround {
    /// Corner radius, per spec §3.1: `min(w, h) / 2`.
    pub fn corner_radius(&self) -> f64 {
        self.width.min(self.height) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Arc {
    pub id: PrimitiveId,
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub clockwise: bool,
    pub properties: Properties,
    bounds: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EllipticalArc {
    pub id: PrimitiveId,
    pub start: Point,
    pub end: Point,
    pub rx: f64,
    pub ry: f64,
    pub phi: f64,
    pub large_arc: bool,
    pub sweep: bool,
    pub properties: Properties,
    bounds: BoundingBox,
}

/// Ordered control points for a quadratic or cubic Bézier (spec §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BezierControlPoints {
    Quad { p0: Point, p1: Point, p2: Point },
    Cubic { p0: Point, p1: Point, p2: Point, p3: Point },
}

impl BezierControlPoints {
    pub(crate) fn points(&self) -> Vec<Point> {
        match *self {
            BezierControlPoints::Quad { p0, p1, p2 } => vec![p0, p1, p2],
            BezierControlPoints::Cubic { p0, p1, p2, p3 } => vec![p0, p1, p2, p3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bezier {
    pub id: PrimitiveId,
    pub control_points: BezierControlPoints,
    pub properties: Properties,
    bounds: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Path {
    pub id: PrimitiveId,
    pub contours: Vec<Contour>,
    pub properties: Properties,
    bounds: BoundingBox,
}

/// A closed set of geometric entities (spec §3.1). Analytic variants
/// (`Circle`, `Rectangle`, `Obround`, `Arc`) can be offset analytically
/// (§4.E.1); `EllipticalArc` and `Bezier` cannot and must be tessellated
/// first; `Path` is already polygonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Primitive {
    Circle(Circle),
    Rectangle(Rectangle),
    Obround(Obround),
    Arc(Arc),
    EllipticalArc(EllipticalArc),
    Bezier(Bezier),
    Path(Path),
}

impl Primitive {
    pub fn id(&self) -> PrimitiveId {
        match self {
            Primitive::Circle(p) => p.id,
            Primitive::Rectangle(p) => p.id,
            Primitive::Obround(p) => p.id,
            Primitive::Arc(p) => p.id,
            Primitive::EllipticalArc(p) => p.id,
            Primitive::Bezier(p) => p.id,
            Primitive::Path(p) => p.id,
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Primitive::Circle(p) => &p.properties,
            Primitive::Rectangle(p) => &p.properties,
            Primitive::Obround(p) => &p.properties,
            Primitive::Arc(p) => &p.properties,
            Primitive::EllipticalArc(p) => &p.properties,
            Primitive::Bezier(p) => &p.properties,
            Primitive::Path(p) => &p.properties,
        }
    }

    /// Every variant other than `Path` is analytic (spec §3.1).
    pub fn is_analytic(&self) -> bool {
        !matches!(self, Primitive::Path(_))
    }

    /// Capability enum substitute (§9 REDESIGN FLAGS: replace duck-typed
    /// `canOffsetAnalytically` with a pattern match at the offset site).
    /// True for `Circle`, `Rectangle`, `Obround`, `Arc`; false otherwise.
    pub fn can_offset_analytically(&self) -> bool {
        matches!(
            self,
            Primitive::Circle(_) | Primitive::Rectangle(_) | Primitive::Obround(_) | Primitive::Arc(_)
        )
    }

    /// The cached axis-aligned bounding rectangle (spec §4.A), expanded by
    /// half-stroke on each side when the primitive carries a stroke.
    pub fn bounds(&self) -> BoundingBox {
        let (base, stroke) = match self {
            Primitive::Circle(p) => (p.bounds, p.properties.stroke),
            Primitive::Rectangle(p) => (p.bounds, p.properties.stroke),
            Primitive::Obround(p) => (p.bounds, p.properties.stroke),
            Primitive::Arc(p) => (p.bounds, p.properties.stroke),
            Primitive::EllipticalArc(p) => (p.bounds, p.properties.stroke),
            Primitive::Bezier(p) => (p.bounds, p.properties.stroke),
            Primitive::Path(p) => (p.bounds, p.properties.stroke),
        };
        match stroke {
            Some(s) => base.expand(s.width / 2.0),
            None => base,
        }
    }
}

// =============================================================================
// CONSTRUCTORS (spec §4.A: "constructors fail with InvalidPrimitive when
// radius <= 0, width/height <= 0, or any attribute is not finite")
// =============================================================================

fn require_finite(value: f64, what: &str) -> CamResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CamGeometryError::InvalidPrimitive(format!(
            "{what} is not finite: {value}"
        )))
    }
}

fn require_positive(value: f64, what: &str) -> CamResult<()> {
    require_finite(value, what)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(CamGeometryError::InvalidPrimitive(format!(
            "{what} must be positive, got {value}"
        )))
    }
}

fn require_point_finite(p: Point, what: &str) -> CamResult<()> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(CamGeometryError::InvalidPrimitive(format!(
            "{what} has non-finite coordinates: {p:?}"
        )))
    }
}

impl Circle {
    pub fn new(center: Point, radius: f64, properties: Properties) -> CamResult<Self> {
        require_point_finite(center, "circle center")?;
        require_positive(radius, "circle radius")?;
        let bounds = BoundingBox::new(
            Point::new(center.x - radius, center.y - radius),
            Point::new(center.x + radius, center.y + radius),
        );
        Ok(Self {
            id: PrimitiveId::new(),
            center,
            radius,
            properties,
            bounds,
        })
    }
}

impl Rectangle {
    pub fn new(origin: Point, width: f64, height: f64, properties: Properties) -> CamResult<Self> {
        require_point_finite(origin, "rectangle origin")?;
        require_positive(width, "rectangle width")?;
        require_positive(height, "rectangle height")?;
        let bounds = BoundingBox::new(origin, Point::new(origin.x + width, origin.y + height));
        Ok(Self {
            id: PrimitiveId::new(),
            origin,
            width,
            height,
            properties,
            bounds,
        })
    }
}

impl Obround {
    pub fn new(position: Point, width: f64, height: f64, properties: Properties) -> CamResult<Self> {
        require_point_finite(position, "obround position")?;
        require_positive(width, "obround width")?;
        require_positive(height, "obround height")?;
        let bounds = BoundingBox::new(position, Point::new(position.x + width, position.y + height));
        Ok(Self {
            id: PrimitiveId::new(),
            position,
            width,
            height,
            properties,
            bounds,
        })
    }
}

impl Arc {
    pub fn new(
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
        properties: Properties,
    ) -> CamResult<Self> {
        require_point_finite(center, "arc center")?;
        require_positive(radius, "arc radius")?;
        require_finite(start_angle, "arc start_angle")?;
        require_finite(end_angle, "arc end_angle")?;
        if (end_angle - start_angle).abs() > TAU + 1e-9 {
            return Err(CamGeometryError::InvalidPrimitive(format!(
                "arc sweep |{}-{}| exceeds 2*pi",
                end_angle, start_angle
            )));
        }
        let bounds = arc_bounds(center, radius, start_angle, end_angle, clockwise);
        Ok(Self {
            id: PrimitiveId::new(),
            center,
            radius,
            start_angle,
            end_angle,
            clockwise,
            properties,
            bounds,
        })
    }
}

impl EllipticalArc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start: Point,
        end: Point,
        rx: f64,
        ry: f64,
        phi: f64,
        large_arc: bool,
        sweep: bool,
        properties: Properties,
    ) -> CamResult<Self> {
        require_point_finite(start, "elliptical arc start")?;
        require_point_finite(end, "elliptical arc end")?;
        require_positive(rx, "elliptical arc rx")?;
        require_positive(ry, "elliptical arc ry")?;
        require_finite(phi, "elliptical arc phi")?;
        let bounds = elliptical_arc_bounds(start, end, rx, ry, phi, large_arc, sweep);
        Ok(Self {
            id: PrimitiveId::new(),
            start,
            end,
            rx,
            ry,
            phi,
            large_arc,
            sweep,
            properties,
            bounds,
        })
    }
}

impl Bezier {
    pub fn new(control_points: BezierControlPoints, properties: Properties) -> CamResult<Self> {
        for p in control_points.points() {
            require_point_finite(p, "bezier control point")?;
        }
        // A Bezier curve always lies within the convex hull of its control
        // points, so their bbox is a valid (if not tight) enclosure.
        let pts = control_points.points();
        let bounds = BoundingBox::from_points(&pts).expect("non-empty control points");
        Ok(Self {
            id: PrimitiveId::new(),
            control_points,
            properties,
            bounds,
        })
    }
}

impl Path {
    pub fn new(contours: Vec<Contour>, properties: Properties) -> CamResult<Self> {
        let mut all_points = Vec::new();
        for contour in &contours {
            for p in &contour.points {
                require_point_finite(*p, "path contour point")?;
            }
            all_points.extend(contour.points.iter().copied());
        }
        let bounds = BoundingBox::from_points(&all_points).ok_or_else(|| {
            CamGeometryError::InvalidPrimitive("path has no contour points".to_string())
        })?;
        Ok(Self {
            id: PrimitiveId::new(),
            contours,
            properties,
            bounds,
        })
    }

    /// Drops degenerate contours (invariant 1, §3.2) and reports how many
    /// were removed.
    pub fn drop_degenerate_contours(&mut self) -> usize {
        let before = self.contours.len();
        self.contours.retain(|c| !c.is_degenerate());
        before - self.contours.len()
    }
}

// =============================================================================
// BOUNDS HELPERS
// =============================================================================

fn normalize_angle(a: f64) -> f64 {
    let mut a = a % TAU;
    if a < 0.0 {
        a += TAU;
    }
    a
}

/// True if `angle` lies on the sweep from `start` to `end`, direction-aware
/// (spec §4.A: "crossings of the cardinal directions ... tested against the
/// arc's angular sweep (direction-aware)").
fn angle_in_sweep(angle: f64, start: f64, end: f64, clockwise: bool) -> bool {
    let a = normalize_angle(angle);
    let s = normalize_angle(start);
    let e = normalize_angle(end);
    if !clockwise {
        let span = if e < s { e + TAU } else { e } - s;
        let rel = if a < s { a + TAU } else { a } - s;
        rel <= span + 1e-9
    } else {
        let span = s - if e > s { e - TAU } else { e };
        let rel = s - if a > s { a - TAU } else { a };
        rel <= span + 1e-9
    }
}

/// Bounding box of an arc: endpoint box extended by any cardinal direction
/// (0, pi/2, pi, 3pi/2) crossed by the sweep (spec §4.A).
fn arc_bounds(center: Point, radius: f64, start_angle: f64, end_angle: f64, clockwise: bool) -> BoundingBox {
    let start_pt = Point::from_polar(center, radius, start_angle);
    let end_pt = Point::from_polar(center, radius, end_angle);
    let mut bounds = BoundingBox::from_points(&[start_pt, end_pt]).expect("two points");
    for cardinal in [0.0, std::f64::consts::FRAC_PI_2, std::f64::consts::PI, 3.0 * std::f64::consts::FRAC_PI_2] {
        if angle_in_sweep(cardinal, start_angle, end_angle, clockwise) {
            bounds = bounds.union(&BoundingBox::new(
                Point::from_polar(center, radius, cardinal),
                Point::from_polar(center, radius, cardinal),
            ));
        }
    }
    bounds
}

/// Approximate bounding box of an SVG-style elliptical arc via sampling.
/// Not tight, but a safe enclosure; elliptical arcs are never offset
/// analytically (spec §3.1) so precision here only affects validation and
/// coarse culling, not the offset result.
fn elliptical_arc_bounds(
    start: Point,
    end: Point,
    rx: f64,
    ry: f64,
    phi: f64,
    large_arc: bool,
    sweep: bool,
) -> BoundingBox {
    const SAMPLES: usize = 48;
    let mut points = vec![start, end];
    if let Some((center, theta1, delta_theta)) =
        endpoint_to_center(start, end, rx, ry, phi, large_arc, sweep)
    {
        let (cos_phi, sin_phi) = (phi.cos(), phi.sin());
        for i in 0..=SAMPLES {
            let t = theta1 + delta_theta * (i as f64 / SAMPLES as f64);
            let (ct, st) = (t.cos(), t.sin());
            let x = center.x + rx * ct * cos_phi - ry * st * sin_phi;
            let y = center.y + rx * ct * sin_phi + ry * st * cos_phi;
            points.push(Point::new(x, y));
        }
    }
    BoundingBox::from_points(&points).expect("non-empty sample set")
}

/// Standard SVG arc endpoint-to-center parameterization. `pub(crate)` so
/// `tessellate::tessellate_elliptical_arc_with_width` can reuse it to
/// flatten an `EllipticalArc` into a sampled polyline rather than
/// re-deriving the same math.
pub(crate) fn endpoint_to_center(
    start: Point,
    end: Point,
    rx: f64,
    ry: f64,
    phi: f64,
    large_arc: bool,
    sweep: bool,
) -> Option<(Point, f64, f64)> {
    if start == end {
        return None;
    }
    let (cos_phi, sin_phi) = (phi.cos(), phi.sin());
    let dx2 = (start.x - end.x) / 2.0;
    let dy2 = (start.y - end.y) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    let mut rx = rx.abs();
    let mut ry = ry.abs();
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let scale = lambda.sqrt();
        rx *= scale;
        ry *= scale;
    }

    let sign = if large_arc == sweep { -1.0 } else { 1.0 };
    let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
    let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
    let coef = sign * (num.max(0.0) / den).sqrt();
    let cxp = coef * (rx * y1p) / ry;
    let cyp = coef * -(ry * x1p) / rx;

    let cx = cos_phi * cxp - sin_phi * cyp + (start.x + end.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (start.y + end.y) / 2.0;

    let angle_between = |ux: f64, uy: f64, vx: f64, vy: f64| -> f64 {
        let dot = ux * vx + uy * vy;
        let len = ((ux * ux + uy * uy) * (vx * vx + vy * vy)).sqrt();
        let mut angle = (dot / len).clamp(-1.0, 1.0).acos();
        if ux * vy - uy * vx < 0.0 {
            angle = -angle;
        }
        angle
    };

    let theta1 = angle_between(1.0, 0.0, (x1p - cxp) / rx, (y1p - cyp) / ry);
    let mut delta_theta = angle_between(
        (x1p - cxp) / rx,
        (y1p - cyp) / ry,
        (-x1p - cxp) / rx,
        (-y1p - cyp) / ry,
    );
    if !sweep && delta_theta > 0.0 {
        delta_theta -= TAU;
    } else if sweep && delta_theta < 0.0 {
        delta_theta += TAU;
    }

    Some((Point::new(cx, cy), theta1, delta_theta))
}

// =============================================================================
// VALIDATION PASS (spec §9.1 supplement; §7 "InvalidPrimitive filtered at
// ingestion")
// =============================================================================

/// Re-checks a primitive's invariants after construction — for primitives
/// that arrive via deserialization rather than through the constructors
/// above, where finiteness and positivity can't be guaranteed by the type.
/// Returns `Err` so the caller can drop the primitive and emit a warning
/// instead of failing the whole ingestion batch (spec §7).
pub fn validate(primitive: &Primitive) -> CamResult<()> {
    if !primitive.bounds().is_finite() {
        return Err(CamGeometryError::InvalidPrimitive(
            "primitive bounds are not finite".to_string(),
        ));
    }
    match primitive {
        Primitive::Circle(c) => require_positive(c.radius, "circle radius"),
        Primitive::Rectangle(r) => {
            require_positive(r.width, "rectangle width")?;
            require_positive(r.height, "rectangle height")
        }
        Primitive::Obround(o) => {
            require_positive(o.width, "obround width")?;
            require_positive(o.height, "obround height")
        }
        Primitive::Arc(a) => require_positive(a.radius, "arc radius"),
        Primitive::EllipticalArc(e) => {
            require_positive(e.rx, "elliptical arc rx")?;
            require_positive(e.ry, "elliptical arc ry")
        }
        Primitive::Bezier(_) => Ok(()),
        Primitive::Path(p) => {
            if p.contours.iter().all(Contour::is_degenerate) && !p.contours.is_empty() {
                Err(CamGeometryError::InvalidPrimitive(
                    "path has only degenerate contours".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }
}
