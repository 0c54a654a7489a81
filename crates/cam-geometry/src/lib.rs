//! cam-geometry - CAM geometry core for PCB manufacturing toolchains
//!
//! Converts polarity-tagged primitive geometry into fused, analytically-
//! arc-aware offset paths, for a motion layer to turn into toolpaths.
//!
//! # Features
//!
//! - **Primitive Model**: `Circle`, `Rectangle`, `Obround`, `Arc`,
//!   `EllipticalArc`, `Bezier`, `Path`, each with a stable id and a
//!   bounding box computed once at construction.
//! - **Geometry Utilities**: adaptive tessellation of analytic/stroked
//!   shapes into CCW vertex rings, with curve provenance tracked
//!   per-vertex.
//! - **Curve Registry**: binds tessellated vertices back to the analytic
//!   curve that produced them.
//! - **Boolean Engine**: integer-scaled fusion (union/difference/
//!   intersection/xor) over fill-rule-folded ring sets.
//! - **Offset + Arc Reconstructor**: analytic fast paths for simple shapes,
//!   a tessellate-buffer-recover general path for everything else.
//!
//! # Example
//!
//! ```no_run
//! use cam_geometry::{Engine, EngineConfig, FillRule};
//! use cam_geometry::primitives::{Circle, Polarity, Primitive, Properties};
//! use cam_core::Point;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = Engine::new();
//! engine.initialize(EngineConfig::default()).await?;
//!
//! let circle = Primitive::Circle(Circle::new(Point::ZERO, 5.0, Properties::new(Polarity::Dark))?);
//! let fused = engine.fuse(&[circle], FillRule::NonZero).await?.paths;
//! let preprocessed = engine.prepare_offset(&fused).await?;
//! let offset_paths = engine.generate_offset(&preprocessed, 1.0, 1).await?;
//! # let _ = offset_paths;
//! # Ok(())
//! # }
//! ```

pub mod boolean;
pub mod config;
pub mod engine;
pub mod error;
pub mod offset;
pub mod primitives;
pub mod registry;
pub mod tessellate;

pub use boolean::FuseResult;
pub use config::{tessellation, tolerances, EngineConfig, FillRule, JoinType, TangencyStrategy, TessellationConfig};
pub use engine::{Engine, EngineState};
pub use error::{CamGeometryError, CamResult, Warning};
pub use primitives::{
    Arc, ArcSegment, Bezier, BezierControlPoints, Circle, Contour, EllipticalArc, Obround, Path,
    Polarity, Primitive, Properties, Rectangle, StrokeStyle,
};
pub use registry::{CurveDescriptor, CurveRegistry, CurveSource, CurveVariant, RegistryStats};
pub use tessellate::PointCurveInfo;
