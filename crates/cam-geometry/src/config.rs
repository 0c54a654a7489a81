//! Configuration module for cam-geometry
//!
//! Centralizes the tolerance values and defaults used by tessellation, the
//! boolean engine, and offset generation, plus named presets in place of
//! hardcoded literals scattered through the codebase.
//!
//! # Usage
//!
//! ```rust
//! use cam_geometry::config::{EngineConfig, TessellationConfig};
//!
//! // Use defaults
//! let engine = EngineConfig::default();
//! println!("Default scale: {}", engine.scale);
//!
//! // Or pick a preset
//! let precise = EngineConfig::high_precision();
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// FILL RULE / JOIN / TANGENCY ENUMS
// =============================================================================

/// Fill rule applied by the boolean engine when resolving overlapping rings
/// into positive/negative regions (spec §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FillRule {
    EvenOdd,
    #[default]
    NonZero,
    Positive,
}

/// Join style used when generating an offset (spec §4.E.2). `Round` is the
/// only join the `geo-buf`-backed solver implements; requesting another
/// surfaces as [`crate::error::CamGeometryError::EngineMissingFunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JoinType {
    #[default]
    Round,
    Miter,
    Bevel,
}

/// How the boolean engine treats contours that are near-touching rather than
/// strictly overlapping (spec §4.D "Tangency policy").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TangencyStrategy {
    /// Treat near-touching contours as distinct; no merging.
    None,
    /// Merge contours within `tangency_epsilon` of one another.
    #[default]
    Merge,
    /// Keep contours distinct but record the adjacency for callers.
    Keep,
}

// =============================================================================
// TESSELLATION CONFIGURATION
// =============================================================================

/// Configuration for tessellating analytic/stroked shapes into vertex rings
/// (spec §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TessellationConfig {
    /// Target chord length used by the adaptive segment-count formula.
    /// Default: 0.05
    pub target_segment_length: f64,

    /// Lower clamp on segment count. Always rounded up to a multiple of 8.
    /// Default: 8
    pub min_segments: u32,

    /// Upper clamp on segment count.
    /// Default: 512
    pub max_segments: u32,

    /// General vertex-identity threshold, in caller units.
    /// Default: 0.001
    pub coordinate_precision: f64,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            target_segment_length: 0.05,
            min_segments: 8,
            max_segments: 512,
            coordinate_precision: 0.001,
        }
    }
}

impl TessellationConfig {
    /// Finer adaptive tessellation for high-precision fusion/offset work.
    pub const FINE: Self = Self {
        target_segment_length: 0.01,
        min_segments: 16,
        max_segments: 1024,
        coordinate_precision: 0.0005,
    };

    /// Coarser tessellation for fast interactive previews.
    pub const COARSE: Self = Self {
        target_segment_length: 0.2,
        min_segments: 8,
        max_segments: 128,
        coordinate_precision: 0.005,
    };
}

// =============================================================================
// ENGINE CONFIGURATION
// =============================================================================

/// Clamp a requested scale factor into the supported integer range
/// (spec §4.D).
pub fn clamp_scale(requested: i64) -> i64 {
    requested.clamp(1_000, 1_000_000)
}

/// Clamp a requested tangency epsilon into the supported integer range
/// (spec §4.D / §6).
pub fn clamp_tangency_epsilon(requested: i64) -> i64 {
    requested.clamp(10, 1000)
}

/// Configuration for the boolean engine, its integer scaling, and offset
/// generation (spec §4.D, §4.E, §6 "Configuration option catalogue").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed-point scale factor, clamped to `[1_000, 1_000_000]`.
    /// Default: 10 000
    pub scale: i64,

    /// Segment count used for a unit circle when adaptive tessellation is
    /// not applicable.
    /// Default: 64
    pub polygon_resolution: u32,

    /// Whether arc provenance is registered and carried through fusion.
    /// Default: true
    pub preserve_arcs: bool,

    /// Whether `generate_offset` attempts arc recovery on the result ring.
    /// Default: true
    pub enable_arc_reconstruction: bool,

    /// How near-touching contours are handled during fusion.
    pub tangency_strategy: TangencyStrategy,

    /// Integer-scale tangency tolerance, clamped to `[10, 1000]`.
    /// Default: `scale * 0.0003`
    pub tangency_epsilon: i64,

    /// Validation threshold: primitives whose bounds exceed this emit a
    /// warning rather than being rejected outright.
    /// Default: 1000.0
    pub max_coordinate: f64,

    /// Fill rule passed through to the solver.
    pub fill_rule: FillRule,

    /// Offset join policy.
    pub join: JoinType,

    /// Offset miter limit, expressed as a multiple of the offset distance.
    /// Default: 2.0
    pub miter_limit: f64,

    /// Tessellation tunables used internally by `fuse`/`generate_offset`.
    pub tessellation: TessellationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let scale = 10_000;
        Self {
            scale,
            polygon_resolution: 64,
            preserve_arcs: true,
            enable_arc_reconstruction: true,
            tangency_strategy: TangencyStrategy::Merge,
            tangency_epsilon: clamp_tangency_epsilon((scale as f64 * 0.0003) as i64),
            max_coordinate: 1000.0,
            fill_rule: FillRule::NonZero,
            join: JoinType::Round,
            miter_limit: 2.0,
            tessellation: TessellationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// High precision configuration: finer scale and tessellation, tighter
    /// tangency handling. For production fusion/offset passes.
    pub fn high_precision() -> Self {
        Self {
            scale: clamp_scale(100_000),
            tessellation: TessellationConfig::FINE,
            ..Default::default()
        }
    }

    /// Fast preview configuration: coarser scale and tessellation, for
    /// interactive work.
    pub fn preview() -> Self {
        Self {
            scale: clamp_scale(1_000),
            tessellation: TessellationConfig::COARSE,
            ..Default::default()
        }
    }
}

// =============================================================================
// CONVENIENCE CONSTANTS
// =============================================================================

/// Common tolerance constants for direct use without constructing a full
/// [`EngineConfig`].
pub mod tolerances {
    /// Default fixed-point scale factor.
    pub const DEFAULT_SCALE: i64 = 10_000;

    /// Minimum allowed scale factor.
    pub const MIN_SCALE: i64 = 1_000;

    /// Maximum allowed scale factor.
    pub const MAX_SCALE: i64 = 1_000_000;

    /// Minimum allowed tangency epsilon (integer scale units).
    pub const MIN_TANGENCY_EPSILON: i64 = 10;

    /// Maximum allowed tangency epsilon (integer scale units).
    pub const MAX_TANGENCY_EPSILON: i64 = 1000;
}

/// Common tessellation constants for direct use.
pub mod tessellation {
    /// Default target segment chord length.
    pub const DEFAULT_TARGET_SEGMENT_LENGTH: f64 = 0.05;

    /// Fine target segment chord length.
    pub const FINE_TARGET_SEGMENT_LENGTH: f64 = 0.01;

    /// Coarse target segment chord length.
    pub const COARSE_TARGET_SEGMENT_LENGTH: f64 = 0.2;

    /// Segment counts are always rounded to a multiple of this value.
    pub const SEGMENT_MULTIPLE: u32 = 8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_clamps_are_already_satisfied() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.scale, clamp_scale(cfg.scale));
        assert_eq!(
            cfg.tangency_epsilon,
            clamp_tangency_epsilon(cfg.tangency_epsilon)
        );
    }

    #[test]
    fn clamp_scale_respects_bounds() {
        assert_eq!(clamp_scale(500), 1_000);
        assert_eq!(clamp_scale(5_000_000), 1_000_000);
        assert_eq!(clamp_scale(50_000), 50_000);
    }

    #[test]
    fn clamp_tangency_epsilon_respects_bounds() {
        assert_eq!(clamp_tangency_epsilon(1), 10);
        assert_eq!(clamp_tangency_epsilon(5000), 1000);
    }

    #[test]
    fn presets_produce_valid_scales() {
        assert_eq!(EngineConfig::high_precision().scale, 100_000);
        assert_eq!(EngineConfig::preview().scale, 1_000);
    }
}
