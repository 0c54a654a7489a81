//! Error taxonomy for the CAM geometry core (spec §7).

use thiserror::Error;

/// Result type returned by every fallible CAM geometry operation.
pub type CamResult<T> = Result<T, CamGeometryError>;

/// Errors the CAM geometry core can raise.
///
/// `InvalidPrimitive` is filtered at ingestion (the bad primitive is
/// dropped with a warning, not propagated) — see [`crate::primitives::validate`].
/// `ScaleOverflow`, `EngineMissingFunction`, and `SolverUnavailable` abort the
/// current operation. `OffsetDegenerate` is returned as an empty result, not
/// raised as an error, by `generate_offset` (see §7); the variant still
/// exists here so intermediate helpers can propagate it with `?` before the
/// engine turns it into an empty, non-error result.
#[derive(Error, Debug)]
pub enum CamGeometryError {
    #[error("invalid primitive: {0}")]
    InvalidPrimitive(String),

    #[error("integer scale overflow at scale factor {scale}: coordinate {value} out of range")]
    ScaleOverflow { scale: i64, value: f64 },

    #[error("engine missing function: {0}")]
    EngineMissingFunction(String),

    #[error("offset degenerate: all rings collapsed")]
    OffsetDegenerate,

    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal finding accumulated during a call and returned alongside its
/// result (spec §7: "All warnings are accumulated per-call and returned
/// alongside the result").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export)]
pub enum Warning {
    /// A primitive was dropped at ingestion for failing validation.
    InvalidPrimitiveDropped { reason: String },
    /// The tangency epsilon was out of range and has been clamped.
    TangencyEpsilonClamped { requested: f64, clamped: f64 },
    /// An analytic offset candidate referenced a curve id no longer in the
    /// registry; it fell through to polygonal handling (spec §4.E.4).
    StaleRegistryId { curve_id: u64 },
    /// A primitive's bounds exceeded `EngineConfig::max_coordinate`; it was
    /// still fused, just flagged (spec §6 "primitives with bounds beyond
    /// this are warned").
    CoordinateBoundsExceeded { coordinate: f64, max_coordinate: f64 },
}
