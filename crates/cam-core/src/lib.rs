//! # cam-core
//!
//! Kernel-agnostic 2D geometry types and identifiers for the CAM geometry
//! core. Contains no knowledge of primitives, fusion, or offsetting — those
//! live in `cam-geometry`, which depends on this crate.
//!
//! ## Modules
//!
//! - [`point`] - 2D point/vector, bounding boxes, winding
//! - [`id`] - Identifier types (`PrimitiveId`, `CurveId`)

pub mod id;
pub mod point;

pub use id::*;
pub use point::*;
