//! Identifier types shared across the CAM geometry core

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A stable identifier for a primitive.
///
/// Assigned once at construction and never reused; primitives are immutable
/// once ingested (spec §3.5), so identity never needs to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PrimitiveId(Uuid);

impl PrimitiveId {
    /// Create a new unique id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrimitiveId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PrimitiveId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(PrimitiveId)
    }
}

/// A curve registry identifier.
///
/// Unlike [`PrimitiveId`], registry ids must be strictly increasing and
/// never reused (spec §4.C, P8) so a tie-break between two runs that share a
/// boundary vertex can be resolved by id order. A `Uuid` can't express that,
/// so this is a thin counter newtype instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurveId(u64);

impl CurveId {
    /// Wrap a raw id value. Only [`crate::CurveIdCounter`] should mint new
    /// ids in practice; this is for (de)serialization and tests.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// The raw counter value.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CurveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "curve#{}", self.0)
    }
}

/// Monotonic counter that mints [`CurveId`]s.
#[derive(Debug, Default, Clone)]
pub struct CurveIdCounter(u64);

impl CurveIdCounter {
    pub fn next(&mut self) -> CurveId {
        let id = CurveId(self.0);
        self.0 += 1;
        id
    }

    /// The number of ids minted so far, without minting a new one.
    pub fn peek(&self) -> u64 {
        self.0
    }
}
