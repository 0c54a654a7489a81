//! Curve Registry (spec §4.C)
//!
//! A process-scoped store binding tessellated vertices back to the analytic
//! curve that produced them, so arc reconstruction (§4.E.3) can recover true
//! arcs on an offset result instead of leaving chords. Held as a field of
//! `EngineContext` rather than a global (§9 REDESIGN FLAGS: replace
//! `window.globalCurveRegistry` with an explicit context value).

use cam_core::{CurveId, CurveIdCounter, Point};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Which analytic shape a registry entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CurveVariant {
    Arc,
    Circle,
}

/// Where a registered curve came from during tessellation (spec §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CurveSource {
    EndCap,
    ArcOuter,
    ArcInner,
    ArcEndCap,
    ArcFallback,
}

/// An entry in the curve registry (spec §3.3). Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurveDescriptor {
    pub curve_id: CurveId,
    pub variant: CurveVariant,
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// End-cap entries are always registered with `clockwise = false`
    /// (spec §3.3).
    pub clockwise: bool,
    pub source: CurveSource,
    pub is_offset_derived: bool,
}

/// Observability counters (spec §4.C). Not used for control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegistryStats {
    pub size: usize,
    pub curves_registered: u64,
    pub curves_reconstructed: u64,
    pub curves_lost: u64,
}

/// Binds vertices generated during tessellation/offset to the analytic
/// curve they came from. `register`/`lookup`/`clear` are the only
/// operations spec §4.C names; `record_reconstructed`/`record_lost` back
/// the arc-reconstruction statistics and are called from `offset.rs`.
#[derive(Debug, Default)]
pub struct CurveRegistry {
    entries: IndexMap<CurveId, CurveDescriptor>,
    next_id: CurveIdCounter,
    curves_reconstructed: u64,
    curves_lost: u64,
}

impl CurveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor and returns its monotonically increasing id.
    /// Ids are never reused, even across `clear()` — the counter is not
    /// reset — so a stale id from before a clear is reliably detectable as
    /// stale (spec §4.E.4) rather than silently aliasing a new entry.
    pub fn register(
        &mut self,
        variant: CurveVariant,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
        source: CurveSource,
        is_offset_derived: bool,
    ) -> CurveId {
        let curve_id = self.next_id.next();
        let clockwise = if source == CurveSource::EndCap {
            false
        } else {
            clockwise
        };
        self.entries.insert(
            curve_id,
            CurveDescriptor {
                curve_id,
                variant,
                center,
                radius,
                start_angle,
                end_angle,
                clockwise,
                source,
                is_offset_derived,
            },
        );
        curve_id
    }

    /// Constant-time lookup (backed by `IndexMap`).
    pub fn lookup(&self, curve_id: CurveId) -> Option<&CurveDescriptor> {
        self.entries.get(&curve_id)
    }

    /// All descriptors currently registered, insertion order. Used by arc
    /// recovery (§4.E.3) to test a ring's vertices against every candidate
    /// curve still live in the registry.
    pub fn iter(&self) -> impl Iterator<Item = &CurveDescriptor> {
        self.entries.values()
    }

    /// Empties the registry. The id counter is *not* reset, preserving the
    /// "never reused" guarantee across clears.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.curves_reconstructed = 0;
        self.curves_lost = 0;
    }

    pub fn record_reconstructed(&mut self) {
        self.curves_reconstructed += 1;
    }

    pub fn record_lost(&mut self) {
        self.curves_lost += 1;
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            size: self.entries.len(),
            curves_registered: self.next_id.peek(),
            curves_reconstructed: self.curves_reconstructed,
            curves_lost: self.curves_lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_args() -> (CurveVariant, Point, f64, f64, f64, bool, CurveSource, bool) {
        (
            CurveVariant::Circle,
            Point::new(1.0, 2.0),
            3.0,
            0.0,
            std::f64::consts::TAU,
            true,
            CurveSource::ArcOuter,
            false,
        )
    }

    #[test]
    fn register_returns_strictly_increasing_ids() {
        let mut registry = CurveRegistry::new();
        let (v, c, r, s, e, cw, src, od) = descriptor_args();
        let id1 = registry.register(v, c, r, s, e, cw, src, od);
        let id2 = registry.register(v, c, r, s, e, cw, src, od);
        assert!(id2.as_raw() > id1.as_raw());
    }

    #[test]
    fn end_cap_entries_are_always_ccw() {
        let mut registry = CurveRegistry::new();
        let (v, c, r, s, e, _cw, _src, od) = descriptor_args();
        let id = registry.register(v, c, r, s, e, true, CurveSource::EndCap, od);
        assert!(!registry.lookup(id).unwrap().clockwise);
    }

    #[test]
    fn lookup_of_unknown_id_is_none() {
        let registry = CurveRegistry::new();
        assert!(registry.lookup(CurveId::from_raw(999)).is_none());
    }

    #[test]
    fn clear_empties_entries_but_keeps_id_counter_monotonic() {
        let mut registry = CurveRegistry::new();
        let (v, c, r, s, e, cw, src, od) = descriptor_args();
        let id1 = registry.register(v, c, r, s, e, cw, src, od);
        registry.clear();
        let id2 = registry.register(v, c, r, s, e, cw, src, od);
        assert!(id2.as_raw() > id1.as_raw());
        assert_eq!(registry.stats().size, 1);
    }

    #[test]
    fn stats_track_registered_reconstructed_lost() {
        let mut registry = CurveRegistry::new();
        let (v, c, r, s, e, cw, src, od) = descriptor_args();
        registry.register(v, c, r, s, e, cw, src, od);
        registry.record_reconstructed();
        registry.record_lost();
        let stats = registry.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.curves_registered, 1);
        assert_eq!(stats.curves_reconstructed, 1);
        assert_eq!(stats.curves_lost, 1);
    }
}
