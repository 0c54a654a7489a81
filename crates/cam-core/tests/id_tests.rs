//! Tests for ID types

use cam_core::{CurveId, CurveIdCounter, PrimitiveId};
use uuid::Uuid;

#[test]
fn primitive_id_new_is_unique() {
    let id1 = PrimitiveId::new();
    let id2 = PrimitiveId::new();
    assert_ne!(id1, id2);
}

#[test]
fn primitive_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = PrimitiveId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), &uuid);
}

#[test]
fn primitive_id_default() {
    let id1 = PrimitiveId::default();
    let id2 = PrimitiveId::default();
    assert_ne!(id1, id2);
}

#[test]
fn primitive_id_display() {
    let id = PrimitiveId::new();
    let display = format!("{}", id);
    assert!(display.contains('-'));
    assert_eq!(display.len(), 36);
}

#[test]
fn primitive_id_clone() {
    let id1 = PrimitiveId::new();
    let id2 = id1;
    assert_eq!(id1, id2);
}

#[test]
fn primitive_id_hash() {
    use std::collections::HashMap;

    let id = PrimitiveId::new();
    let mut map = HashMap::new();
    map.insert(id, "test");
    assert_eq!(map.get(&id), Some(&"test"));
}

#[test]
fn curve_id_counter_is_monotonic_and_never_reused() {
    let mut counter = CurveIdCounter::default();
    let ids: Vec<CurveId> = (0..5).map(|_| counter.next()).collect();
    for pair in ids.windows(2) {
        assert!(pair[1].as_raw() > pair[0].as_raw());
    }
    let unique: std::collections::HashSet<_> = ids.iter().map(CurveId::as_raw).collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn curve_id_display() {
    let id = CurveId::from_raw(7);
    assert_eq!(format!("{}", id), "curve#7");
}
