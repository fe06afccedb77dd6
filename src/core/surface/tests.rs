use crate::core::backend::BackendSurfaceHandle;
use crate::core::ids::{ClientId, SurfaceId};
use crate::core::surface::buffer::{Buffer, BufferFormat};
use crate::core::surface::*;
use crate::util::geometry::{Rect, V2};

fn sid(n: u32) -> SurfaceId {
    SurfaceId(n)
}

fn map_with(ids: &[u32]) -> SurfaceMap {
    let mut map = SurfaceMap::new();
    for &n in ids {
        map.insert(sid(n), Surface::new(BackendSurfaceHandle(n as u64)));
    }
    map
}

fn test_buffer() -> Buffer {
    Buffer {
        format: BufferFormat::Argb8888,
        width: 64,
        height: 64,
        stride: 256,
        client_id: ClientId(0),
    }
}

fn mapped_state() -> SurfaceState {
    SurfaceState {
        buffer: Some(test_buffer()),
        window: Some(WindowState {
            title: "term".into(),
            class: "term".into(),
            geometry: Rect::new(0, 0, 63, 63),
            popup: None,
        }),
        ..Default::default()
    }
}

#[test]
fn test_insert_and_lookup() {
    let map = map_with(&[1]);
    assert!(map.lookup(sid(1)).is_some());
    assert!(map.lookup(sid(2)).is_none());
    assert_eq!(map.root_of(sid(1)), Some(sid(1)));
}

#[test]
fn test_attach_builds_tree() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(2))).unwrap();

    assert_eq!(map.root_of(sid(3)), Some(sid(1)));
    assert_eq!(map.flatten_ids(sid(1)).unwrap(), vec![sid(1), sid(2), sid(3)]);
    // Children attach above their parent.
    assert_eq!(map.flatten_ids(sid(2)).unwrap(), vec![sid(2), sid(3)]);
}

#[test]
fn test_attach_rejects_cycles() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(2))).unwrap();

    assert!(map.attach(sid(1), Some(sid(3))).is_none());
    assert!(map.attach(sid(1), Some(sid(2))).is_none());
    assert!(map.attach(sid(1), Some(sid(1))).is_none());
    // The failed attempts must not have disturbed the tree.
    assert_eq!(map.flatten_ids(sid(1)).unwrap(), vec![sid(1), sid(2), sid(3)]);
}

#[test]
fn test_attach_then_detach_restores_tree() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    let before = map.flatten_ids(sid(1)).unwrap();

    map.attach(sid(3), Some(sid(1))).unwrap();
    map.attach(sid(3), None).unwrap();

    assert_eq!(map.flatten_ids(sid(1)).unwrap(), before);
    assert_eq!(map.root_of(sid(3)), Some(sid(3)));
}

#[test]
fn test_attach_moves_whole_subtree() {
    let mut map = map_with(&[1, 2, 3, 4]);
    map.attach(sid(3), Some(sid(2))).unwrap();
    map.attach(sid(4), Some(sid(3))).unwrap();
    // Splice the 2-3-4 chain under 1 in one move.
    map.attach(sid(2), Some(sid(1))).unwrap();

    assert_eq!(
        map.flatten_ids(sid(1)).unwrap(),
        vec![sid(1), sid(2), sid(3), sid(4)]
    );
    assert_eq!(map.root_of(sid(4)), Some(sid(1)));
}

#[test]
fn test_delete_reroots_children() {
    let mut map = map_with(&[1, 2, 3, 4]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(1))).unwrap();
    map.attach(sid(4), Some(sid(3))).unwrap();

    map.delete(sid(1)).unwrap();

    assert!(map.lookup(sid(1)).is_none());
    // Direct children become their own roots; grandchildren stay attached.
    assert_eq!(map.root_of(sid(2)), Some(sid(2)));
    assert_eq!(map.root_of(sid(3)), Some(sid(3)));
    assert_eq!(map.root_of(sid(4)), Some(sid(3)));
    assert_eq!(map.flatten_ids(sid(3)).unwrap(), vec![sid(3), sid(4)]);
}

#[test]
fn test_delete_absent_is_none() {
    let mut map = map_with(&[1]);
    assert!(map.delete(sid(9)).is_none());
}

#[test]
fn test_resolution_bounded_by_map_size() {
    // A maximally deep chain still resolves within len() hops.
    let ids: Vec<u32> = (1..=16).collect();
    let mut map = map_with(&ids);
    for pair in ids.windows(2) {
        map.attach(sid(pair[1]), Some(sid(pair[0]))).unwrap();
    }
    assert_eq!(map.root_of(sid(16)), Some(sid(1)));
    assert_eq!(map.flatten_ids(sid(1)).unwrap().len(), map.len());
}

#[test]
fn test_flatten_accumulates_offsets() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(2))).unwrap();
    map.set_position(sid(2), V2::new(10, 20)).unwrap();
    map.set_position(sid(3), V2::new(1, 2)).unwrap();

    let flat = map.flatten(V2::new(100, 0), sid(1)).unwrap();
    assert_eq!(
        flat,
        vec![
            (V2::new(100, 0), BackendSurfaceHandle(1)),
            (V2::new(110, 20), BackendSurfaceHandle(2)),
            (V2::new(111, 22), BackendSurfaceHandle(3)),
        ]
    );
}

#[test]
fn test_flatten_draws_below_before_node() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(1))).unwrap();
    map.restack(sid(3), sid(1), false).unwrap();

    assert_eq!(map.flatten_ids(sid(1)).unwrap(), vec![sid(3), sid(1), sid(2)]);
}

#[test]
fn test_restack_above_sibling() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(1))).unwrap();
    assert_eq!(map.flatten_ids(sid(1)).unwrap(), vec![sid(1), sid(2), sid(3)]);

    map.restack(sid(2), sid(3), true).unwrap();
    assert_eq!(map.flatten_ids(sid(1)).unwrap(), vec![sid(1), sid(3), sid(2)]);
}

#[test]
fn test_restack_rejects_non_siblings() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(2))).unwrap();

    // 3 is a grandchild of 1, not a sibling of 2.
    assert_eq!(
        map.restack(sid(2), sid(3), true),
        Err(RestackError::NotSiblings)
    );
    // A root cannot be restacked, and a surface is not its own sibling.
    assert_eq!(
        map.restack(sid(1), sid(2), true),
        Err(RestackError::NotSiblings)
    );
    assert_eq!(
        map.restack(sid(2), sid(2), true),
        Err(RestackError::NotSiblings)
    );
}

#[test]
fn test_restack_reports_unknown_ids() {
    let mut map = map_with(&[1, 2]);
    map.attach(sid(2), Some(sid(1))).unwrap();

    assert_eq!(
        map.restack(sid(9), sid(1), true),
        Err(RestackError::UnknownSurface)
    );
    assert_eq!(
        map.restack(sid(2), sid(9), false),
        Err(RestackError::UnknownSurface)
    );
}

#[test]
fn test_sync_commit_is_cached_until_parent_commit() {
    let mut map = map_with(&[1, 2]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.set_sync(sid(2), true).unwrap();

    let applied = map.commit(sid(2), mapped_state()).unwrap();
    assert!(applied.is_empty());
    assert!(!map.lookup(sid(2)).unwrap().is_mapped());

    // Committing the desynchronized root applies the cached child state.
    let applied = map.commit(sid(1), SurfaceState::default()).unwrap();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[1].sid, sid(2));
    assert!(!applied[1].was_mapped);
    assert!(applied[1].now_mapped);
    assert!(map.lookup(sid(2)).unwrap().is_mapped());
}

#[test]
fn test_sync_is_inherited_from_ancestors() {
    let mut map = map_with(&[1, 2, 3]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.attach(sid(3), Some(sid(2))).unwrap();
    map.set_sync(sid(2), true).unwrap();

    assert!(map.effectively_sync(sid(3)));
    let applied = map.commit(sid(3), mapped_state()).unwrap();
    assert!(applied.is_empty());
}

#[test]
fn test_leaving_sync_applies_cached_state() {
    let mut map = map_with(&[1, 2]);
    map.attach(sid(2), Some(sid(1))).unwrap();
    map.set_sync(sid(2), true).unwrap();
    map.commit(sid(2), mapped_state()).unwrap();

    let applied = map.set_sync(sid(2), false).unwrap();
    assert_eq!(applied.len(), 1);
    assert!(applied[0].now_mapped);
    assert!(map.lookup(sid(2)).unwrap().is_mapped());
}

#[test]
fn test_modify_state() {
    let mut map = map_with(&[1]);
    map.modify_state(sid(1), |state| state.scale = 2).unwrap();
    assert_eq!(map.lookup(sid(1)).unwrap().state.scale, 2);
    assert!(map.modify_state(sid(9), |_| {}).is_none());
}

#[test]
fn test_backend_handles_in_id_order() {
    let map = map_with(&[3, 1, 2]);
    assert_eq!(
        map.backend_handles(),
        vec![
            BackendSurfaceHandle(1),
            BackendSurfaceHandle(2),
            BackendSurfaceHandle(3)
        ]
    );
}
