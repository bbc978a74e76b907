use std::sync::Arc;

use logging::diag::DiagLog;
use placekeeper_store::{PlacementStore, StoreCfg};
use win_winops::{
    Placement, Rect, ShowState,
    ops::{MockWinOps, WinOps},
};

fn setup(cfg: StoreCfg) -> (MockWinOps, PlacementStore) {
    let mock = MockWinOps::new();
    mock.add_window(
        1,
        "Notepad",
        Placement {
            normal: Rect::from_xywh(10, 10, 300, 200),
            show: ShowState::Normal,
        },
    );
    let store = PlacementStore::new(
        Arc::new(mock.clone()) as Arc<dyn WinOps>,
        Arc::new(DiagLog::default()),
        cfg,
    );
    store.save(&MockWinOps::app_window(1), 2);
    (mock, store)
}

#[test]
fn sweep_increments_every_record_once() {
    let (mock, store) = setup(StoreCfg::default());
    mock.add_window(2, "Other", Placement::default());
    store.save(&MockWinOps::app_window(2), 2);
    store.sweep();
    assert_eq!(store.miss_count(1), Some(1));
    assert_eq!(store.miss_count(2), Some(1));
}

#[test]
fn survives_99_misses_and_is_evicted_at_100() {
    let (_mock, store) = setup(StoreCfg::default());
    for _ in 0..99 {
        store.sweep();
    }
    assert!(store.contains(1));
    assert_eq!(store.miss_count(1), Some(99));
    store.sweep();
    assert!(!store.contains(1));
    assert!(store.is_empty());
}

#[test]
fn restored_at_two_misses_skipped_at_three() {
    let (mock, store) = setup(StoreCfg::default());
    store.sweep();
    store.sweep();
    assert_eq!(store.restore_all(2), 1);

    store.sweep();
    mock.clear_writes();
    assert_eq!(store.restore_all(2), 0);
    assert!(mock.writes().is_empty());
    assert!(store.contains(1));
}

#[test]
fn observed_window_resets_miss_count() {
    let (_mock, store) = setup(StoreCfg::default());
    for _ in 0..50 {
        store.sweep();
    }
    store.save(&MockWinOps::app_window(1), 2);
    assert_eq!(store.miss_count(1), Some(0));
}

#[test]
fn thresholds_follow_config() {
    let cfg = StoreCfg {
        stale_threshold: 0,
        eviction_threshold: 3,
        ..StoreCfg::default()
    };
    let (_mock, store) = setup(cfg);
    assert_eq!(store.restore_all(2), 1);
    store.sweep();
    assert_eq!(store.restore_all(2), 0);
    store.sweep();
    assert!(store.contains(1));
    store.sweep();
    assert!(!store.contains(1));
}
