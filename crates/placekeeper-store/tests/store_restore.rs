use std::sync::Arc;

use logging::diag::DiagLog;
use placekeeper_store::{PlacementStore, StoreCfg};
use win_winops::{
    Placement, Rect, ShowCmd, ShowState, WindowId,
    ops::{MockWinOps, WinOps},
};

fn at(x: i32, y: i32, show: ShowState) -> Placement {
    Placement {
        normal: Rect::from_xywh(x, y, 800, 600),
        show,
    }
}

fn setup() -> (MockWinOps, Arc<DiagLog>, PlacementStore) {
    let mock = MockWinOps::new();
    let diag = Arc::new(DiagLog::default());
    let store = PlacementStore::new(
        Arc::new(mock.clone()) as Arc<dyn WinOps>,
        diag.clone(),
        StoreCfg::default(),
    );
    (mock, diag, store)
}

fn scan(mock: &MockWinOps, store: &PlacementStore, monitors: u32) {
    store.sweep();
    for w in mock.list_windows() {
        store.save(&w, monitors);
    }
}

fn info(id: WindowId) -> win_winops::WindowInfo {
    MockWinOps::app_window(id)
}

#[test]
fn save_then_restore_reproduces_placement() {
    let (mock, _diag, store) = setup();
    mock.add_window(1, "Notepad", at(10, 20, ShowState::Normal));
    mock.add_window(2, "Explorer", at(30, 40, ShowState::Minimized));
    store.save(&info(1), 3);
    store.save(&info(2), 3);

    mock.move_window(1, at(500, 500, ShowState::Normal));
    mock.move_window(2, at(600, 600, ShowState::Normal));
    assert_eq!(store.restore_all(3), 2);

    assert_eq!(mock.current(1), Some(at(10, 20, ShowState::Normal)));
    assert_eq!(mock.current(2), Some(at(30, 40, ShowState::Minimized)));
    let w2 = mock.writes_for(2);
    assert_eq!(w2.len(), 1);
    assert_eq!(w2[0].cmd, ShowCmd::ShowMinNoActive);
    assert!(w2[0].asynchronous);
}

#[test]
fn restore_is_idempotent() {
    let (mock, _diag, store) = setup();
    mock.add_window(1, "Notepad", at(10, 20, ShowState::Normal));
    store.save(&info(1), 2);
    mock.move_window(1, at(99, 99, ShowState::Normal));

    store.restore_all(2);
    let once = mock.current(1);
    store.restore_all(2);
    assert_eq!(mock.current(1), once);
    assert_eq!(once, Some(at(10, 20, ShowState::Normal)));
}

#[test]
fn maximized_restore_writes_normal_then_maximize() {
    let (mock, _diag, store) = setup();
    mock.add_window(7, "Editor", at(100, 50, ShowState::Maximized));
    store.save(&info(7), 2);
    mock.move_window(7, at(0, 0, ShowState::Normal));

    assert_eq!(store.restore_all(2), 1);
    let writes = mock.writes_for(7);
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].cmd, ShowCmd::ShowNoActivate);
    assert_eq!((writes[0].normal.x(), writes[0].normal.y()), (100, 50));
    assert_eq!(writes[1].cmd, ShowCmd::Maximize);
    assert_eq!((writes[1].normal.x(), writes[1].normal.y()), (100, 50));
    assert_eq!(mock.current(7).map(|p| p.show), Some(ShowState::Maximized));
}

#[test]
fn recycled_handle_with_other_class_is_left_alone() {
    let (mock, _diag, store) = setup();
    mock.add_window(5, "Alpha", at(10, 10, ShowState::Normal));
    store.save(&info(5), 2);
    mock.set_class(5, "Beta");

    assert_eq!(store.restore_all(2), 0);
    assert!(mock.writes().is_empty());
}

#[test]
fn closed_window_is_skipped() {
    let (mock, _diag, store) = setup();
    mock.add_window(5, "Alpha", at(10, 10, ShowState::Normal));
    mock.add_window(6, "Beta", at(20, 20, ShowState::Normal));
    store.save(&info(5), 2);
    store.save(&info(6), 2);
    mock.close_window(5);

    assert_eq!(store.restore_all(2), 1);
    assert!(mock.writes_for(5).is_empty());
    assert_eq!(mock.writes_for(6).len(), 1);
}

#[test]
fn failed_write_is_tolerated() {
    let (mock, _diag, store) = setup();
    mock.add_window(5, "Alpha", at(10, 10, ShowState::Normal));
    store.save(&info(5), 2);
    mock.set_fail_set_placement(true);

    assert_eq!(store.restore_all(2), 0);
    assert!(store.contains(5));
}

#[test]
fn unsaved_slot_and_out_of_range_counts_are_noops() {
    let (mock, _diag, store) = setup();
    mock.add_window(1, "Notepad", at(10, 20, ShowState::Normal));
    store.save(&info(1), 2);

    assert_eq!(store.restore_all(3), 0);
    assert_eq!(store.restore_all(1), 0);
    assert_eq!(store.restore_all(6), 0);
    assert!(mock.writes().is_empty());
}

#[test]
fn save_outside_range_still_refreshes_liveness() {
    let (mock, _diag, store) = setup();
    mock.add_window(1, "Notepad", at(10, 20, ShowState::Normal));
    store.save(&info(1), 2);
    store.sweep();
    store.sweep();
    assert_eq!(store.miss_count(1), Some(2));

    store.save(&info(1), 1);
    assert_eq!(store.miss_count(1), Some(0));
    let rec = store.record(1).unwrap();
    assert_eq!(rec.saved_counts().collect::<Vec<_>>(), vec![2]);
    assert_eq!(rec.slot(2), Some(&at(10, 20, ShowState::Normal)));
}

#[test]
fn diagnostics_record_each_restore_when_enabled() {
    let (mock, diag, store) = setup();
    mock.add_window(0x1A2B, "Notepad", at(10, 20, ShowState::Maximized));
    store.save(&info(0x1A2B), 2);

    store.restore_all(2);
    assert!(diag.is_empty());

    diag.set_enabled(true);
    store.restore_all(2);
    assert_eq!(
        diag.snapshot(),
        "Restored 0x1A2B Notepad: monitors=2; x=10; y=20; show=SW_MAXIMIZE\n"
    );
}

#[test]
fn windows_return_to_their_two_monitor_layout() {
    let (mock, _diag, store) = setup();
    let a = at(0, 0, ShowState::Normal);
    let b = at(1920, 0, ShowState::Normal);
    mock.add_window(0xA, "ClassA", a);
    mock.add_window(0xB, "ClassB", b);

    mock.set_monitors(2);
    scan(&mock, &store, 2);

    // Monitor unplugged: the OS piles everything onto the remaining screen.
    mock.set_monitors(1);
    mock.move_window(0xA, at(0, 0, ShowState::Normal));
    mock.move_window(0xB, at(40, 40, ShowState::Normal));
    scan(&mock, &store, 1);

    mock.set_monitors(2);
    mock.clear_writes();
    assert_eq!(store.restore_all(2), 2);
    assert_eq!(mock.writes_for(0xA).len(), 1);
    assert_eq!(mock.writes_for(0xB).len(), 1);
    assert_eq!(mock.current(0xA), Some(a));
    assert_eq!(mock.current(0xB), Some(b));
}
