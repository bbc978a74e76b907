//! Host window-system seam: the [`WinOps`] trait, its Win32-backed
//! implementation and an in-memory mock for tests.

use crate::{
    Placement, PlacementRequest, Result as WinResult, WindowId, WindowInfo, class_name, is_window,
    list_windows, monitor_count, placement, set_placement,
};

/// Trait abstraction over the host window system to improve testability.
pub trait WinOps: Send + Sync {
    /// All top-level windows with their eligibility attributes.
    fn list_windows(&self) -> Vec<WindowInfo>;
    /// Number of connected monitors.
    fn monitor_count(&self) -> u32;
    /// True while `id` refers to a live window.
    fn is_window(&self, id: WindowId) -> bool;
    /// Registered class name of the window.
    fn class_name(&self, id: WindowId) -> Option<String>;
    /// Current placement of the window.
    fn placement(&self, id: WindowId) -> Option<Placement>;
    /// Write a placement. May fail if the window closed in the meantime.
    fn set_placement(&self, id: WindowId, req: &PlacementRequest) -> WinResult<()>;
}

/// Production implementation of WinOps delegating to crate functions.
pub struct RealWinOps;

impl WinOps for RealWinOps {
    fn list_windows(&self) -> Vec<WindowInfo> {
        list_windows()
    }
    fn monitor_count(&self) -> u32 {
        monitor_count()
    }
    fn is_window(&self, id: WindowId) -> bool {
        is_window(id)
    }
    fn class_name(&self, id: WindowId) -> Option<String> {
        class_name(id)
    }
    fn placement(&self, id: WindowId) -> Option<Placement> {
        placement(id)
    }
    fn set_placement(&self, id: WindowId, req: &PlacementRequest) -> WinResult<()> {
        set_placement(id, req)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockWinOps;

/// In-memory window system for tests (enabled with the `test-utils` feature).
#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::{
        collections::{HashMap, HashSet},
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
        },
    };

    use parking_lot::Mutex;

    use super::WinOps;
    use crate::{
        Error, Placement, PlacementRequest, Result as WinResult, WS_OVERLAPPEDWINDOW, WindowId,
        WindowInfo,
    };

    /// Simple mock implementation for tests.
    ///
    /// A window is "live" once it has been given a class with
    /// [`MockWinOps::add_window`] and until [`MockWinOps::close_window`].
    /// Enumeration returns whatever was last set, so a window can be live but
    /// not enumerated (hidden) or enumerated with arbitrary styles.
    #[derive(Clone)]
    pub struct MockWinOps {
        /// Names of calls made, in order.
        calls: Arc<Mutex<Vec<String>>>,
        /// Enumeration result.
        windows: Arc<Mutex<Vec<WindowInfo>>>,
        /// Class name per live window.
        classes: Arc<Mutex<HashMap<WindowId, String>>>,
        /// Current placement per window.
        placements: Arc<Mutex<HashMap<WindowId, Placement>>>,
        /// Windows that no longer exist.
        closed: Arc<Mutex<HashSet<WindowId>>>,
        /// Every placement write, in order.
        writes: Arc<Mutex<Vec<(WindowId, PlacementRequest)>>>,
        monitors: Arc<AtomicU32>,
        /// Number of enumerations performed.
        list_calls: Arc<AtomicUsize>,
        fail_set_placement: Arc<AtomicBool>,
    }

    impl Default for MockWinOps {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockWinOps {
        pub fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                windows: Arc::new(Mutex::new(Vec::new())),
                classes: Arc::new(Mutex::new(HashMap::new())),
                placements: Arc::new(Mutex::new(HashMap::new())),
                closed: Arc::new(Mutex::new(HashSet::new())),
                writes: Arc::new(Mutex::new(Vec::new())),
                monitors: Arc::new(AtomicU32::new(1)),
                list_calls: Arc::new(AtomicUsize::new(0)),
                fail_set_placement: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Attributes of an ordinary framed, visible top-level window.
        pub fn app_window(id: WindowId) -> WindowInfo {
            WindowInfo {
                id,
                visible: true,
                has_parent: false,
                style: WS_OVERLAPPEDWINDOW,
                ex_style: 0,
            }
        }

        /// Create a live, enumerated, eligible window.
        pub fn add_window(&self, id: WindowId, class: &str, placement: Placement) {
            self.closed.lock().remove(&id);
            self.classes.lock().insert(id, class.to_string());
            self.placements.lock().insert(id, placement);
            let mut wins = self.windows.lock();
            wins.retain(|w| w.id != id);
            wins.push(Self::app_window(id));
        }

        /// Replace the enumeration result.
        pub fn set_windows(&self, wins: Vec<WindowInfo>) {
            *self.windows.lock() = wins;
        }

        /// Drop a window from enumeration while keeping it alive.
        pub fn hide_window(&self, id: WindowId) {
            self.windows.lock().retain(|w| w.id != id);
        }

        /// Destroy a window: it disappears from enumeration and stops being live.
        pub fn close_window(&self, id: WindowId) {
            self.hide_window(id);
            self.classes.lock().remove(&id);
            self.closed.lock().insert(id);
        }

        /// Hand an existing handle to a window of a different class.
        pub fn set_class(&self, id: WindowId, class: &str) {
            self.classes.lock().insert(id, class.to_string());
        }

        /// Simulate the user (or the OS) moving a window.
        pub fn move_window(&self, id: WindowId, placement: Placement) {
            self.placements.lock().insert(id, placement);
        }

        pub fn set_monitors(&self, n: u32) {
            self.monitors.store(n, Ordering::SeqCst);
        }

        pub fn set_fail_set_placement(&self, v: bool) {
            self.fail_set_placement.store(v, Ordering::SeqCst);
        }

        /// Current placement held for `id`.
        pub fn current(&self, id: WindowId) -> Option<Placement> {
            self.placements.lock().get(&id).copied()
        }

        /// All placement writes so far.
        pub fn writes(&self) -> Vec<(WindowId, PlacementRequest)> {
            self.writes.lock().clone()
        }

        /// Placement writes addressed to `id`.
        pub fn writes_for(&self, id: WindowId) -> Vec<PlacementRequest> {
            self.writes
                .lock()
                .iter()
                .filter(|(w, _)| *w == id)
                .map(|(_, r)| *r)
                .collect()
        }

        pub fn clear_writes(&self) {
            self.writes.lock().clear();
        }

        /// Number of enumerations (one per scan).
        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub fn calls_contains(&self, s: &str) -> bool {
            self.calls.lock().iter().any(|x| x == s)
        }

        fn note(&self, s: &str) {
            self.calls.lock().push(s.to_string());
        }

        fn live(&self, id: WindowId) -> bool {
            !self.closed.lock().contains(&id) && self.classes.lock().contains_key(&id)
        }
    }

    impl WinOps for MockWinOps {
        fn list_windows(&self) -> Vec<WindowInfo> {
            self.note("list_windows");
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.windows.lock().clone()
        }
        fn monitor_count(&self) -> u32 {
            self.monitors.load(Ordering::SeqCst)
        }
        fn is_window(&self, id: WindowId) -> bool {
            self.live(id)
        }
        fn class_name(&self, id: WindowId) -> Option<String> {
            if !self.live(id) {
                return None;
            }
            self.classes.lock().get(&id).cloned()
        }
        fn placement(&self, id: WindowId) -> Option<Placement> {
            if !self.live(id) {
                return None;
            }
            self.current(id)
        }
        fn set_placement(&self, id: WindowId, req: &PlacementRequest) -> WinResult<()> {
            self.note("set_placement");
            if self.fail_set_placement.load(Ordering::SeqCst) {
                return Err(Error::Os(5));
            }
            if !self.live(id) {
                return Err(Error::WindowGone);
            }
            self.writes.lock().push((id, *req));
            self.placements.lock().insert(
                id,
                Placement {
                    normal: req.normal,
                    show: req.cmd.resulting_state(),
                },
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MockWinOps, WinOps};
    use crate::{Error, Placement, PlacementRequest, Rect, ShowCmd, ShowState};

    fn at(x: i32, y: i32) -> Placement {
        Placement {
            normal: Rect::from_xywh(x, y, 640, 480),
            show: ShowState::Normal,
        }
    }

    #[test]
    fn mock_tracks_liveness_and_class() {
        let mock = MockWinOps::new();
        mock.add_window(0x10, "Notepad", at(0, 0));
        assert!(mock.is_window(0x10));
        assert_eq!(mock.class_name(0x10).as_deref(), Some("Notepad"));

        mock.hide_window(0x10);
        assert!(mock.is_window(0x10), "hidden windows stay alive");
        assert!(mock.list_windows().is_empty());

        mock.close_window(0x10);
        assert!(!mock.is_window(0x10));
        assert_eq!(mock.class_name(0x10), None);
        assert_eq!(mock.placement(0x10), None);
        assert_eq!(mock.list_calls(), 1);
    }

    #[test]
    fn mock_write_updates_placement_and_is_recorded() {
        let mock = MockWinOps::new();
        mock.add_window(0x20, "Edit", at(0, 0));
        let req = PlacementRequest {
            normal: Rect::from_xywh(100, 50, 640, 480),
            cmd: ShowCmd::Maximize,
            asynchronous: true,
        };
        mock.set_placement(0x20, &req).unwrap();
        assert_eq!(mock.writes_for(0x20), vec![req]);
        let now = mock.current(0x20).unwrap();
        assert_eq!(now.normal.x(), 100);
        assert_eq!(now.show, ShowState::Maximized);
        assert!(mock.calls_contains("set_placement"));
    }

    #[test]
    fn mock_write_to_closed_window_fails() {
        let mock = MockWinOps::new();
        mock.add_window(0x30, "Edit", at(0, 0));
        mock.close_window(0x30);
        let err = mock
            .set_placement(0x30, &PlacementRequest::default())
            .unwrap_err();
        assert!(matches!(err, Error::WindowGone));
        assert!(mock.writes().is_empty());
    }
}
