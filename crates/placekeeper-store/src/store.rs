use std::{collections::HashMap, sync::Arc};

use logging::diag::DiagSink;
use parking_lot::Mutex;
use tracing::{debug, info, trace};
use win_winops::{PlacementRequest, ShowCmd, ShowState, WindowId, WindowInfo, ops::WinOps};

use crate::{PlacementRecord, StoreCfg};

/// Thread-safe window placement cache.
///
/// Every operation holds the internal lock for its whole duration, so a
/// restore never observes a half-finished save or sweep.
pub struct PlacementStore {
    /// Host window system.
    ops: Arc<dyn WinOps>,
    /// Destination for restore records.
    diag: Arc<dyn DiagSink>,
    /// Slots and thresholds.
    cfg: StoreCfg,
    /// Records keyed by window handle.
    records: Mutex<HashMap<WindowId, PlacementRecord>>,
}

impl PlacementStore {
    /// Create an empty store.
    pub fn new(ops: Arc<dyn WinOps>, diag: Arc<dyn DiagSink>, cfg: StoreCfg) -> Self {
        Self {
            ops,
            diag,
            cfg,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Active configuration.
    pub fn cfg(&self) -> &StoreCfg {
        &self.cfg
    }

    /// Snapshot the current placement of `window` into the slot for
    /// `monitors`, and mark the window as seen.
    ///
    /// Creates the record on first sight. A monitor count outside the
    /// tracked range still refreshes liveness and class but stores nothing.
    pub fn save(&self, window: &WindowInfo, monitors: u32) {
        let id = window.id;
        let mut records = self.records.lock();
        let class = self.ops.class_name(id);
        let placement = self.ops.placement(id);
        let rec = records.entry(id).or_insert_with(|| {
            trace!(id = format_args!("0x{id:X}"), "new placement record");
            PlacementRecord::new(id, &self.cfg.monitors)
        });
        rec.observe(class);
        let (Some(idx), Some(p)) = (self.cfg.monitors.slot(monitors), placement) else {
            return;
        };
        trace!(
            id = format_args!("0x{id:X}"),
            class = rec.class_name(),
            monitors,
            rect = %p.normal,
            show = ?p.show,
            "saved"
        );
        rec.store(idx, p);
    }

    /// Count a missed scan against every record and evict those that have
    /// reached the eviction threshold.
    ///
    /// Call once before the saves of a full scan.
    pub fn sweep(&self) {
        let limit = self.cfg.eviction_threshold;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, rec| rec.mark_missed() < limit);
        let evicted = before - records.len();
        if evicted > 0 {
            debug!(evicted, remaining = records.len(), "evicted placement records");
        }
    }

    /// Put every present window back to its placement for `monitors`.
    ///
    /// Returns the number of windows whose placement was written.
    pub fn restore_all(&self, monitors: u32) -> usize {
        if !self.cfg.monitors.contains(monitors) {
            debug!(monitors, "no placement slot for monitor count");
            return 0;
        }
        let records = self.records.lock();
        let mut restored = 0;
        for rec in records.values() {
            if rec.is_present(self.cfg.stale_threshold) && self.restore_one(rec, monitors) {
                restored += 1;
            }
        }
        info!(monitors, restored, tracked = records.len(), "restore pass");
        restored
    }

    /// Restore a single record. Returns true if the final write succeeded.
    fn restore_one(&self, rec: &PlacementRecord, monitors: u32) -> bool {
        let id = rec.id();
        let Some(saved) = rec.slot(monitors) else {
            return false;
        };
        if !self.ops.is_window(id) {
            trace!(id = format_args!("0x{id:X}"), "window gone");
            return false;
        }
        match self.ops.class_name(id) {
            Some(c) if c == rec.class_name() => {}
            other => {
                debug!(
                    id = format_args!("0x{id:X}"),
                    expected = rec.class_name(),
                    found = ?other,
                    "handle reused by another window"
                );
                return false;
            }
        }

        let cmd = match saved.show {
            ShowState::Maximized => {
                // Land on the right monitor first; maximizing applies to the
                // monitor the window currently occupies.
                let pre = PlacementRequest {
                    normal: saved.normal,
                    cmd: ShowCmd::ShowNoActivate,
                    asynchronous: true,
                };
                if let Err(e) = self.ops.set_placement(id, &pre) {
                    debug!(id = format_args!("0x{id:X}"), error = %e, "placement write failed");
                }
                ShowCmd::Maximize
            }
            ShowState::Minimized => ShowCmd::ShowMinNoActive,
            ShowState::Normal => ShowCmd::ShowNoActivate,
        };
        let req = PlacementRequest {
            normal: saved.normal,
            cmd,
            asynchronous: true,
        };
        let written = match self.ops.set_placement(id, &req) {
            Ok(()) => true,
            Err(e) => {
                debug!(id = format_args!("0x{id:X}"), error = %e, "placement write failed");
                false
            }
        };
        if self.diag.enabled() {
            self.diag.append(&format!(
                "Restored 0x{id:X} {}: monitors={monitors}; x={}; y={}; show={cmd}",
                rec.class_name(),
                saved.normal.x(),
                saved.normal.y(),
            ));
        }
        written
    }

    /// Number of tracked windows, stale ones included.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Whether a record exists for `id`.
    pub fn contains(&self, id: WindowId) -> bool {
        self.records.lock().contains_key(&id)
    }

    /// Miss count of the record for `id`.
    pub fn miss_count(&self, id: WindowId) -> Option<u32> {
        self.records.lock().get(&id).map(PlacementRecord::miss_count)
    }

    /// Copy of the record for `id`.
    pub fn record(&self, id: WindowId) -> Option<PlacementRecord> {
        self.records.lock().get(&id).cloned()
    }

    /// Copies of all records, ordered by handle.
    pub fn snapshot(&self) -> Vec<PlacementRecord> {
        let mut out: Vec<_> = self.records.lock().values().cloned().collect();
        out.sort_by_key(PlacementRecord::id);
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicUsize, Ordering},
    };

    use logging::diag::DiagLog;
    use win_winops::{
        Placement, PlacementRequest, Rect, Result as WinResult, ShowState, WindowId, WindowInfo,
        ops::{MockWinOps, WinOps},
    };

    use super::PlacementStore;
    use crate::StoreCfg;

    /// Mock host that counts reads made while the store lock is free.
    struct LockWatchOps {
        inner: MockWinOps,
        store: OnceLock<Weak<PlacementStore>>,
        unlocked_reads: AtomicUsize,
    }

    impl LockWatchOps {
        fn check(&self) {
            let store = self.store.get().and_then(Weak::upgrade);
            if store.is_some_and(|s| !s.records.is_locked()) {
                self.unlocked_reads.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl WinOps for LockWatchOps {
        fn list_windows(&self) -> Vec<WindowInfo> {
            self.inner.list_windows()
        }
        fn monitor_count(&self) -> u32 {
            self.inner.monitor_count()
        }
        fn is_window(&self, id: WindowId) -> bool {
            self.check();
            self.inner.is_window(id)
        }
        fn class_name(&self, id: WindowId) -> Option<String> {
            self.check();
            self.inner.class_name(id)
        }
        fn placement(&self, id: WindowId) -> Option<Placement> {
            self.check();
            self.inner.placement(id)
        }
        fn set_placement(&self, id: WindowId, req: &PlacementRequest) -> WinResult<()> {
            self.inner.set_placement(id, req)
        }
    }

    #[test]
    fn host_reads_happen_under_the_store_lock() {
        let mock = MockWinOps::new();
        let p = Placement {
            normal: Rect::from_xywh(40, 40, 640, 480),
            show: ShowState::Normal,
        };
        mock.add_window(7, "Editor", p);
        let ops = Arc::new(LockWatchOps {
            inner: mock.clone(),
            store: OnceLock::new(),
            unlocked_reads: AtomicUsize::new(0),
        });
        let store = Arc::new(PlacementStore::new(
            ops.clone(),
            Arc::new(DiagLog::default()),
            StoreCfg::default(),
        ));
        assert!(ops.store.set(Arc::downgrade(&store)).is_ok());

        store.save(&MockWinOps::app_window(7), 2);
        assert_eq!(store.record(7).and_then(|r| r.slot(2).copied()), Some(p));
        mock.move_window(7, Placement {
            normal: Rect::from_xywh(900, 40, 640, 480),
            show: ShowState::Normal,
        });
        assert_eq!(store.restore_all(2), 1);
        assert_eq!(ops.unlocked_reads.load(Ordering::SeqCst), 0);
    }
}
