use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use logging::diag::{DiagLog, DiagSink};
use parking_lot::Mutex;
use placekeeper_store::PlacementStore;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace};
use win_winops::{WindowId, ops::WinOps, watcher::is_window_move};

use crate::{ControlMsg, KeeperCfg, OneShot, WatchEvent};

/// Timer name for debounced scans.
const SCAN_TIMER: &str = "scan";

/// Timer name for the delayed display-change pass.
const DISPLAY_TIMER: &str = "display";

/// Display bookkeeping.
#[derive(Debug, Default)]
struct DisplayState {
    /// Monitor count as of the last processed display change.
    monitors: u32,
    /// Set while a display change is pending; scans are not armed meanwhile.
    processing: bool,
    /// The pending display change was requested by the user.
    forced: bool,
}

/// Shared coordinator state.
struct Inner {
    /// Host window system.
    ops: Arc<dyn WinOps>,
    /// Diagnostics buffer.
    diag: Arc<DiagLog>,
    /// Placement cache.
    store: PlacementStore,
    /// Debounce timers.
    timers: OneShot,
    /// Delays and thresholds.
    cfg: KeeperCfg,
    /// Recorded monitor count and display-change guard.
    display: Mutex<DisplayState>,
}

/// Scan/restore state machine. Cloning yields another handle to the same
/// coordinator.
///
/// Timer-driven methods spawn tokio tasks and must run inside a runtime.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Build a coordinator over `ops`, writing diagnostics to `diag`.
    pub fn new(ops: Arc<dyn WinOps>, diag: Arc<DiagLog>, cfg: KeeperCfg) -> Self {
        let store = PlacementStore::new(
            Arc::clone(&ops),
            Arc::clone(&diag) as Arc<dyn DiagSink>,
            cfg.store.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                ops,
                diag,
                store,
                timers: OneShot::new(),
                cfg,
                display: Mutex::new(DisplayState::default()),
            }),
        }
    }

    /// The placement cache.
    pub fn store(&self) -> &PlacementStore {
        &self.inner.store
    }

    /// The diagnostics buffer.
    pub fn diag(&self) -> &Arc<DiagLog> {
        &self.inner.diag
    }

    /// Monitor count as of the last processed display change.
    pub fn recorded_monitors(&self) -> u32 {
        self.inner.display.lock().monitors
    }

    /// True while a display change is pending.
    pub fn is_processing_display_change(&self) -> bool {
        self.inner.display.lock().processing
    }

    /// True while a debounced scan is pending.
    pub fn scan_pending(&self) -> bool {
        self.inner.timers.is_armed(SCAN_TIMER)
    }

    /// Record the current monitor count and take the first snapshot.
    pub fn startup(&self) {
        let n = self.inner.ops.monitor_count();
        self.inner.display.lock().monitors = n;
        info!(monitors = n, "startup");
        self.scan_now();
    }

    /// Dispatch a watcher event.
    pub fn handle_event(&self, ev: WatchEvent) {
        match ev {
            WatchEvent::LocationChanged {
                id,
                object_id,
                child_id,
            } => self.on_location_changed(id, object_id, child_id),
            WatchEvent::DisplayChanged => {
                self.on_display_change(false);
            }
        }
    }

    /// A window object moved or resized; schedule a rescan.
    pub fn on_location_changed(&self, id: WindowId, object_id: i32, child_id: i32) {
        if !is_window_move(id, object_id, child_id) {
            return;
        }
        if self.inner.display.lock().processing {
            trace!(id = format_args!("0x{id:X}"), "display change pending; move ignored");
            return;
        }
        let this = self.clone();
        self.inner
            .timers
            .arm(SCAN_TIMER, self.inner.cfg.scan_delay, move || this.scan_now());
    }

    /// The display configuration changed, or the user asked for a restore.
    ///
    /// Returns false if a display change is already pending.
    pub fn on_display_change(&self, forced: bool) -> bool {
        if self.inner.diag.enabled() {
            self.inner.diag.append(if forced {
                "WM_DISPLAYCHANGE (forced)"
            } else {
                "WM_DISPLAYCHANGE"
            });
        }
        {
            let mut d = self.inner.display.lock();
            if d.processing {
                debug!(forced, "display change already pending");
                return false;
            }
            d.processing = true;
            d.forced = forced;
        }
        let this = self.clone();
        self.inner.timers.arm(
            DISPLAY_TIMER,
            self.inner.cfg.display_delay,
            move || this.process_monitors(),
        );
        true
    }

    /// Handle a pending display change: restore if the monitor count
    /// changed (or the change was forced), then record the count and lift
    /// the guard.
    pub fn process_monitors(&self) {
        let n = self.inner.ops.monitor_count();
        let (recorded, forced) = {
            let d = self.inner.display.lock();
            (d.monitors, d.forced)
        };
        if n > 1 && (forced || n != recorded) {
            let restored = self.inner.store.restore_all(n);
            info!(from = recorded, to = n, forced, restored, "display change processed");
        } else {
            debug!(from = recorded, to = n, forced, "display change needs no restore");
        }
        let mut d = self.inner.display.lock();
        d.monitors = n;
        d.processing = false;
        d.forced = false;
    }

    /// Full scan: sweep, then save every eligible window.
    ///
    /// Skipped while the monitor count differs from the recorded one, since
    /// the windows may already have been shuffled by the OS.
    pub fn scan_now(&self) {
        let n = self.inner.ops.monitor_count();
        let recorded = self.inner.display.lock().monitors;
        if n != recorded {
            debug!(monitors = n, recorded, "monitor change not processed yet; scan skipped");
            return;
        }
        if self.inner.diag.enabled() {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            self.inner.diag.append(&format!("@ {secs}: monitors={n}"));
        }
        self.inner.store.sweep();
        let mut saved = 0;
        for w in self.inner.ops.list_windows() {
            if w.is_eligible() {
                self.inner.store.save(&w, n);
                saved += 1;
            }
        }
        trace!(monitors = n, saved, tracked = self.inner.store.len(), "scan");
    }

    /// Flip diagnostics; returns the new state.
    pub fn toggle_diagnostics(&self) -> bool {
        let on = self.inner.diag.toggle();
        info!(enabled = on, "diagnostics");
        on
    }

    /// Apply a control message. Returns false for [`ControlMsg::Shutdown`].
    pub fn handle_control(&self, msg: ControlMsg) -> bool {
        match msg {
            ControlMsg::ToggleDiagnostics => {
                self.toggle_diagnostics();
            }
            ControlMsg::ForceRestore => {
                self.on_display_change(true);
            }
            ControlMsg::Shutdown => return false,
        }
        true
    }

    /// Process watcher events and control messages until shutdown is
    /// requested or the control channel closes.
    pub async fn run(
        &self,
        mut events: UnboundedReceiver<WatchEvent>,
        mut control: UnboundedReceiver<ControlMsg>,
    ) {
        let mut events_open = true;
        loop {
            tokio::select! {
                ev = events.recv(), if events_open => match ev {
                    Some(ev) => self.handle_event(ev),
                    None => {
                        debug!("watcher channel closed");
                        events_open = false;
                    }
                },
                msg = control.recv() => match msg {
                    Some(m) if self.handle_control(m) => {}
                    _ => break,
                },
            }
        }
        self.shutdown().await;
    }

    /// Cancel pending timers.
    pub async fn shutdown(&self) {
        self.inner.timers.clear_async().await;
        info!("coordinator stopped");
    }
}
