//! Background watcher for host window events.
//!
//! The watcher owns a dedicated thread that
//! - installs an out-of-context WinEvent hook for `EVENT_OBJECT_LOCATIONCHANGE`,
//! - creates a hidden top-level window so it receives the `WM_DISPLAYCHANGE`
//!   broadcast sent when monitors are attached, detached or rearranged,
//! - pumps messages so both of the above are delivered.
//!
//! Callbacks on that thread drop location changes of non-window objects
//! (see [`is_window_move`]) and forward everything else as a [`WatchEvent`]
//! to the sink registered by [`start_watcher`]. Hook delivery is not
//! synchronous with the receiver's loop.

#[cfg(windows)]
mod hook;

use std::{sync::OnceLock, thread::JoinHandle};

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::{CHILDID_SELF, OBJID_WINDOW, Result, WindowId};

/// Events emitted by the watcher thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// An object moved or resized. Only `object_id == OBJID_WINDOW` with
    /// `child_id == CHILDID_SELF` refers to the window itself.
    LocationChanged {
        /// Window the object belongs to (may be null for some objects).
        id: WindowId,
        /// WinEvent object id.
        object_id: i32,
        /// WinEvent child id.
        child_id: i32,
    },
    /// The display configuration changed (`WM_DISPLAYCHANGE`).
    DisplayChanged,
}

/// Where watcher callbacks deliver events; `None` when no watcher runs.
static EVENT_SINK: OnceLock<Mutex<Option<UnboundedSender<WatchEvent>>>> = OnceLock::new();

/// Access the global sink.
fn sink() -> &'static Mutex<Option<UnboundedSender<WatchEvent>>> {
    EVENT_SINK.get_or_init(|| Mutex::new(None))
}

/// Forward an event to the current sink. Never blocks.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn emit(ev: WatchEvent) {
    let mut guard = sink().lock();
    let Some(tx) = guard.as_ref() else { return };
    if tx.send(ev).is_err() {
        // Receiver went away; stop doing work for every hook callback.
        debug!("watcher sink closed");
        *guard = None;
    } else {
        trace!(?ev, "watch_event");
    }
}

/// True when a location-change event refers to a window itself rather than
/// to one of its objects (caret, cursor, scroll bars and the like).
pub fn is_window_move(id: WindowId, object_id: i32, child_id: i32) -> bool {
    id != 0 && object_id == OBJID_WINDOW && child_id == CHILDID_SELF
}

/// Running watcher. Dropping the handle stops the thread and removes the hook.
#[derive(Debug)]
pub struct WatcherHandle {
    /// Native id of the watcher thread, used to post it a quit message.
    thread_id: u32,
    join: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Stop the watcher and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Shared by `stop` and `Drop`.
    fn shutdown(&mut self) {
        let Some(join) = self.join.take() else { return };
        *sink().lock() = None;
        #[cfg(windows)]
        hook::request_quit(self.thread_id);
        if join.join().is_err() {
            debug!("watcher thread panicked during shutdown");
        }
        debug!(thread_id = self.thread_id, "watcher stopped");
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the watcher thread, delivering events to `tx`.
///
/// Returns once the hook and the hidden window are installed, or with the
/// error that prevented installation.
#[cfg(windows)]
pub fn start_watcher(tx: UnboundedSender<WatchEvent>) -> Result<WatcherHandle> {
    *sink().lock() = Some(tx);
    match hook::spawn() {
        Ok((thread_id, join)) => Ok(WatcherHandle {
            thread_id,
            join: Some(join),
        }),
        Err(e) => {
            *sink().lock() = None;
            Err(e)
        }
    }
}

/// Start the watcher thread, delivering events to `tx`.
///
/// There is nothing to watch on this platform.
#[cfg(not(windows))]
pub fn start_watcher(tx: UnboundedSender<WatchEvent>) -> Result<WatcherHandle> {
    drop(tx);
    Err(crate::Error::Unsupported)
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::{WatchEvent, emit, is_window_move, sink};
    use crate::{CHILDID_SELF, OBJID_WINDOW};

    /// `OBJID_CARET`.
    const OBJID_CARET: i32 = -8;
    /// `OBJID_CURSOR`.
    const OBJID_CURSOR: i32 = -9;

    #[test]
    fn emit_forwards_and_clears_closed_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        *sink().lock() = Some(tx);
        emit(WatchEvent::DisplayChanged);
        assert_eq!(rx.try_recv().ok(), Some(WatchEvent::DisplayChanged));

        drop(rx);
        emit(WatchEvent::DisplayChanged);
        assert!(sink().lock().is_none());
    }

    #[test]
    fn only_the_window_object_counts_as_a_move() {
        assert!(is_window_move(0x10, OBJID_WINDOW, CHILDID_SELF));
        assert!(!is_window_move(0, OBJID_WINDOW, CHILDID_SELF));
        assert!(!is_window_move(0x10, OBJID_CARET, CHILDID_SELF));
        assert!(!is_window_move(0x10, OBJID_CURSOR, CHILDID_SELF));
        assert!(!is_window_move(0x10, OBJID_WINDOW, 3));
    }
}
