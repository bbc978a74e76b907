//! win-winops: Windows window operations for placekeeper.
//!
//! Provides the host boundary the placement cache is built on:
//! - enumeration of top-level windows with the attributes used for tracking
//!   eligibility ([`list_windows`]),
//! - reading and writing a window's placement and class name,
//! - the number of connected monitors,
//! - a background [`watcher`] that turns WinEvent hook callbacks and
//!   `WM_DISPLAYCHANGE` broadcasts into [`watcher::WatchEvent`]s.
//!
//! Everything is reachable through the [`ops::WinOps`] trait so the cache and
//! coordinator can be driven by [`ops::MockWinOps`] in tests. On non-Windows
//! targets the real implementation reports no windows and a single monitor.

mod error;
mod geom;
pub mod ops;
pub mod watcher;
mod window;

#[cfg(windows)]
mod win32;
#[cfg(windows)]
use win32 as sys;

#[cfg(not(windows))]
mod unsupported;
#[cfg(not(windows))]
use unsupported as sys;

pub use error::{Error, Result};
pub use geom::Rect;
pub use window::{
    CHILDID_SELF, OBJID_WINDOW, Placement, PlacementRequest, ShowCmd, ShowState, WindowInfo,
    WS_EX_APPWINDOW, WS_EX_NOACTIVATE, WS_OVERLAPPEDWINDOW,
};

/// Opaque handle to a top-level window (`HWND`).
///
/// Stable for the window's lifetime; the OS may hand the same value to an
/// unrelated window later.
pub type WindowId = isize;

/// Enumerate all top-level windows together with their tracking attributes.
pub fn list_windows() -> Vec<WindowInfo> {
    sys::list_windows()
}

/// Number of display monitors currently attached to the desktop.
pub fn monitor_count() -> u32 {
    sys::monitor_count()
}

/// True while `id` refers to an existing window.
pub fn is_window(id: WindowId) -> bool {
    sys::is_window(id)
}

/// Registered class name of the window, or `None` if it cannot be read.
pub fn class_name(id: WindowId) -> Option<String> {
    sys::class_name(id)
}

/// Current placement of the window, or `None` if the window is gone.
pub fn placement(id: WindowId) -> Option<Placement> {
    sys::placement(id)
}

/// Apply a placement write to the window.
pub fn set_placement(id: WindowId, req: &PlacementRequest) -> Result<()> {
    sys::set_placement(id, req)
}
