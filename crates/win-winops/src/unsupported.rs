// Stand-in host for targets without a Win32 window manager: nothing to track,
// a single monitor, and every write reports that it is unsupported.

use tracing::trace;

use crate::{Error, Placement, PlacementRequest, Result, WindowId, WindowInfo};

pub(crate) fn list_windows() -> Vec<WindowInfo> {
    trace!("list_windows: unsupported platform");
    Vec::new()
}

pub(crate) fn monitor_count() -> u32 {
    1
}

pub(crate) fn is_window(_id: WindowId) -> bool {
    false
}

pub(crate) fn class_name(_id: WindowId) -> Option<String> {
    None
}

pub(crate) fn placement(_id: WindowId) -> Option<Placement> {
    None
}

pub(crate) fn set_placement(_id: WindowId, _req: &PlacementRequest) -> Result<()> {
    Err(Error::Unsupported)
}
