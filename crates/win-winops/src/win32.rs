//! Win32 implementation of the host calls.

use std::mem;

use tracing::{trace, warn};
use windows_sys::Win32::{
    Foundation::{BOOL, GetLastError, HWND, LPARAM, POINT, RECT},
    UI::WindowsAndMessaging::{
        EnumWindows, GWL_EXSTYLE, GWL_STYLE, GetParent, GetSystemMetrics, GetWindowLongW,
        GetWindowPlacement, IsWindow, IsWindowVisible, RealGetWindowClassW, SM_CMONITORS,
        SetWindowPlacement, WINDOWPLACEMENT, WPF_ASYNCWINDOWPLACEMENT,
    },
};

use crate::{Error, Placement, PlacementRequest, Rect, Result, ShowState, WindowId, WindowInfo};

/// Class names longer than this are truncated; both capture and comparison
/// use the same limit so truncation cannot cause a false mismatch.
const CLASS_NAME_CAP: usize = 256;

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let out = unsafe { &mut *(lparam as *mut Vec<WindowInfo>) };
    let (visible, has_parent, style, ex_style) = unsafe {
        (
            IsWindowVisible(hwnd) != 0,
            GetParent(hwnd) != 0,
            GetWindowLongW(hwnd, GWL_STYLE) as u32,
            GetWindowLongW(hwnd, GWL_EXSTYLE) as u32,
        )
    };
    out.push(WindowInfo {
        id: hwnd,
        visible,
        has_parent,
        style,
        ex_style,
    });
    1
}

pub(crate) fn list_windows() -> Vec<WindowInfo> {
    let mut out: Vec<WindowInfo> = Vec::new();
    let ok = unsafe { EnumWindows(Some(collect_window), &mut out as *mut Vec<WindowInfo> as LPARAM) };
    if ok == 0 {
        warn!("list_windows: EnumWindows failed: code {}", unsafe {
            GetLastError()
        });
    }
    trace!(count = out.len(), "list_windows");
    out
}

pub(crate) fn monitor_count() -> u32 {
    let n = unsafe { GetSystemMetrics(SM_CMONITORS) };
    n.max(0) as u32
}

pub(crate) fn is_window(id: WindowId) -> bool {
    unsafe { IsWindow(id) != 0 }
}

pub(crate) fn class_name(id: WindowId) -> Option<String> {
    let mut buf = [0u16; CLASS_NAME_CAP];
    let len = unsafe { RealGetWindowClassW(id, buf.as_mut_ptr(), buf.len() as u32) } as usize;
    if len == 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..len.min(buf.len())]))
}

fn empty_placement() -> WINDOWPLACEMENT {
    // SAFETY: WINDOWPLACEMENT is plain old data; all-zero is a valid value.
    let mut wp: WINDOWPLACEMENT = unsafe { mem::zeroed() };
    wp.length = mem::size_of::<WINDOWPLACEMENT>() as u32;
    wp
}

pub(crate) fn placement(id: WindowId) -> Option<Placement> {
    let mut wp = empty_placement();
    if unsafe { GetWindowPlacement(id, &mut wp) } == 0 {
        return None;
    }
    let r = wp.rcNormalPosition;
    Some(Placement {
        normal: Rect {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
        },
        show: ShowState::from_raw(wp.showCmd as u32),
    })
}

pub(crate) fn set_placement(id: WindowId, req: &PlacementRequest) -> Result<()> {
    let mut wp = empty_placement();
    // Minimized position is a leftover from Windows 3.x; let the system pick.
    wp.flags = if req.asynchronous {
        WPF_ASYNCWINDOWPLACEMENT as _
    } else {
        0
    };
    wp.showCmd = req.cmd.raw() as _;
    wp.ptMinPosition = POINT { x: -1, y: -1 };
    wp.ptMaxPosition = POINT { x: -1, y: -1 };
    wp.rcNormalPosition = RECT {
        left: req.normal.left,
        top: req.normal.top,
        right: req.normal.right,
        bottom: req.normal.bottom,
    };
    if unsafe { SetWindowPlacement(id, &wp) } != 0 {
        return Ok(());
    }
    if !is_window(id) {
        return Err(Error::WindowGone);
    }
    Err(Error::Os(unsafe { GetLastError() }))
}
