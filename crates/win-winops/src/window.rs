use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{Rect, WindowId};

/// Union of the `WS_OVERLAPPEDWINDOW` style bits
/// (caption, system menu, thick frame, minimize and maximize boxes).
pub const WS_OVERLAPPEDWINDOW: u32 = 0x00CF_0000;
/// Extended style forcing a top-level window onto the taskbar.
pub const WS_EX_APPWINDOW: u32 = 0x0004_0000;
/// Extended style for windows that never become the foreground window.
pub const WS_EX_NOACTIVATE: u32 = 0x0800_0000;

/// WinEvent object id addressing the window itself rather than a child object.
pub const OBJID_WINDOW: i32 = 0;
/// WinEvent child id addressing the object itself.
pub const CHILDID_SELF: i32 = 0;

// Raw `showCmd` values reported by and accepted by the placement calls.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) const SW_SHOWNORMAL: u32 = 1;
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) const SW_SHOWMINIMIZED: u32 = 2;
pub(crate) const SW_SHOWMAXIMIZED: u32 = 3;
pub(crate) const SW_SHOWNOACTIVATE: u32 = 4;
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) const SW_MINIMIZE: u32 = 6;
pub(crate) const SW_SHOWMINNOACTIVE: u32 = 7;
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) const SW_FORCEMINIMIZE: u32 = 11;

/// A top-level window as seen during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Window handle.
    pub id: WindowId,
    /// `IsWindowVisible` at enumeration time.
    pub visible: bool,
    /// True if the window has an owner or parent.
    pub has_parent: bool,
    /// `GWL_STYLE` bits.
    pub style: u32,
    /// `GWL_EXSTYLE` bits.
    pub ex_style: u32,
}

impl WindowInfo {
    /// Whether this window should have its placement tracked.
    ///
    /// Tracked windows are visible, unowned, carry at least one
    /// overlapped-window style bit or the app-window extended style, and are
    /// not no-activate windows. Tool windows that opt into the taskbar pass
    /// through the app-window branch.
    pub fn is_eligible(&self) -> bool {
        if !self.visible || self.has_parent {
            return false;
        }
        let framed = self.style & WS_OVERLAPPEDWINDOW != 0 || self.ex_style & WS_EX_APPWINDOW != 0;
        framed && self.ex_style & WS_EX_NOACTIVATE == 0
    }
}

/// Show state captured with a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowState {
    /// Restored (neither minimized nor maximized).
    #[default]
    Normal,
    /// Maximized on its monitor.
    Maximized,
    /// Minimized to the taskbar.
    Minimized,
}

impl ShowState {
    /// Classify a raw `showCmd` as reported by `GetWindowPlacement`.
    #[cfg_attr(not(windows), allow(dead_code))]
    pub(crate) fn from_raw(cmd: u32) -> Self {
        match cmd {
            SW_SHOWMAXIMIZED => Self::Maximized,
            SW_SHOWMINIMIZED | SW_MINIMIZE | SW_SHOWMINNOACTIVE | SW_FORCEMINIMIZE => {
                Self::Minimized
            }
            _ => Self::Normal,
        }
    }
}

/// Show command sent with a placement write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCmd {
    /// Show in the normal state without activating.
    ShowNoActivate,
    /// Maximize on the monitor the window currently occupies.
    Maximize,
    /// Minimize without activating.
    ShowMinNoActive,
}

impl ShowCmd {
    /// Raw `showCmd` value.
    pub fn raw(self) -> u32 {
        match self {
            Self::ShowNoActivate => SW_SHOWNOACTIVATE,
            Self::Maximize => SW_SHOWMAXIMIZED,
            Self::ShowMinNoActive => SW_SHOWMINNOACTIVE,
        }
    }

    /// Show state a window ends up in after this command.
    pub fn resulting_state(self) -> ShowState {
        match self {
            Self::ShowNoActivate => ShowState::Normal,
            Self::Maximize => ShowState::Maximized,
            Self::ShowMinNoActive => ShowState::Minimized,
        }
    }
}

impl Display for ShowCmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::ShowNoActivate => "SW_SHOWNOACTIVATE",
            Self::Maximize => "SW_MAXIMIZE",
            Self::ShowMinNoActive => "SW_SHOWMINNOACTIVE",
        };
        f.write_str(s)
    }
}

/// Placement snapshot: restored-state rectangle plus show state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Rectangle the window occupies when neither minimized nor maximized.
    pub normal: Rect,
    /// Show state at capture time.
    pub show: ShowState,
}

/// A single placement write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRequest {
    /// Target restored-state rectangle.
    pub normal: Rect,
    /// Show command applied together with the rectangle.
    pub cmd: ShowCmd,
    /// Post the change to the window's thread instead of waiting for it
    /// (`WPF_ASYNCWINDOWPLACEMENT`), so a hung window cannot stall us.
    pub asynchronous: bool,
}

impl Default for PlacementRequest {
    fn default() -> Self {
        Self {
            normal: Rect::default(),
            cmd: ShowCmd::ShowNoActivate,
            asynchronous: true,
        }
    }
}
