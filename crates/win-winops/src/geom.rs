// Integer screen rectangles in virtual-desktop coordinates, mirroring Win32 RECT.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Edge-based rectangle; `right`/`bottom` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// Build a rectangle from an origin and a size.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    /// Horizontal origin.
    #[inline]
    pub fn x(&self) -> i32 {
        self.left
    }

    /// Vertical origin.
    #[inline]
    pub fn y(&self) -> i32 {
        self.top
    }

    /// Horizontal extent.
    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

impl Display for Rect {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}x{}@({},{})",
            self.width(),
            self.height(),
            self.left,
            self.top
        )
    }
}
