//! Layout engines
//!
//! Pure geometry: given each child's visibility and natural size plus the
//! container box, compute where every child goes. Hidden children get no
//! allocation (`None`).

pub mod fill_box;
pub mod scaled_table;

pub use fill_box::FillBoxLayout;
pub use scaled_table::ScaledTableLayout;

use serde::{Deserialize, Serialize};

/// Float size in stage units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Float rectangle in stage units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Shrink by `padding` on every side, never below zero size
    pub fn inset(&self, padding: f32) -> Rect {
        Rect::new(
            self.x + padding,
            self.y + padding,
            (self.width - 2.0 * padding).max(0.0),
            (self.height - 2.0 * padding).max(0.0),
        )
    }
}

/// Primary layout axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Which dimension a container negotiates first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    #[default]
    HeightForWidth,
    WidthForHeight,
}

/// What a layout needs to know about a child
pub trait LayoutChild {
    fn is_visible(&self) -> bool;
    fn natural_size(&self) -> Size;
}

/// Plain child description, for callers without a node type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildMetrics {
    pub visible: bool,
    pub natural: Size,
}

impl ChildMetrics {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            visible: true,
            natural: Size::new(width, height),
        }
    }

    pub fn hidden(width: f32, height: f32) -> Self {
        Self {
            visible: false,
            natural: Size::new(width, height),
        }
    }
}

impl LayoutChild for ChildMetrics {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn natural_size(&self) -> Size {
        self.natural
    }
}

impl<T: LayoutChild + ?Sized> LayoutChild for &T {
    fn is_visible(&self) -> bool {
        (**self).is_visible()
    }

    fn natural_size(&self) -> Size {
        (**self).natural_size()
    }
}
