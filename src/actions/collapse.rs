//! Collapsing container
//!
//! Shows only `collapsed_size` of its child along one axis until the
//! pointer enters or focus moves inside. It collapses again once neither
//! the pointer nor focus keeps it open.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::Transition;
use crate::layout::{Rect, Size};
use crate::style::{self, Stylable, StyleError, StyleValue};

pub const DEFAULT_COLLAPSED_SIZE: f32 = 32.0;
pub const DEFAULT_ANIMATION_SPEED: f32 = 8.0;

/// Side the box collapses toward; that edge stays visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollapseOrientation {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
}

impl CollapseOrientation {
    pub fn is_horizontal(self) -> bool {
        matches!(self, CollapseOrientation::Left | CollapseOrientation::Right)
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Child placement and visible region for one layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollapseAllocation {
    pub child: Rect,
    pub clip: Rect,
}

#[derive(Debug, Clone)]
pub struct CollapseBox {
    collapsed: bool,
    collapsed_size: f32,
    orientation: CollapseOrientation,
    expanded_by_pointer: bool,
    expanded_by_focus: bool,
    animation_speed: f32,
    /// Expansion fraction: 0 collapsed, 1 fully expanded
    expansion: f32,
    animation: Option<Transition>,
}

impl Default for CollapseBox {
    fn default() -> Self {
        Self::new(CollapseOrientation::default())
    }
}

impl CollapseBox {
    pub fn new(orientation: CollapseOrientation) -> Self {
        Self {
            collapsed: true,
            collapsed_size: DEFAULT_COLLAPSED_SIZE,
            orientation,
            expanded_by_pointer: false,
            expanded_by_focus: false,
            animation_speed: DEFAULT_ANIMATION_SPEED,
            expansion: 0.0,
            animation: None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Returns whether the state changed; a change starts a new animation
    pub fn set_collapsed(&mut self, collapsed: bool) -> bool {
        if self.collapsed == collapsed {
            return false;
        }

        debug!("Collapse box {}", if collapsed { "collapsing" } else { "expanding" });
        self.collapsed = collapsed;
        let target = if collapsed { 0.0 } else { 1.0 };
        // Replaces any transition in flight, starting where it left off
        self.animation = Some(
            Transition::new(self.expansion, target, self.animation_speed).with_settle_epsilon(0.001),
        );
        true
    }

    pub fn collapsed_size(&self) -> f32 {
        self.collapsed_size
    }

    pub fn set_collapsed_size(&mut self, size: f32) {
        self.collapsed_size = size.max(0.0);
    }

    pub fn orientation(&self) -> CollapseOrientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: CollapseOrientation) {
        self.orientation = orientation;
    }

    pub fn animation_speed(&self) -> f32 {
        self.animation_speed
    }

    pub fn set_animation_speed(&mut self, speed: f32) {
        self.animation_speed = speed.max(0.0);
    }

    pub fn is_expanded_by_pointer(&self) -> bool {
        self.expanded_by_pointer
    }

    pub fn is_expanded_by_focus(&self) -> bool {
        self.expanded_by_focus
    }

    fn update(&mut self) -> bool {
        self.set_collapsed(!(self.expanded_by_pointer || self.expanded_by_focus))
    }

    pub fn pointer_enter(&mut self) -> bool {
        self.expanded_by_pointer = true;
        self.update()
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.expanded_by_pointer = false;
        self.update()
    }

    pub fn focus_gained(&mut self) -> bool {
        self.expanded_by_focus = true;
        self.update()
    }

    pub fn focus_lost(&mut self) -> bool {
        self.expanded_by_focus = false;
        self.update()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn expansion(&self) -> f32 {
        self.expansion
    }

    /// Advance the running animation; returns whether one is still running
    pub fn step(&mut self, dt: Duration) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };

        self.expansion = animation.step(dt);
        if animation.is_finished() {
            self.animation = None;
        }
        self.animation.is_some()
    }

    /// Jump to the end of the running animation
    pub fn finish_animation(&mut self) {
        if let Some(animation) = self.animation.take() {
            self.expansion = animation.target();
        }
    }

    /// Visible extent along the collapse axis for a child of `natural` extent
    fn extent(&self, natural: f32) -> f32 {
        let collapsed = self.collapsed_size.min(natural);
        collapsed + (natural - collapsed) * self.expansion
    }

    pub fn preferred_size(&self, child_natural: Size) -> Size {
        if self.orientation.is_horizontal() {
            Size::new(self.extent(child_natural.width), child_natural.height)
        } else {
            Size::new(child_natural.width, self.extent(child_natural.height))
        }
    }

    /// Place the child at natural size along the axis, clipped to the visible part
    pub fn allocate(&self, child_natural: Size, container: Rect) -> CollapseAllocation {
        match self.orientation {
            CollapseOrientation::Left | CollapseOrientation::Right => {
                let extent = self.extent(child_natural.width).min(container.width);
                let (child_x, clip_x) = match self.orientation {
                    CollapseOrientation::Left => (container.x, container.x),
                    _ => (
                        container.right() - child_natural.width,
                        container.right() - extent,
                    ),
                };
                CollapseAllocation {
                    child: Rect::new(child_x, container.y, child_natural.width, container.height),
                    clip: Rect::new(clip_x, container.y, extent, container.height),
                }
            }
            CollapseOrientation::Top | CollapseOrientation::Bottom => {
                let extent = self.extent(child_natural.height).min(container.height);
                let (child_y, clip_y) = match self.orientation {
                    CollapseOrientation::Top => (container.y, container.y),
                    _ => (
                        container.bottom() - child_natural.height,
                        container.bottom() - extent,
                    ),
                };
                CollapseAllocation {
                    child: Rect::new(container.x, child_y, container.width, child_natural.height),
                    clip: Rect::new(container.x, clip_y, container.width, extent),
                }
            }
        }
    }
}

impl Stylable for CollapseBox {
    fn style_properties(&self) -> &'static [&'static str] {
        &["collapsed-size", "collapse-orientation", "animation-speed"]
    }

    fn set_style_property(&mut self, name: &str, value: &StyleValue) -> Result<(), StyleError> {
        match name {
            "collapsed-size" => self.set_collapsed_size(value.as_length(name)?),
            "animation-speed" => self.set_animation_speed(value.as_length(name)?),
            "collapse-orientation" => {
                let orientation = CollapseOrientation::parse(value.as_str(name)?)
                    .ok_or_else(|| style::invalid(name, "left, right, top or bottom"))?;
                self.set_orientation(orientation);
            }
            _ => return Err(style::unknown(name)),
        }
        Ok(())
    }
}
