//! Interaction and decoration behaviors attached to nodes

pub mod click;
pub mod collapse;
pub mod emblem;

pub use click::{ClickAction, ClickEvent, LongPressPhase, Modifiers, PointerEvent, PointerEventKind, Propagation};
pub use collapse::{CollapseAllocation, CollapseBox, CollapseOrientation};
pub use emblem::{AnchorPoint, EmblemEffect, EmblemPaint, EmblemQuad};
