//! Types shared between the tracker, backends and views

pub mod geometry;
pub mod icon;

pub use geometry::Geometry;
pub use icon::{IconError, IconImage, IconLoader, ThemeIconLoader};
