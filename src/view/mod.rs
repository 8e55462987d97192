//! Window presentation nodes

pub mod content;
pub mod live_window;

pub use content::{DisplayMode, WindowContent};
pub use live_window::{LiveWindowEvent, LiveWindowView};
