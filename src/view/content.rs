//! What a live window view paints

use serde::{Deserialize, Serialize};

use crate::layout::Size;
use crate::shared::IconImage;
use crate::tracker::WindowSurface;

/// How a view presents its window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    #[default]
    LivePreview,
    IconOnly,
}

impl DisplayMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "live-preview" => Some(DisplayMode::LivePreview),
            "icon-only" => Some(DisplayMode::IconOnly),
            _ => None,
        }
    }
}

/// Content owned by a view; a live surface must go back to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum WindowContent {
    Live(WindowSurface),
    Icon(IconImage),
}

impl WindowContent {
    pub fn natural_size(&self) -> Size {
        match self {
            WindowContent::Live(surface) => Size::new(surface.width as f32, surface.height as f32),
            WindowContent::Icon(icon) => Size::new(icon.width() as f32, icon.height() as f32),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, WindowContent::Live(_))
    }

    pub fn surface(&self) -> Option<&WindowSurface> {
        match self {
            WindowContent::Live(surface) => Some(surface),
            WindowContent::Icon(_) => None,
        }
    }

    pub fn icon(&self) -> Option<&IconImage> {
        match self {
            WindowContent::Icon(icon) => Some(icon),
            WindowContent::Live(_) => None,
        }
    }
}
