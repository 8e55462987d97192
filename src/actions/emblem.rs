//! Emblem decoration
//!
//! Paints a small icon on top of its host after the host has painted
//! itself. The icon is placed at one of nine anchor points of the host's
//! box shrunk by `padding`, shifted by the alignment fractions, and cropped
//! (texture coordinates included) to stay inside that box.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::Rect;
use crate::shared::{IconImage, IconLoader};
use crate::style::{self, Stylable, StyleError, StyleValue};

pub const DEFAULT_EMBLEM_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPoint {
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    #[default]
    SouthEast,
}

impl AnchorPoint {
    /// Position of the anchor inside a box, as fractions of its size
    pub fn fractions(self) -> (f32, f32) {
        match self {
            AnchorPoint::NorthWest => (0.0, 0.0),
            AnchorPoint::North => (0.5, 0.0),
            AnchorPoint::NorthEast => (1.0, 0.0),
            AnchorPoint::West => (0.0, 0.5),
            AnchorPoint::Center => (0.5, 0.5),
            AnchorPoint::East => (1.0, 0.5),
            AnchorPoint::SouthWest => (0.0, 1.0),
            AnchorPoint::South => (0.5, 1.0),
            AnchorPoint::SouthEast => (1.0, 1.0),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "north-west" => AnchorPoint::NorthWest,
            "north" => AnchorPoint::North,
            "north-east" => AnchorPoint::NorthEast,
            "west" => AnchorPoint::West,
            "center" => AnchorPoint::Center,
            "east" => AnchorPoint::East,
            "south-west" => AnchorPoint::SouthWest,
            "south" => AnchorPoint::South,
            "south-east" => AnchorPoint::SouthEast,
            _ => return None,
        })
    }
}

/// Textured quad to draw: `dest` in stage units, `texture` in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmblemQuad {
    pub dest: Rect,
    pub texture: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmblemPaint {
    /// Icon just loaded; a repaint has been requested
    NotReady,
    /// Nothing visible inside the host
    Skip,
    Draw(EmblemQuad),
}

pub struct EmblemEffect {
    loader: Rc<dyn IconLoader>,
    icon_name: String,
    icon_size: u32,
    padding: f32,
    x_align: f32,
    y_align: f32,
    anchor: AnchorPoint,
    icon: Option<IconImage>,
    repaint_requested: bool,
}

impl std::fmt::Debug for EmblemEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmblemEffect")
            .field("icon_name", &self.icon_name)
            .field("icon_size", &self.icon_size)
            .field("anchor", &self.anchor)
            .field("loaded", &self.icon.is_some())
            .finish()
    }
}

impl EmblemEffect {
    pub fn new(loader: Rc<dyn IconLoader>, icon_name: impl Into<String>) -> Self {
        Self {
            loader,
            icon_name: icon_name.into(),
            icon_size: DEFAULT_EMBLEM_SIZE,
            padding: 0.0,
            x_align: 0.0,
            y_align: 0.0,
            anchor: AnchorPoint::default(),
            icon: None,
            repaint_requested: false,
        }
    }

    pub fn icon_name(&self) -> &str {
        &self.icon_name
    }

    pub fn set_icon_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.icon_name != name {
            self.icon_name = name;
            self.invalidate();
        }
    }

    pub fn icon_size(&self) -> u32 {
        self.icon_size
    }

    pub fn set_icon_size(&mut self, size: u32) {
        if self.icon_size != size {
            self.icon_size = size;
            self.invalidate();
        }
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn set_padding(&mut self, padding: f32) {
        self.padding = padding.max(0.0);
        self.repaint_requested = true;
    }

    pub fn alignment(&self) -> (f32, f32) {
        (self.x_align, self.y_align)
    }

    pub fn set_x_align(&mut self, align: f32) {
        self.x_align = align.clamp(0.0, 1.0);
        self.repaint_requested = true;
    }

    pub fn set_y_align(&mut self, align: f32) {
        self.y_align = align.clamp(0.0, 1.0);
        self.repaint_requested = true;
    }

    pub fn anchor_point(&self) -> AnchorPoint {
        self.anchor
    }

    pub fn set_anchor_point(&mut self, anchor: AnchorPoint) {
        self.anchor = anchor;
        self.repaint_requested = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.icon.is_some()
    }

    pub fn icon(&self) -> Option<&IconImage> {
        self.icon.as_ref()
    }

    /// Returns and clears the pending repaint request
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    fn invalidate(&mut self) {
        self.icon = None;
        self.repaint_requested = true;
    }

    /// Paint step run after the host painted into `host_box`
    pub fn paint(&mut self, host_box: Rect) -> EmblemPaint {
        let Some(icon) = self.icon.as_ref() else {
            debug!("Loading emblem icon '{}' at {}px", self.icon_name, self.icon_size);
            let icon = self
                .loader
                .load_or_placeholder(&self.icon_name, self.icon_size)
                .scaled(self.icon_size);
            self.icon = Some(icon);
            self.repaint_requested = true;
            return EmblemPaint::NotReady;
        };

        match self.place(host_box, icon.width() as f32, icon.height() as f32) {
            Some(quad) => EmblemPaint::Draw(quad),
            None => EmblemPaint::Skip,
        }
    }

    /// Placement of a `width`×`height` icon inside `host_box`
    pub fn place(&self, host_box: Rect, width: f32, height: f32) -> Option<EmblemQuad> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        let area = host_box.inset(self.padding);
        let (fx, fy) = self.anchor.fractions();
        let x = area.x + area.width * fx - width * self.x_align;
        let y = area.y + area.height * fy - height * self.y_align;

        let left = x.max(area.x);
        let top = y.max(area.y);
        let right = (x + width).min(area.right());
        let bottom = (y + height).min(area.bottom());
        if right <= left || bottom <= top {
            return None;
        }

        Some(EmblemQuad {
            dest: Rect::new(left, top, right - left, bottom - top),
            texture: Rect::new(
                (left - x) / width,
                (top - y) / height,
                (right - left) / width,
                (bottom - top) / height,
            ),
        })
    }
}

impl Stylable for EmblemEffect {
    fn style_properties(&self) -> &'static [&'static str] {
        &["icon-name", "icon-size", "padding", "x-align", "y-align", "anchor-point"]
    }

    fn set_style_property(&mut self, name: &str, value: &StyleValue) -> Result<(), StyleError> {
        match name {
            "icon-name" => self.set_icon_name(value.as_str(name)?),
            "icon-size" => self.set_icon_size(value.as_u32(name)?),
            "padding" => self.set_padding(value.as_length(name)?),
            "x-align" => self.set_x_align(value.as_fraction(name)?),
            "y-align" => self.set_y_align(value.as_fraction(name)?),
            "anchor-point" => {
                let anchor = AnchorPoint::parse(value.as_str(name)?)
                    .ok_or_else(|| style::invalid(name, "a compass anchor such as north-east"))?;
                self.set_anchor_point(anchor);
            }
            _ => return Err(style::unknown(name)),
        }
        Ok(())
    }
}
