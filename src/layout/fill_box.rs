//! Fill box layout
//!
//! Packs children along one axis and stretches each to the container's
//! cross-axis size.

use super::{LayoutChild, Orientation, Rect, Size};
use crate::style::{self, Stylable, StyleError, StyleValue};

/// (main, cross) components of a size for an orientation
fn split(size: Size, orientation: Orientation) -> (f32, f32) {
    match orientation {
        Orientation::Horizontal => (size.width, size.height),
        Orientation::Vertical => (size.height, size.width),
    }
}

fn join(main: f32, cross: f32, orientation: Orientation) -> Size {
    match orientation {
        Orientation::Horizontal => Size::new(main, cross),
        Orientation::Vertical => Size::new(cross, main),
    }
}

/// Single-axis layout filling the cross axis
#[derive(Debug, Clone, Default)]
pub struct FillBoxLayout {
    orientation: Orientation,
    spacing: f32,
    homogeneous: bool,
    keep_aspect: bool,
}

impl FillBoxLayout {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Default::default()
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn set_spacing(&mut self, spacing: f32) {
        self.spacing = spacing.max(0.0);
    }

    /// Give every child the main-axis size of the largest one
    pub fn is_homogeneous(&self) -> bool {
        self.homogeneous
    }

    pub fn set_homogeneous(&mut self, homogeneous: bool) {
        self.homogeneous = homogeneous;
    }

    /// Scale main-axis sizes along with the cross axis
    pub fn keep_aspect(&self) -> bool {
        self.keep_aspect
    }

    pub fn set_keep_aspect(&mut self, keep_aspect: bool) {
        self.keep_aspect = keep_aspect;
    }

    fn visible<'a, C: LayoutChild>(children: &'a [C]) -> impl Iterator<Item = &'a C> + 'a {
        children.iter().filter(|c| c.is_visible())
    }

    /// Largest main and cross extent among visible children
    fn largest<C: LayoutChild>(&self, children: &[C]) -> (f32, f32) {
        Self::visible(children)
            .map(|c| split(c.natural_size(), self.orientation))
            .fold((0.0f32, 0.0f32), |(m, c), (cm, cc)| (m.max(cm), c.max(cc)))
    }

    /// Main extent of one child once the box's cross size is `cross`
    fn child_main(&self, natural: Size, largest: (f32, f32), cross: Option<f32>) -> f32 {
        let (natural_main, natural_cross) = split(natural, self.orientation);
        let (main, reference_cross) = if self.homogeneous {
            largest
        } else {
            (natural_main, natural_cross)
        };
        match cross {
            Some(cross) if self.keep_aspect && reference_cross > 0.0 => main * cross / reference_cross,
            _ => main,
        }
    }

    /// Natural size of the box, optionally resized to a parent's cross size
    pub fn preferred_size<C: LayoutChild>(&self, children: &[C], parent_cross: Option<f32>) -> Size {
        let count = Self::visible(children).count();
        if count == 0 {
            return Size::ZERO;
        }

        let largest = self.largest(children);
        let spacing = (count as f32 - 1.0) * self.spacing;
        let main: f32 = Self::visible(children)
            .map(|c| self.child_main(c.natural_size(), largest, parent_cross))
            .sum();

        join(main + spacing, parent_cross.unwrap_or(largest.1), self.orientation)
    }

    /// Allocation for every child, `None` for hidden ones
    pub fn allocate<C: LayoutChild>(&self, children: &[C], container: Rect) -> Vec<Option<Rect>> {
        let largest = self.largest(children);
        let (_, container_cross) = split(container.size(), self.orientation);
        let mut cursor = 0.0;

        children
            .iter()
            .map(|child| {
                if !child.is_visible() {
                    return None;
                }

                let main = self.child_main(child.natural_size(), largest, Some(container_cross));
                let size = join(main, container_cross, self.orientation);
                let rect = match self.orientation {
                    Orientation::Horizontal => {
                        Rect::new(container.x + cursor, container.y, size.width, size.height)
                    }
                    Orientation::Vertical => {
                        Rect::new(container.x, container.y + cursor, size.width, size.height)
                    }
                };
                cursor += main + self.spacing;
                Some(rect)
            })
            .collect()
    }
}

impl Stylable for FillBoxLayout {
    fn style_properties(&self) -> &'static [&'static str] {
        &["spacing", "homogeneous", "keep-aspect", "orientation"]
    }

    fn set_style_property(&mut self, name: &str, value: &StyleValue) -> Result<(), StyleError> {
        match name {
            "spacing" => self.set_spacing(value.as_length(name)?),
            "homogeneous" => self.set_homogeneous(value.as_bool(name)?),
            "keep-aspect" => self.set_keep_aspect(value.as_bool(name)?),
            "orientation" => match value.as_str(name)? {
                "horizontal" => self.set_orientation(Orientation::Horizontal),
                "vertical" => self.set_orientation(Orientation::Vertical),
                _ => return Err(style::invalid(name, "horizontal or vertical")),
            },
            _ => return Err(style::unknown(name)),
        }
        Ok(())
    }
}
