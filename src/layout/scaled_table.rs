//! Scaled table layout
//!
//! Arranges the visible children in a near-square grid filling the
//! container. Each child is scaled into its cell keeping its aspect ratio
//! and centered there.

use tracing::debug;

use super::{LayoutChild, Rect, RequestMode, Size};
use crate::style::{self, Stylable, StyleError, StyleValue};

/// Rows and columns for `count` children
///
/// Height-for-width containers grow rows first, width-for-height ones
/// columns first: the primary count is `ceil(sqrt(count))` and the other
/// is `ceil(count / primary)`.
pub fn grid_for(count: usize, mode: RequestMode) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }

    let primary = ceil_sqrt(count);
    let secondary = count.div_ceil(primary);
    match mode {
        RequestMode::HeightForWidth => (primary, secondary),
        RequestMode::WidthForHeight => (secondary, primary),
    }
}

fn ceil_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root < n {
        root += 1;
    }
    while root > 1 && (root - 1) * (root - 1) >= n {
        root -= 1;
    }
    root
}

/// Scale `natural` into `cell` keeping its aspect ratio
///
/// Fits the width first and falls back to fitting the height when the
/// width-fitted height overflows the cell.
pub fn fit_preserving_aspect(natural: Size, cell: Size) -> Size {
    if natural.is_empty() || cell.is_empty() {
        return Size::ZERO;
    }

    let width = cell.width;
    let height = natural.height * (cell.width / natural.width);
    if height <= cell.height {
        return Size::new(width, height);
    }

    let height = cell.height;
    let width = natural.width * (cell.height / natural.height);
    Size::new(width, height)
}

/// Grid layout scaling children into equally sized cells
#[derive(Debug, Clone)]
pub struct ScaledTableLayout {
    row_spacing: f32,
    column_spacing: f32,
    relative_scale: bool,
    prevent_upscaling: bool,
    request_mode: RequestMode,

    rows: usize,
    columns: usize,
    visible_children: usize,
    grid_valid: bool,
}

impl Default for ScaledTableLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaledTableLayout {
    pub fn new() -> Self {
        Self {
            row_spacing: 0.0,
            column_spacing: 0.0,
            relative_scale: false,
            prevent_upscaling: false,
            request_mode: RequestMode::HeightForWidth,
            rows: 0,
            columns: 0,
            visible_children: 0,
            grid_valid: false,
        }
    }

    pub fn row_spacing(&self) -> f32 {
        self.row_spacing
    }

    pub fn set_row_spacing(&mut self, spacing: f32) {
        self.row_spacing = spacing.max(0.0);
    }

    pub fn column_spacing(&self) -> f32 {
        self.column_spacing
    }

    pub fn set_column_spacing(&mut self, spacing: f32) {
        self.column_spacing = spacing.max(0.0);
    }

    pub fn set_spacing(&mut self, spacing: f32) {
        self.set_row_spacing(spacing);
        self.set_column_spacing(spacing);
    }

    /// Scale all children by the factor fitting the largest one
    pub fn relative_scale(&self) -> bool {
        self.relative_scale
    }

    pub fn set_relative_scale(&mut self, relative: bool) {
        self.relative_scale = relative;
    }

    /// Never scale a child beyond its natural size
    pub fn prevent_upscaling(&self) -> bool {
        self.prevent_upscaling
    }

    pub fn set_prevent_upscaling(&mut self, prevent: bool) {
        self.prevent_upscaling = prevent;
    }

    pub fn request_mode(&self) -> RequestMode {
        self.request_mode
    }

    pub fn set_request_mode(&mut self, mode: RequestMode) {
        if self.request_mode != mode {
            self.request_mode = mode;
            self.grid_valid = false;
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn number_children(&self) -> usize {
        self.visible_children
    }

    fn update_grid<C: LayoutChild>(&mut self, children: &[C]) {
        let visible = children.iter().filter(|c| c.is_visible()).count();
        if self.grid_valid && visible == self.visible_children {
            return;
        }

        let (rows, columns) = grid_for(visible, self.request_mode);
        debug!("Scaled table grid for {} children: {}x{}", visible, rows, columns);
        self.visible_children = visible;
        self.rows = rows;
        self.columns = columns;
        self.grid_valid = true;
    }

    /// Largest visible child width and height, taken independently
    fn largest<C: LayoutChild>(children: &[C]) -> Size {
        children
            .iter()
            .filter(|c| c.is_visible())
            .map(|c| c.natural_size())
            .fold(Size::ZERO, |acc, s| {
                Size::new(acc.width.max(s.width), acc.height.max(s.height))
            })
    }

    /// Grid of largest-child cells plus spacing
    pub fn preferred_size<C: LayoutChild>(&mut self, children: &[C]) -> Size {
        self.update_grid(children);
        if self.visible_children == 0 {
            return Size::ZERO;
        }

        let largest = Self::largest(children);
        let columns = self.columns as f32;
        let rows = self.rows as f32;
        Size::new(
            columns * largest.width + (columns - 1.0) * self.column_spacing,
            rows * largest.height + (rows - 1.0) * self.row_spacing,
        )
    }

    /// Size of one cell in `container`
    pub fn cell_size(&self, container: Size) -> Size {
        if self.rows == 0 || self.columns == 0 {
            return Size::ZERO;
        }

        let columns = self.columns as f32;
        let rows = self.rows as f32;
        Size::new(
            ((container.width - (columns - 1.0) * self.column_spacing) / columns).max(0.0),
            ((container.height - (rows - 1.0) * self.row_spacing) / rows).max(0.0),
        )
    }

    /// Allocation for every child, `None` for hidden ones
    pub fn allocate<C: LayoutChild>(&mut self, children: &[C], container: Rect) -> Vec<Option<Rect>> {
        self.update_grid(children);

        let cell = self.cell_size(container.size());
        let largest = Self::largest(children);
        let relative_factor = if self.relative_scale && !largest.is_empty() {
            fit_preserving_aspect(largest, cell).width / largest.width
        } else {
            1.0
        };

        let mut slot = 0;
        children
            .iter()
            .map(|child| {
                if !child.is_visible() {
                    return None;
                }

                let row = slot / self.columns.max(1);
                let column = slot % self.columns.max(1);
                slot += 1;

                let cell_x = container.x + column as f32 * (cell.width + self.column_spacing);
                let cell_y = container.y + row as f32 * (cell.height + self.row_spacing);

                let natural = child.natural_size();
                if natural.is_empty() {
                    return Some(Rect::new(cell_x, cell_y, 0.0, 0.0));
                }

                let mut size = if self.relative_scale {
                    Size::new(natural.width * relative_factor, natural.height * relative_factor)
                } else {
                    fit_preserving_aspect(natural, cell)
                };
                if self.prevent_upscaling
                    && (size.width > natural.width || size.height > natural.height)
                {
                    size = natural;
                }

                Some(Rect::new(
                    cell_x + (cell.width - size.width) / 2.0,
                    cell_y + (cell.height - size.height) / 2.0,
                    size.width,
                    size.height,
                ))
            })
            .collect()
    }
}

impl Stylable for ScaledTableLayout {
    fn style_properties(&self) -> &'static [&'static str] {
        &[
            "row-spacing",
            "column-spacing",
            "spacing",
            "relative-scale",
            "prevent-upscaling",
        ]
    }

    fn set_style_property(&mut self, name: &str, value: &StyleValue) -> Result<(), StyleError> {
        match name {
            "row-spacing" => self.set_row_spacing(value.as_length(name)?),
            "column-spacing" => self.set_column_spacing(value.as_length(name)?),
            "spacing" => self.set_spacing(value.as_length(name)?),
            "relative-scale" => self.set_relative_scale(value.as_bool(name)?),
            "prevent-upscaling" => self.set_prevent_upscaling(value.as_bool(name)?),
            _ => return Err(style::unknown(name)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ChildMetrics;

    fn children(n: usize, w: f32, h: f32) -> Vec<ChildMetrics> {
        (0..n).map(|_| ChildMetrics::new(w, h)).collect()
    }

    #[test]
    fn test_seven_children_make_three_by_three() {
        let mut layout = ScaledTableLayout::new();
        layout.set_request_mode(RequestMode::WidthForHeight);
        layout.allocate(&children(7, 100.0, 100.0), Rect::new(0.0, 0.0, 900.0, 900.0));
        assert_eq!((layout.rows(), layout.columns()), (3, 3));
        assert_eq!(layout.number_children(), 7);
    }

    #[test]
    fn test_grid_counts_for_all_sizes() {
        for n in 0..200usize {
            for mode in [RequestMode::HeightForWidth, RequestMode::WidthForHeight] {
                let (rows, columns) = grid_for(n, mode);
                assert!(rows * columns >= n);
                if n == 0 {
                    assert_eq!((rows, columns), (0, 0));
                    continue;
                }
                let primary = (n as f64).sqrt().ceil() as usize;
                let (p, s) = match mode {
                    RequestMode::HeightForWidth => (rows, columns),
                    RequestMode::WidthForHeight => (columns, rows),
                };
                assert_eq!(p, primary, "n={}", n);
                assert_eq!(s, n.div_ceil(primary), "n={}", n);
            }
        }
    }

    #[test]
    fn test_grid_axis_bias() {
        assert_eq!(grid_for(5, RequestMode::HeightForWidth), (3, 2));
        assert_eq!(grid_for(5, RequestMode::WidthForHeight), (2, 3));
    }

    #[test]
    fn test_fit_never_exceeds_cell_and_keeps_aspect() {
        let naturals = [(400.0, 300.0), (300.0, 400.0), (1920.0, 1080.0), (10.0, 700.0), (1.0, 1.0)];
        let cells = [(200.0, 100.0), (100.0, 200.0), (640.0, 480.0), (33.0, 33.0), (1000.0, 5.0)];
        for (nw, nh) in naturals {
            for (cw, ch) in cells {
                let fit = fit_preserving_aspect(Size::new(nw, nh), Size::new(cw, ch));
                assert!(fit.width <= cw + 1e-3 && fit.height <= ch + 1e-3);
                let ratio = nw / nh;
                assert!((fit.width / fit.height - ratio).abs() / ratio < 1e-4);
                // One dimension always touches the cell
                assert!((fit.width - cw).abs() < 1e-3 || (fit.height - ch).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_children_centered_in_cells() {
        let mut layout = ScaledTableLayout::new();
        let kids = children(4, 200.0, 100.0);
        let alloc = layout.allocate(&kids, Rect::new(0.0, 0.0, 400.0, 400.0));

        // 2x2 grid of 200x200 cells, each child 200x100 centered vertically
        assert_eq!(alloc[0], Some(Rect::new(0.0, 50.0, 200.0, 100.0)));
        assert_eq!(alloc[1], Some(Rect::new(200.0, 50.0, 200.0, 100.0)));
        assert_eq!(alloc[3], Some(Rect::new(200.0, 250.0, 200.0, 100.0)));
    }

    #[test]
    fn test_spacing_reduces_cells() {
        let mut layout = ScaledTableLayout::new();
        layout.set_spacing(10.0);
        let kids = children(4, 100.0, 100.0);
        let alloc = layout.allocate(&kids, Rect::new(0.0, 0.0, 210.0, 210.0));
        assert_eq!(alloc[3], Some(Rect::new(110.0, 110.0, 100.0, 100.0)));
    }

    #[test]
    fn test_hidden_children_take_no_cell() {
        let mut layout = ScaledTableLayout::new();
        layout.set_request_mode(RequestMode::WidthForHeight);
        let kids = vec![
            ChildMetrics::new(100.0, 100.0),
            ChildMetrics::hidden(100.0, 100.0),
            ChildMetrics::new(100.0, 100.0),
        ];
        let alloc = layout.allocate(&kids, Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(layout.number_children(), 2);
        assert_eq!(alloc[1], None);
        assert_eq!(alloc[2], Some(Rect::new(100.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn test_zero_size_child_gets_zero_space() {
        let mut layout = ScaledTableLayout::new();
        let kids = vec![ChildMetrics::new(0.0, 100.0), ChildMetrics::new(100.0, 100.0)];
        let alloc = layout.allocate(&kids, Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(alloc[0], Some(Rect::new(0.0, 0.0, 0.0, 0.0)));
        assert!(alloc.iter().flatten().all(|r| r.width.is_finite() && r.height.is_finite()));
    }

    #[test]
    fn test_relative_scale_follows_largest_child() {
        let mut layout = ScaledTableLayout::new();
        layout.set_request_mode(RequestMode::WidthForHeight);
        layout.set_relative_scale(true);
        let kids = vec![ChildMetrics::new(400.0, 200.0), ChildMetrics::new(100.0, 50.0)];
        let alloc = layout.allocate(&kids, Rect::new(0.0, 0.0, 400.0, 100.0));

        // Cells are 200x100; largest (400x200) fits at factor 0.5
        assert_eq!(alloc[0].unwrap().size(), Size::new(200.0, 100.0));
        assert_eq!(alloc[1].unwrap().size(), Size::new(50.0, 25.0));
    }

    #[test]
    fn test_prevent_upscaling_clamps_to_natural() {
        let mut layout = ScaledTableLayout::new();
        layout.set_prevent_upscaling(true);
        let kids = children(1, 64.0, 32.0);
        let alloc = layout.allocate(&kids, Rect::new(0.0, 0.0, 640.0, 480.0));
        assert_eq!(alloc[0], Some(Rect::new(288.0, 224.0, 64.0, 32.0)));
    }

    #[test]
    fn test_grid_recomputed_when_mode_changes() {
        let mut layout = ScaledTableLayout::new();
        let kids = children(5, 10.0, 10.0);
        layout.preferred_size(&kids);
        assert_eq!((layout.rows(), layout.columns()), (3, 2));
        layout.set_request_mode(RequestMode::WidthForHeight);
        layout.preferred_size(&kids);
        assert_eq!((layout.rows(), layout.columns()), (2, 3));
    }

    #[test]
    fn test_preferred_size_and_style() {
        let mut layout = ScaledTableLayout::new();
        assert_eq!(layout.apply_style(&[("spacing", "4px"), ("bogus", "1")]), 1);
        let kids = vec![ChildMetrics::new(100.0, 20.0), ChildMetrics::new(50.0, 80.0)];
        // Two children: 2 rows x 1 column of 100x80 cells
        assert_eq!(layout.preferred_size(&kids), Size::new(100.0, 164.0));
    }
}
