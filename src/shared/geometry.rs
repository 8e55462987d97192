//! Window geometry shared by the tracker, the backends and the views.

/// Window geometry in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Geometry with a zero width or height has not been reported yet
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geometric center, rounded towards the origin
    pub fn midpoint(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    /// Half-open containment test: `[x, x+w) × [y, y+h)`
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && x < self.x + self.width as i32
            && y >= self.y
            && y < self.y + self.height as i32
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Smallest geometry covering both
    pub fn union(&self, other: &Geometry) -> Geometry {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Geometry::new(x, y, (right - x) as u32, (bottom - y) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let g = Geometry::new(0, 0, 100, 50);
        assert!(g.contains(0, 0));
        assert!(g.contains(99, 49));
        assert!(!g.contains(100, 10));
        assert!(!g.contains(10, 50));
        assert!(!g.contains(-1, 10));
    }

    #[test]
    fn test_midpoint_and_union() {
        let a = Geometry::new(10, 20, 101, 40);
        assert_eq!(a.midpoint(), (60, 40));

        let b = Geometry::new(1920, 0, 1280, 1024);
        let c = Geometry::new(0, 0, 1920, 1080);
        assert_eq!(b.union(&c), Geometry::new(0, 0, 3200, 1080));
    }
}
