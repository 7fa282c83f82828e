use glam::Vec2;

/// Axis-aligned rectangle in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Smallest rectangle containing both corners.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Open-interval overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.w, self.h)
    }
}

/// Snap a coordinate down onto the grid.
pub fn snap(value: f32, grid: f32) -> f32 {
    (value / grid).floor() * grid
}

pub fn snap_point(p: Vec2, grid: f32) -> Vec2 {
    Vec2::new(snap(p.x, grid), snap(p.y, grid))
}

/// Number of whole grid steps between two aligned coordinates.
pub fn grid_steps(from: f32, to: f32, grid: f32) -> i32 {
    ((to - from) / grid).round() as i32
}

/// Mean of a set of points, `None` when empty.
pub fn centroid(points: impl IntoIterator<Item = Vec2>) -> Option<Vec2> {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for p in points {
        sum += p;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_floors_to_grid() {
        assert_eq!(snap(56.0, 16.0), 48.0);
        assert_eq!(snap(-8.0, 16.0), -16.0);
        assert_eq!(snap(32.0, 16.0), 32.0);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(16.0, 0.0, 16.0, 16.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&Rect::new(15.0, 15.0, 4.0, 4.0)));
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert!(centroid(Vec::new()).is_none());
        let c = centroid([Vec2::new(0.0, 0.0), Vec2::new(16.0, 0.0)]).unwrap();
        assert_eq!(c, Vec2::new(8.0, 0.0));
    }
}
