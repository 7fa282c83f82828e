use glam::Vec2;

/// Fixed zoom steps, as fractions of 100%.
pub const ZOOM_LEVELS: [f32; 7] = [0.05, 0.25, 0.5, 1.0, 2.0, 4.0, 10.0];

/// World units per second at 100% zoom.
const PAN_SPEED: f32 = 600.0;
const PAN_FAST_FACTOR: f32 = 4.0;

/// The view the renderer draws. The core only moves it; the renderer reads
/// it back each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub target: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Move by `direction` (unit axes) for `dt` seconds. Panning covers the
    /// same screen distance at every zoom.
    pub fn pan(&mut self, direction: Vec2, dt: f32, fast: bool) {
        if direction == Vec2::ZERO {
            return;
        }
        let speed = PAN_SPEED * if fast { PAN_FAST_FACTOR } else { 1.0 } / self.zoom;
        self.target += direction.normalize() * speed * dt;
    }

    /// Drag-pan by a world-space mouse movement.
    pub fn drag(&mut self, world_delta: Vec2) {
        self.target -= world_delta;
    }

    pub fn zoom_in(&mut self) {
        if let Some(next) = ZOOM_LEVELS.iter().find(|z| **z > self.zoom + f32::EPSILON) {
            self.zoom = *next;
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(prev) = ZOOM_LEVELS.iter().rev().find(|z| **z < self.zoom - f32::EPSILON) {
            self.zoom = *prev;
        }
    }

    /// Jump to a zoom given in percent.
    pub fn zoom_percent(&mut self, percent: u32) {
        self.zoom = (percent as f32 / 100.0).clamp(ZOOM_LEVELS[0], ZOOM_LEVELS[ZOOM_LEVELS.len() - 1]);
    }

    pub fn focus(&mut self, point: Vec2) {
        self.target = point;
    }

    pub fn return_to_origin(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_through_levels() {
        let mut cam = Camera::default();
        cam.zoom_in();
        assert_eq!(cam.zoom, 2.0);
        cam.zoom_out();
        cam.zoom_out();
        assert_eq!(cam.zoom, 0.5);
        cam.zoom_percent(1000);
        cam.zoom_in();
        assert_eq!(cam.zoom, 10.0);
    }

    #[test]
    fn pan_scales_with_zoom() {
        let mut cam = Camera::default();
        cam.zoom = 2.0;
        cam.pan(Vec2::new(1.0, 0.0), 1.0, false);
        assert_eq!(cam.target, Vec2::new(300.0, 0.0));
        cam.return_to_origin();
        assert_eq!(cam, Camera::default());
    }
}
