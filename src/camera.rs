use crate::engine::{Point, Rect, Size};

/// Backing surface in CSS pixels, plus its offset inside the page
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Surface {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Surface {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    // degenerate sizes would divide by zero in the projection
    fn width(&self) -> f64 {
        self.width.max(1.0)
    }

    fn height(&self) -> f64 {
        self.height.max(1.0)
    }
}

/// Orthographic side-view camera
/// - world origin is the level center, y grows upward
/// - the visible window is always as tall as the level; its width follows the
///   surface aspect ratio
#[derive(Debug, Clone)]
pub struct Camera {
    x: f64,
    level: Size,
    surface: Surface,
}

impl Camera {
    pub fn new(level: Size, surface: Surface) -> Self {
        Camera {
            x: 0.0,
            level,
            surface,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn level_size(&self) -> Size {
        self.level
    }

    pub fn resize(&mut self, surface: Surface) {
        self.surface = surface;
    }

    pub fn set_level_dimensions(&mut self, level: Size) {
        self.level = level;
    }

    pub fn view_height(&self) -> f64 {
        self.level.height
    }

    pub fn view_width(&self) -> f64 {
        self.view_height() * self.surface.width() / self.surface.height()
    }

    /// Canvas pixels per world unit
    pub fn scale(&self) -> f64 {
        self.surface.height() / self.view_height()
    }

    /// Where the camera wants to be for `target_x`
    /// - window wider than the level: centered
    /// - otherwise the window may not extend past the level edges
    pub fn clamped_target(&self, target_x: f64) -> f64 {
        let view_width = self.view_width();
        if view_width >= self.level.width {
            return 0.0;
        }
        let half_level = self.level.width / 2.0;
        let half_view = view_width / 2.0;
        target_x.clamp(-half_level + half_view, half_level - half_view)
    }

    /// Exponential smoothing toward `target_x`, call once per frame
    pub fn follow(&mut self, target_x: f64, smoothing: f64) {
        let target = self.clamped_target(target_x);
        self.x += (target - self.x) * smoothing;
    }

    /// Snap without smoothing, used while the view is faded out
    pub fn jump_to(&mut self, target_x: f64) {
        self.x = self.clamped_target(target_x);
    }

    /// World to canvas-local pixels
    pub fn world_to_canvas(&self, world: Point) -> Point {
        let scale = self.scale();
        Point {
            x: (world.x - self.x) * scale + self.surface.width() / 2.0,
            y: self.surface.height() / 2.0 - world.y * scale,
        }
    }

    /// World rectangle (bottom-left origin) to a canvas rectangle (top-left)
    pub fn world_rect_to_canvas(&self, rect: &Rect) -> Rect {
        let top_left = self.world_to_canvas(Point {
            x: rect.x(),
            y: rect.bottom(),
        });
        let scale = self.scale();
        Rect::new(
            top_left,
            Size::new(rect.width() * scale, rect.height() * scale),
        )
    }

    pub fn canvas_to_world(&self, canvas: Point) -> Point {
        let scale = self.scale();
        Point {
            x: (canvas.x - self.surface.width() / 2.0) / scale + self.x,
            y: (self.surface.height() / 2.0 - canvas.y) / scale,
        }
    }

    /// World to page (client) coordinates
    pub fn world_to_screen(&self, world: Point) -> Point {
        let canvas = self.world_to_canvas(world);
        Point {
            x: canvas.x + self.surface.left,
            y: canvas.y + self.surface.top,
        }
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.canvas_to_world(Point {
            x: screen.x - self.surface.left,
            y: screen.y - self.surface.top,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera() -> Camera {
        Camera::new(Size::new(4096.0, 2048.0), Surface::new(800.0, 600.0))
    }

    #[test]
    fn screen_center_is_camera_position() {
        let mut camera = camera();
        camera.jump_to(500.0);
        let world = camera.screen_to_world(Point::new(400.0, 300.0));
        assert_abs_diff_eq!(world.x, 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(world.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn screen_world_round_trip_survives_resize_and_level_change() {
        let mut camera = camera();
        camera.resize(Surface {
            left: 12.0,
            top: 40.0,
            width: 1280.0,
            height: 720.0,
        });
        camera.jump_to(-700.0);
        for point in [Point::new(-900.0, 400.0), Point::new(0.0, -1000.0), Point::new(123.4, 5.6)] {
            let back = camera.screen_to_world(camera.world_to_screen(point));
            assert_abs_diff_eq!(back.x, point.x, epsilon = 1e-6);
            assert_abs_diff_eq!(back.y, point.y, epsilon = 1e-6);
        }

        camera.set_level_dimensions(Size::new(3000.0, 1500.0));
        assert_eq!(camera.level_size(), Size::new(3000.0, 1500.0));
        let point = Point::new(250.0, -300.0);
        let back = camera.screen_to_world(camera.world_to_screen(point));
        assert_abs_diff_eq!(back.x, point.x, epsilon = 1e-6);
        assert_abs_diff_eq!(back.y, point.y, epsilon = 1e-6);
    }

    #[test]
    fn follow_never_shows_past_level_edge() {
        let mut camera = camera();
        // 2048 * 800 / 600
        let view_width = camera.view_width();
        for _ in 0..500 {
            camera.follow(10_000.0, 0.05);
        }
        assert_abs_diff_eq!(camera.x(), 2048.0 - view_width / 2.0, epsilon = 1e-3);
    }

    #[test]
    fn follow_is_exponential() {
        let mut camera = camera();
        camera.follow(100.0, 0.25);
        assert_abs_diff_eq!(camera.x(), 25.0, epsilon = 1e-9);
        camera.follow(100.0, 0.25);
        assert_abs_diff_eq!(camera.x(), 43.75, epsilon = 1e-9);
    }

    #[test]
    fn wide_window_centers_on_level() {
        let mut camera = Camera::new(Size::new(1000.0, 1000.0), Surface::new(1600.0, 900.0));
        camera.follow(400.0, 1.0);
        assert_eq!(camera.x(), 0.0);
    }

    #[test]
    fn pixel_scale_tracks_surface_height() {
        let mut camera = camera();
        assert_abs_diff_eq!(camera.scale(), 600.0 / 2048.0, epsilon = 1e-12);
        camera.resize(Surface::new(800.0, 1024.0));
        assert_abs_diff_eq!(camera.scale(), 0.5, epsilon = 1e-12);
    }
}
