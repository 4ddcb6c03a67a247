//! Geometry helpers shared by the classifier, the interaction engine and the
//! overlay renderer
//!
//! Two coordinate spaces are in play. Landmarks and the overlay canvas live in
//! *canvas pixel space*: the unflipped source frame, origin top-left, y down.
//! Zones live in *screen space*: where the canvas and UI are actually laid
//! out, with the canvas displayed horizontally mirrored.

use serde::{Deserialize, Serialize};

/// A 2D point in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel dimensions of a frame or canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Length of the frame diagonal in pixels
    pub fn diagonal(&self) -> f32 {
        (self.width as f32).hypot(self.height as f32)
    }
}

/// Axis-aligned rectangle in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Edge-inclusive containment test
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}

/// Euclidean distance between two points
pub fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Arithmetic mean of two points
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Map a canvas-space point to screen space for a horizontally mirrored canvas.
///
/// The x coordinate is mirrored in canvas pixels first, then both axes are
/// scaled by the displayed/intrinsic ratio and offset by the canvas's
/// on-screen origin. Returns `None` for an unsized canvas.
pub fn canvas_to_screen(point: Point, canvas: FrameSize, canvas_rect: ScreenRect) -> Option<Point> {
    if canvas.is_empty() {
        return None;
    }

    let scale_x = canvas_rect.width / canvas.width as f32;
    let scale_y = canvas_rect.height / canvas.height as f32;

    let mirrored_x = canvas.width as f32 - point.x;
    Some(Point::new(
        canvas_rect.left + mirrored_x * scale_x,
        canvas_rect.top + point.y * scale_y,
    ))
}

/// Whether a canvas-space point lands inside a screen-space zone rectangle
/// once mapped through the mirrored canvas.
pub fn hit_test(point: Point, zone: ScreenRect, canvas: FrameSize, canvas_rect: ScreenRect) -> bool {
    match canvas_to_screen(point, canvas, canvas_rect) {
        Some(screen) => zone.contains(screen),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_and_midpoint() {
        let a = Point::new(100.0, 100.0);
        let b = Point::new(105.0, 102.0);
        assert!((distance(a, b) - 5.385).abs() < 0.01);
        assert_eq!(midpoint(a, b), Point::new(102.5, 101.0));
    }

    #[test]
    fn test_canvas_to_screen_mirrors_before_scaling() {
        // 1280x720 canvas displayed at 640x360, offset by (10, 20)
        let canvas = FrameSize::new(1280, 720);
        let rect = ScreenRect::new(10.0, 20.0, 640.0, 360.0);

        let screen = canvas_to_screen(Point::new(200.0, 100.0), canvas, rect).unwrap();
        // mirrored x = 1080, scaled by 0.5 -> 540, +10
        assert_eq!(screen, Point::new(550.0, 70.0));

        // Scaling first, then mirroring against the intrinsic width, lands elsewhere
        let wrong_x = rect.left + (canvas.width as f32 - 200.0 * 0.5);
        assert_ne!(screen.x, wrong_x);
    }

    #[test]
    fn test_hit_test_mirror_consistency() {
        let canvas = FrameSize::new(1280, 720);
        let rect = ScreenRect::new(0.0, 0.0, 1920.0, 1080.0);
        let x = 300.0;
        let p = Point::new(x, 400.0);
        let flipped = Point::new(canvas.width as f32 - x, 400.0);

        let screen = canvas_to_screen(p, canvas, rect).unwrap();
        let zone = ScreenRect::new(screen.x - 10.0, screen.y - 10.0, 20.0, 20.0);
        assert!(hit_test(p, zone, canvas, rect));

        // The flipped point maps to where an unmirrored mapping would put p
        let flipped_screen = canvas_to_screen(flipped, canvas, rect).unwrap();
        let mirror_zone = ScreenRect::new(flipped_screen.x - 10.0, flipped_screen.y - 10.0, 20.0, 20.0);
        assert!(hit_test(flipped, mirror_zone, canvas, rect));
        assert!((flipped_screen.x - x * 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_hit_test_unsized_canvas() {
        let zone = ScreenRect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!hit_test(
            Point::new(1.0, 1.0),
            zone,
            FrameSize::new(0, 0),
            ScreenRect::new(0.0, 0.0, 100.0, 100.0)
        ));
    }

    #[test]
    fn test_rect_edges_inclusive() {
        let r = ScreenRect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Point::new(10.0, 30.0)));
        assert!(!r.contains(Point::new(30.1, 20.0)));
    }
}
