//! Overlay drawing
//!
//! The overlay is a transparent RGBA [`Canvas`] the size of the video frame,
//! cleared and redrawn every tick by the [`OverlayRenderer`]. Recording
//! composites it over the video frame.

pub mod filters;
mod renderer;
pub mod skeleton;

pub use filters::FaceFilter;
pub use renderer::{OverlayRenderer, RenderReport};

use image::imageops;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_line_segment_mut, draw_polygon_mut, Blend,
};
use imageproc::point::Point as PolyPoint;
use imageproc::rect::Rect;

use crate::geometry::{FrameSize, Point};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Segments used to approximate ellipses
const ELLIPSE_SEGMENTS: usize = 48;

/// Color with a fractional alpha, e.g. `rgba(0, 0, 0, 0.3)`
pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Rgba<u8> {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Transparent drawing surface in canvas pixel space
pub struct Canvas {
    image: RgbaImage,
}

/// Returns the borrowed surface to its canvas on drop
struct BlendGuard<'a> {
    target: &'a mut RgbaImage,
    blend: Blend<RgbaImage>,
}

impl Drop for BlendGuard<'_> {
    fn drop(&mut self) {
        std::mem::swap(self.target, &mut self.blend.0);
    }
}

impl Canvas {
    pub fn new(size: FrameSize) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, TRANSPARENT),
        }
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Reallocate to a new size, dropping the current drawing
    pub fn resize(&mut self, size: FrameSize) {
        self.image = RgbaImage::from_pixel(size.width, size.height, TRANSPARENT);
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    /// Draw through an alpha-blending view of the surface.
    ///
    /// The surface is put back even if `draw` unwinds.
    fn blended(&mut self, draw: impl FnOnce(&mut Blend<RgbaImage>)) {
        let image = std::mem::take(&mut self.image);
        let mut guard = BlendGuard {
            target: &mut self.image,
            blend: Blend(image),
        };
        draw(&mut guard.blend);
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Rgba<u8>) {
        let c = (center.x.round() as i32, center.y.round() as i32);
        let r = radius.round() as i32;
        self.blended(|img| draw_filled_circle_mut(img, c, r, color));
    }

    pub fn stroke_circle(&mut self, center: Point, radius: f32, color: Rgba<u8>) {
        let c = (center.x.round() as i32, center.y.round() as i32);
        let r = radius.round() as i32;
        self.blended(|img| draw_hollow_circle_mut(img, c, r, color));
    }

    /// Line of roughly `width` pixels, drawn as parallel 1px segments
    pub fn line(&mut self, from: Point, to: Point, width: f32, color: Rgba<u8>) {
        let half = ((width.max(1.0) - 1.0) / 2.0).round() as i32;
        self.blended(|img| {
            for offset in -half..=half {
                let o = offset as f32;
                draw_line_segment_mut(img, (from.x + o, from.y), (to.x + o, to.y), color);
                if offset != 0 {
                    draw_line_segment_mut(img, (from.x, from.y + o), (to.x, to.y + o), color);
                }
            }
        });
    }

    pub fn polyline(&mut self, points: &[Point], width: f32, color: Rgba<u8>) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], width, color);
        }
    }

    /// Fill a polygon. Degenerate shapes (fewer than three distinct
    /// vertices) draw nothing.
    pub fn fill_polygon(&mut self, points: &[Point], color: Rgba<u8>) {
        let mut poly: Vec<PolyPoint<i32>> = Vec::with_capacity(points.len());
        for p in points {
            let q = PolyPoint::new(p.x.round() as i32, p.y.round() as i32);
            if poly.last() != Some(&q) {
                poly.push(q);
            }
        }
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() < 3 {
            return;
        }
        self.blended(|img| draw_polygon_mut(img, &poly, color));
    }

    pub fn fill_ellipse(&mut self, center: Point, rx: f32, ry: f32, rotation: f32, color: Rgba<u8>) {
        let points = ellipse_points(center, rx, ry, rotation);
        self.fill_polygon(&points, color);
    }

    pub fn stroke_ellipse(&mut self, center: Point, rx: f32, ry: f32, rotation: f32, width: f32, color: Rgba<u8>) {
        let mut points = ellipse_points(center, rx, ry, rotation);
        if let Some(&first) = points.first() {
            points.push(first);
        }
        self.polyline(&points, width, color);
    }

    pub fn fill_rect(&mut self, left: f32, top: f32, width: f32, height: f32, color: Rgba<u8>) {
        if let Some(rect) = pixel_rect(left, top, width, height) {
            self.blended(|img| draw_filled_rect_mut(img, rect, color));
        }
    }

    pub fn stroke_rect(&mut self, left: f32, top: f32, width: f32, height: f32, color: Rgba<u8>) {
        if let Some(rect) = pixel_rect(left, top, width, height) {
            self.blended(|img| draw_hollow_rect_mut(img, rect, color));
        }
    }

    /// Composite the overlay over a video frame, optionally mirrored for a
    /// selfie view. Without a frame the overlay sits on opaque black.
    pub fn composite(&self, frame: Option<&RgbaImage>, mirror: bool) -> RgbaImage {
        let mut out = match frame {
            Some(f) if f.dimensions() == self.image.dimensions() => f.clone(),
            Some(f) => imageops::resize(f, self.image.width(), self.image.height(), imageops::FilterType::Triangle),
            None => RgbaImage::from_pixel(self.image.width(), self.image.height(), Rgba([0, 0, 0, 255])),
        };
        imageops::overlay(&mut out, &self.image, 0, 0);
        if mirror {
            imageops::flip_horizontal_in_place(&mut out);
        }
        out
    }
}

fn ellipse_points(center: Point, rx: f32, ry: f32, rotation: f32) -> Vec<Point> {
    let (sin_r, cos_r) = rotation.sin_cos();
    (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
            let (x, y) = (rx * t.cos(), ry * t.sin());
            Point::new(center.x + x * cos_r - y * sin_r, center.y + x * sin_r + y * cos_r)
        })
        .collect()
}

fn pixel_rect(left: f32, top: f32, width: f32, height: f32) -> Option<Rect> {
    let (w, h) = (width.round(), height.round());
    if w < 1.0 || h < 1.0 {
        return None;
    }
    Some(Rect::at(left.round() as i32, top.round() as i32).of_size(w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_clear_resets_to_transparent() {
        let mut canvas = Canvas::new(FrameSize::new(20, 20));
        canvas.fill_circle(Point::new(10.0, 10.0), 4.0, RED);
        assert_eq!(canvas.image().get_pixel(10, 10), &RED);
        canvas.clear();
        assert!(canvas.image().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_panicking_draw_keeps_surface() {
        let mut canvas = Canvas::new(FrameSize::new(20, 20));
        canvas.fill_circle(Point::new(5.0, 5.0), 2.0, RED);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            canvas.blended(|_| panic!("primitive failed"));
        }));
        assert!(result.is_err());
        assert_eq!(canvas.size(), FrameSize::new(20, 20));
        assert_eq!(canvas.image().get_pixel(5, 5), &RED);
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut canvas = Canvas::new(FrameSize::new(10, 10));
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0, Rgba([0, 0, 255, 255]));
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0, rgba(255, 0, 0, 0.5));
        let p = canvas.image().get_pixel(5, 5);
        assert!(p[0] > 100 && p[2] > 100, "expected a red/blue mix, got {:?}", p);
    }

    #[test]
    fn test_degenerate_shapes_draw_nothing() {
        let mut canvas = Canvas::new(FrameSize::new(10, 10));
        canvas.fill_ellipse(Point::new(5.0, 5.0), 0.0, 0.0, 0.3, RED);
        canvas.fill_polygon(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0), Point::new(1.0, 1.0)], RED);
        canvas.fill_rect(2.0, 2.0, 0.2, 5.0, RED);
        assert!(canvas.image().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_rotated_ellipse_covers_center() {
        let mut canvas = Canvas::new(FrameSize::new(40, 40));
        canvas.fill_ellipse(Point::new(20.0, 20.0), 6.0, 14.0, std::f32::consts::FRAC_PI_4, RED);
        assert_eq!(canvas.image().get_pixel(20, 20), &RED);
        assert_eq!(canvas.image().get_pixel(0, 0), &TRANSPARENT);
    }

    #[test]
    fn test_composite_mirrors() {
        let mut canvas = Canvas::new(FrameSize::new(10, 4));
        canvas.fill_rect(0.0, 0.0, 2.0, 4.0, RED);

        let plain = canvas.composite(None, false);
        assert_eq!(plain.get_pixel(0, 1), &RED);
        assert_eq!(plain.get_pixel(9, 1), &Rgba([0, 0, 0, 255]));

        let mirrored = canvas.composite(None, true);
        assert_eq!(mirrored.get_pixel(9, 1), &RED);
        assert_eq!(mirrored.get_pixel(0, 1), &Rgba([0, 0, 0, 255]));
    }
}
