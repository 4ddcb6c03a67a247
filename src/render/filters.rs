//! Face filters and the raised-hand marker
//!
//! Filter geometry is positioned relative to the face landmarks and sized
//! from the face bounding box. Animated parts are driven by the renderer's
//! frame counter so they advance once per drawn frame.

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::{rgba, Canvas};
use crate::error::RenderError;
use crate::geometry::{FrameSize, Point};
use crate::landmarks::{Face, FaceLandmarks, Hand};

/// Selectable face decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceFilter {
    #[default]
    None,
    Dog,
    Cat,
    Bunny,
    Glasses,
}

impl FaceFilter {
    pub const ALL: [FaceFilter; 5] = [
        FaceFilter::None,
        FaceFilter::Dog,
        FaceFilter::Cat,
        FaceFilter::Bunny,
        FaceFilter::Glasses,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FaceFilter::None => "none",
            FaceFilter::Dog => "dog",
            FaceFilter::Cat => "cat",
            FaceFilter::Bunny => "bunny",
            FaceFilter::Glasses => "glasses",
        }
    }
}

impl fmt::Display for FaceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FaceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown face filter '{}'", s))
    }
}

const DOG_EAR: Rgba<u8> = Rgba([0x8B, 0x45, 0x13, 255]);
const DOG_INNER_EAR: Rgba<u8> = Rgba([0xDE, 0xB8, 0x87, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const NOSE_HIGHLIGHT: Rgba<u8> = Rgba([0x66, 0x66, 0x66, 255]);
const TONGUE: Rgba<u8> = Rgba([0xFF, 0x69, 0xB4, 255]);
const TONGUE_LINE: Rgba<u8> = Rgba([0xFF, 0x14, 0x93, 255]);
const CAT_EAR: Rgba<u8> = Rgba([0xFF, 0xA5, 0x00, 255]);
const PINK: Rgba<u8> = Rgba([0xFF, 0xB6, 0xC1, 255]);
const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 255]);
const MARKER: Rgba<u8> = Rgba([0xFF, 0x00, 0x00, 178]);
const MARKER_STAR: Rgba<u8> = Rgba([0xFF, 0xFF, 0x00, 255]);

/// Radius of the raised-hand marker at the index tip
pub const HAND_MARKER_RADIUS: f32 = 40.0;

/// Draw `filter` for one face at animation step `frame`
pub fn draw_face_filter(canvas: &mut Canvas, filter: FaceFilter, face: &Face, frame: u64) -> Result<(), RenderError> {
    if filter == FaceFilter::None {
        return Ok(());
    }
    let name = filter.name();
    validate_face(face, canvas.size(), name)?;

    let lm = &face.landmarks;
    let width = face.bounding_box.width;
    let t = frame as f32;
    match filter {
        FaceFilter::None => {}
        FaceFilter::Dog => dog(canvas, lm, width, t),
        FaceFilter::Cat => cat(canvas, lm, width, t),
        FaceFilter::Bunny => bunny(canvas, lm, width, t),
        FaceFilter::Glasses => glasses(canvas, lm, width),
    }
    Ok(())
}

/// Face boxes may overhang the canvas, but not by more than this factor
const MAX_FACE_TO_CANVAS: f32 = 4.0;

fn validate_face(face: &Face, canvas: FrameSize, filter: &'static str) -> Result<(), RenderError> {
    let b = &face.bounding_box;
    let lm = &face.landmarks;
    let finite = [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite())
        && [lm.left_eye, lm.right_eye, lm.nose, lm.mouth].iter().all(|p| p.is_finite());
    if !finite {
        return Err(RenderError::NonFiniteGeometry { filter });
    }
    if b.width <= 0.0 || b.height <= 0.0 {
        return Err(RenderError::DegenerateFace {
            filter,
            width: b.width,
            height: b.height,
        });
    }
    let max_width = canvas.width as f32 * MAX_FACE_TO_CANVAS;
    let max_height = canvas.height as f32 * MAX_FACE_TO_CANVAS;
    if b.width > max_width || b.height > max_height {
        return Err(RenderError::OversizedFace {
            filter,
            width: b.width,
            height: b.height,
        });
    }
    Ok(())
}

fn offset(p: Point, dx: f32, dy: f32) -> Point {
    Point::new(p.x + dx, p.y + dy)
}

fn dog(canvas: &mut Canvas, lm: &FaceLandmarks, face_width: f32, t: f32) {
    let ear = face_width * 0.25;
    let left = offset(lm.left_eye, -ear * 0.6, -ear * 0.8);
    let right = offset(lm.right_eye, ear * 0.6, -ear * 0.8);

    canvas.fill_ellipse(left, ear * 0.4, ear * 0.8, -PI / 4.0, DOG_EAR);
    canvas.fill_ellipse(right, ear * 0.4, ear * 0.8, PI / 4.0, DOG_EAR);
    canvas.fill_ellipse(left, ear * 0.2, ear * 0.5, -PI / 4.0, DOG_INNER_EAR);
    canvas.fill_ellipse(right, ear * 0.2, ear * 0.5, PI / 4.0, DOG_INNER_EAR);

    canvas.fill_ellipse(lm.nose, 18.0, 12.0, 0.0, BLACK);
    canvas.fill_ellipse(offset(lm.nose, -5.0, -3.0), 4.0, 3.0, 0.0, NOSE_HIGHLIGHT);

    let bob = (t * 0.1).sin() * 5.0;
    canvas.fill_ellipse(offset(lm.mouth, 0.0, 25.0 + bob), 25.0, 35.0, 0.0, TONGUE);
    canvas.line(offset(lm.mouth, 0.0, 10.0), offset(lm.mouth, 0.0, 50.0 + bob), 2.0, TONGUE_LINE);
}

fn cat(canvas: &mut Canvas, lm: &FaceLandmarks, face_width: f32, t: f32) {
    let ear = face_width * 0.2;
    let (l, r) = (lm.left_eye, lm.right_eye);
    canvas.fill_polygon(
        &[offset(l, -ear, -ear), offset(l, -ear / 3.0, -ear / 3.0), offset(l, ear / 3.0, -ear)],
        CAT_EAR,
    );
    canvas.fill_polygon(
        &[offset(r, -ear / 3.0, -ear), offset(r, ear / 3.0, -ear / 3.0), offset(r, ear, -ear)],
        CAT_EAR,
    );

    let wobble = (t * 0.05).sin() * 2.0;
    let n = lm.nose;
    for side in [-1.0_f32, 1.0] {
        let whiskers = [
            ((-10.0 + wobble), (-15.0 + wobble)),
            (0.0, 0.0),
            ((10.0 - wobble), (15.0 - wobble)),
        ];
        for (inner_dy, outer_dy) in whiskers {
            canvas.line(offset(n, side * 40.0, inner_dy), offset(n, side * 80.0, outer_dy), 3.0, BLACK);
        }
    }

    canvas.fill_polygon(&[offset(n, 0.0, -8.0), offset(n, -8.0, 5.0), offset(n, 8.0, 5.0)], PINK);
}

fn bunny(canvas: &mut Canvas, lm: &FaceLandmarks, face_width: f32, t: f32) {
    let ear = face_width * 0.15;
    let bounce = (t * 0.1).sin() * 5.0;
    let ears = [
        (offset(lm.left_eye, -ear / 2.0, -ear * 2.0 + bounce), -PI / 6.0),
        (offset(lm.right_eye, ear / 2.0, -ear * 2.0 + bounce), PI / 6.0),
    ];
    for (center, tilt) in ears {
        canvas.fill_ellipse(center, ear / 3.0, ear * 1.5, tilt, WHITE);
        canvas.stroke_ellipse(center, ear / 3.0, ear * 1.5, tilt, 3.0, PINK);
    }

    canvas.fill_ellipse(lm.nose, 8.0, 6.0, 0.0, PINK);

    let m = lm.mouth;
    for dx in [-8.0, 2.0] {
        canvas.fill_rect(m.x + dx, m.y + 5.0, 6.0, 15.0, WHITE);
        canvas.stroke_rect(m.x + dx, m.y + 5.0, 6.0, 15.0, BLACK);
    }
}

fn glasses(canvas: &mut Canvas, lm: &FaceLandmarks, face_width: f32) {
    let w = face_width * 0.15;
    let h = w * 0.8;
    let (l, r) = (lm.left_eye, lm.right_eye);

    for eye in [l, r] {
        canvas.fill_ellipse(eye, w, h, 0.0, rgba(0, 0, 0, 0.3));
        canvas.stroke_ellipse(eye, w, h, 0.0, 4.0, BLACK);
    }

    canvas.line(offset(l, w, 0.0), offset(r, -w, 0.0), 4.0, BLACK);
    canvas.line(offset(l, -w, 0.0), offset(l, -w * 2.0, 10.0), 4.0, BLACK);
    canvas.line(offset(r, w, 0.0), offset(r, w * 2.0, 10.0), 4.0, BLACK);

    for eye in [l, r] {
        canvas.fill_ellipse(offset(eye, -w * 0.3, -h * 0.3), w * 0.3, h * 0.5, 0.0, rgba(255, 255, 255, 0.3));
    }
}

/// Mark the index fingertip of a raised hand. Lowered hands draw nothing.
pub fn draw_hand_marker(canvas: &mut Canvas, hand: &Hand) -> Result<(), RenderError> {
    if !hand.is_raised {
        return Ok(());
    }
    let tip = hand
        .index_tip()
        .ok_or(RenderError::IncompleteHand(hand.landmarks.len()))?;
    if !tip.is_finite() {
        return Err(RenderError::NonFiniteGeometry { filter: "hand-marker" });
    }

    canvas.fill_circle(tip, HAND_MARKER_RADIUS, MARKER);
    canvas.fill_polygon(&star(tip, HAND_MARKER_RADIUS * 0.6, HAND_MARKER_RADIUS * 0.25), MARKER_STAR);
    Ok(())
}

/// Five-pointed star, point up
fn star(center: Point, outer: f32, inner: f32) -> Vec<Point> {
    (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = -PI / 2.0 + i as f32 * PI / 5.0;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}
