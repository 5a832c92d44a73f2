//! Skew estimation and rotation of binarized pages.

use image::{GrayImage, Luma};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;

/// Pixels darker than this count as ink.
const INK_LEVEL: u8 = 128;

/// Estimate the corrective rotation, in degrees, for a binarized page.
///
/// The minimum-area rectangle around all ink pixels gives the raw angle,
/// which is folded into [-45, 45]. A page with no ink yields 0.
pub fn skew_angle(image: &GrayImage) -> f32 {
    let points = ink_extremes(image);
    if is_degenerate(&points) {
        return 0.0;
    }

    let rect = min_area_rect(&points);
    let dx = (rect[1].x - rect[0].x) as f32;
    let dy = (rect[1].y - rect[0].y) as f32;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }

    corrective_angle(dy.atan2(dx).to_degrees())
}

/// Fold a rectangle edge angle into the minimal corrective rotation.
///
/// The raw angle is first brought into [-90, 0); angles below -45 are
/// folded by adding 90 and negating, the rest are negated.
pub fn corrective_angle(raw: f32) -> f32 {
    let mut angle = raw % 90.0;
    if angle >= 0.0 {
        angle -= 90.0;
    }

    let corrected = if angle < -45.0 {
        -(90.0 + angle)
    } else {
        -angle
    };

    // -0.0 reads badly in logs
    if corrected == 0.0 {
        0.0
    } else {
        corrected
    }
}

/// True when the points cannot span a rectangle: fewer than three, or all
/// on one line.
fn is_degenerate(points: &[Point<i32>]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let Some(second) = points.iter().find(|p| *p != first) else {
        return true;
    };
    let (ax, ay) = ((second.x - first.x) as i64, (second.y - first.y) as i64);
    points.iter().all(|p| {
        let (bx, by) = ((p.x - first.x) as i64, (p.y - first.y) as i64);
        ax * by - ay * bx == 0
    })
}

/// Leftmost and rightmost ink pixel of every row. Their convex hull equals
/// the hull of all ink pixels.
fn ink_extremes(image: &GrayImage) -> Vec<Point<i32>> {
    let mut points = Vec::new();
    for y in 0..image.height() {
        let mut first = None;
        let mut last = None;
        for x in 0..image.width() {
            if image.get_pixel(x, y)[0] < INK_LEVEL {
                first.get_or_insert(x);
                last = Some(x);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push(Point::new(first as i32, y as i32));
            if last != first {
                points.push(Point::new(last as i32, y as i32));
            }
        }
    }
    points
}

/// Rotate about the image centre by `degrees` with bicubic sampling.
/// Samples outside the image replicate the nearest edge pixel.
pub fn rotate_replicate(image: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if degrees == 0.0 || width == 0 || height == 0 {
        return image.clone();
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let sx = cx + dx * cos + dy * sin;
            let sy = cy - dx * sin + dy * cos;
            out.put_pixel(x, y, Luma([sample_bicubic(image, sx, sy)]));
        }
    }
    out
}

/// Catmull-Rom bicubic sample with edge clamping.
fn sample_bicubic(image: &GrayImage, x: f32, y: f32) -> u8 {
    let max_x = image.width() as i64 - 1;
    let max_y = image.height() as i64 - 1;
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let mut value = 0.0;
    for j in -1..=2i64 {
        let wy = cubic_weight(j as f32 - fy);
        let py = (y0 + j).clamp(0, max_y) as u32;
        for i in -1..=2i64 {
            let wx = cubic_weight(i as f32 - fx);
            let px = (x0 + i).clamp(0, max_x) as u32;
            value += image.get_pixel(px, py)[0] as f32 * wx * wy;
        }
    }

    value.round().clamp(0.0, 255.0) as u8
}

/// Cubic convolution kernel with a = -0.5.
fn cubic_weight(t: f32) -> f32 {
    const A: f32 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        (A + 2.0) * t * t * t - (A + 3.0) * t * t + 1.0
    } else if t < 2.0 {
        A * t * t * t - 5.0 * A * t * t + 8.0 * A * t - 4.0 * A
    } else {
        0.0
    }
}
