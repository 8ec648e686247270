// SPDX-License-Identifier: GPL-3.0-only

//! Anti-aliased shape rasterization
//!
//! Shapes are signed distance functions in device pixels, negative inside.
//! Coverage is `clamp(0.5 - distance)`, a one pixel edge ramp. Everything is
//! blended source-over onto an opaque canvas.

use crate::catalog::Shape;
use crate::color::Rgb;
use crate::pipelines::composition::Rect;
use image::RgbaImage;
use std::f32::consts::{FRAC_PI_2, PI};

pub type Point = (f32, f32);

/// Inner to outer radius of the five-point star
const STAR_INNER_RATIO: f32 = 0.382;

/// Samples along the heart curve
const HEART_SEGMENTS: usize = 72;

fn channels(color: Rgb) -> [f32; 3] {
    [color.r as f32, color.g as f32, color.b as f32]
}

/// Source-over blend of `color` at `alpha` into an opaque pixel
pub fn blend_pixel(canvas: &mut RgbaImage, x: u32, y: u32, color: [f32; 3], alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let alpha = alpha.min(1.0);
    let pixel = canvas.get_pixel_mut(x, y);
    for (dst, src) in pixel.0.iter_mut().zip(color) {
        let d = *dst as f32;
        *dst = (d + (src - d) * alpha).round().clamp(0.0, 255.0) as u8;
    }
    pixel.0[3] = 255;
}

/// Pixel span `(x0, y0, x1, y1)` touched by `bounds`, clipped to the canvas
fn pixel_span(canvas: &RgbaImage, bounds: &Rect) -> Option<(u32, u32, u32, u32)> {
    let clip = |v: f32, max: u32| (v.max(0.0) as u32).min(max);
    let x0 = clip((bounds.x - 1.0).floor(), canvas.width());
    let y0 = clip((bounds.y - 1.0).floor(), canvas.height());
    let x1 = clip((bounds.right() + 1.0).ceil(), canvas.width());
    let y1 = clip((bounds.bottom() + 1.0).ceil(), canvas.height());
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Fill wherever `sdf` is negative, shading each pixel with `shade`
pub fn fill_sdf(
    canvas: &mut RgbaImage,
    bounds: &Rect,
    opacity: f32,
    sdf: impl Fn(Point) -> f32,
    shade: impl Fn(Point) -> [f32; 3],
) {
    let Some((x0, y0, x1, y1)) = pixel_span(canvas, bounds) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            let coverage = (0.5 - sdf(p)).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend_pixel(canvas, x, y, shade(p), coverage * opacity);
            }
        }
    }
}

pub fn sd_circle(p: Point, center: Point, radius: f32) -> f32 {
    (p.0 - center.0).hypot(p.1 - center.1) - radius
}

pub fn sd_rounded_rect(p: Point, rect: &Rect, radius: f32) -> f32 {
    let (cx, cy) = rect.center();
    let (hw, hh) = (rect.width / 2.0, rect.height / 2.0);
    let r = radius.min(hw).min(hh).max(0.0);
    let qx = (p.0 - cx).abs() - hw + r;
    let qy = (p.1 - cy).abs() - hh + r;
    let outside = qx.max(0.0).hypot(qy.max(0.0));
    let inside = qx.max(qy).min(0.0);
    outside + inside - r
}

/// Distance to a band of `width` lying just inside the rounded rect edge
pub fn sd_inner_ring(p: Point, rect: &Rect, radius: f32, width: f32) -> f32 {
    let half = width / 2.0;
    let mid = Rect::new(
        rect.x + half,
        rect.y + half,
        (rect.width - width).max(0.0),
        (rect.height - width).max(0.0),
    );
    sd_rounded_rect(p, &mid, (radius - half).max(0.0)).abs() - half
}

/// Signed distance to a closed polygon (even-odd winding)
pub fn sd_polygon(p: Point, vertices: &[Point]) -> f32 {
    let Some(&first) = vertices.first() else {
        return f32::MAX;
    };
    let dot = |a: Point, b: Point| a.0 * b.0 + a.1 * b.1;
    let sub = |a: Point, b: Point| (a.0 - b.0, a.1 - b.1);

    let mut dist = dot(sub(p, first), sub(p, first));
    let mut sign = 1.0;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        let e = sub(vj, vi);
        let w = sub(p, vi);
        let len = dot(e, e);
        let t = if len > 0.0 {
            (dot(w, e) / len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let b = (w.0 - e.0 * t, w.1 - e.1 * t);
        dist = dist.min(dot(b, b));

        let above = p.1 >= vi.1;
        let below = p.1 < vj.1;
        let left = e.0 * w.1 > e.1 * w.0;
        if (above && below && left) || (!above && !below && !left) {
            sign = -sign;
        }
        j = i;
    }
    sign * dist.sqrt()
}

/// Five-point star inscribed in `rect`, first point up
pub fn star_points(rect: &Rect) -> Vec<Point> {
    let (cx, cy) = rect.center();
    let outer = rect.width.min(rect.height) / 2.0;
    let inner = outer * STAR_INNER_RATIO;
    (0..10)
        .map(|i| {
            let angle = -FRAC_PI_2 + i as f32 * PI / 5.0;
            let r = if i % 2 == 0 { outer } else { inner };
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect()
}

/// Heart outline fitted to `rect`
pub fn heart_points(rect: &Rect) -> Vec<Point> {
    let curve: Vec<Point> = (0..HEART_SEGMENTS)
        .map(|i| {
            let t = i as f32 / HEART_SEGMENTS as f32 * 2.0 * PI;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos()
                - 5.0 * (2.0 * t).cos()
                - 2.0 * (3.0 * t).cos()
                - (4.0 * t).cos();
            // Screen y grows downwards
            (x, -y)
        })
        .collect();

    let (min_x, max_x, min_y, max_y) = curve.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |(a, b, c, d), &(x, y)| (a.min(x), b.max(x), c.min(y), d.max(y)),
    );
    let sx = rect.width / (max_x - min_x);
    let sy = rect.height / (max_y - min_y);
    curve
        .into_iter()
        .map(|(x, y)| (rect.x + (x - min_x) * sx, rect.y + (y - min_y) * sy))
        .collect()
}

/// Rotate `p` about `center` by `-degrees`, mapping it into the unrotated frame
fn unrotate(p: Point, center: Point, degrees: f32) -> Point {
    let (sin, cos) = (-degrees.to_radians()).sin_cos();
    let (dx, dy) = (p.0 - center.0, p.1 - center.1);
    (
        center.0 + dx * cos - dy * sin,
        center.1 + dx * sin + dy * cos,
    )
}

/// Draw a decoration shape into `rect` (device pixels)
///
/// `scale` converts the shape's logical stroke widths and radii.
pub fn draw_shape(canvas: &mut RgbaImage, shape: &Shape, rect: &Rect, opacity: f32, scale: f32) {
    match *shape {
        Shape::GradientCircle { from, to } => {
            let center = rect.center();
            let radius = rect.width.min(rect.height) / 2.0;
            let (from, to) = (channels(from), channels(to));
            let span = (rect.width + rect.height).max(f32::EPSILON);
            fill_sdf(
                canvas,
                rect,
                opacity,
                |p| sd_circle(p, center, radius),
                |p| {
                    let t = ((p.0 - rect.x + p.1 - rect.y) / span).clamp(0.0, 1.0);
                    [0, 1, 2].map(|c| from[c] + (to[c] - from[c]) * t)
                },
            );
        }
        Shape::Border {
            color,
            width,
            radius,
        } => {
            let (width, radius) = (width * scale, radius * scale);
            fill_sdf(
                canvas,
                rect,
                opacity,
                |p| sd_inner_ring(p, rect, radius, width),
                |_| channels(color),
            );
        }
        Shape::Star { color } => {
            let points = star_points(rect);
            fill_sdf(
                canvas,
                rect,
                opacity,
                |p| sd_polygon(p, &points),
                |_| channels(color),
            );
        }
        Shape::Heart { color } => {
            let points = heart_points(rect);
            fill_sdf(
                canvas,
                rect,
                opacity,
                |p| sd_polygon(p, &points),
                |_| channels(color),
            );
        }
        Shape::RotatedOutline {
            color,
            width,
            degrees,
        } => {
            let width = width * scale;
            let center = rect.center();
            let reach = rect.width.hypot(rect.height) / 2.0;
            let bounds = Rect::new(center.0 - reach, center.1 - reach, 2.0 * reach, 2.0 * reach);
            fill_sdf(
                canvas,
                &bounds,
                opacity,
                |p| sd_inner_ring(unrotate(p, center, degrees), rect, 0.0, width),
                |_| channels(color),
            );
        }
    }
}

/// Copy `image` to `(x, y)` masked by a rounded rectangle of its own size
pub fn blit_rounded(canvas: &mut RgbaImage, image: &RgbaImage, x: u32, y: u32, radius: f32) {
    let mask = Rect::new(x as f32, y as f32, image.width() as f32, image.height() as f32);
    let x1 = (x + image.width()).min(canvas.width());
    let y1 = (y + image.height()).min(canvas.height());
    for cy in y.min(y1)..y1 {
        for cx in x.min(x1)..x1 {
            let p = (cx as f32 + 0.5, cy as f32 + 0.5);
            let coverage = (0.5 - sd_rounded_rect(p, &mask, radius)).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let src = image.get_pixel(cx - x, cy - y).0;
            let alpha = coverage * src[3] as f32 / 255.0;
            blend_pixel(
                canvas,
                cx,
                cy,
                [src[0] as f32, src[1] as f32, src[2] as f32],
                alpha,
            );
        }
    }
}
