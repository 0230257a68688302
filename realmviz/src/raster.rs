//! Software rasterization of cell polygons onto the output canvas.
//!
//! Polygons arrive already projected to canvas coordinates. Filling is a
//! classic even-odd scanline walk sampled at pixel centers; outlines step
//! along each edge at sub-pixel increments. Span computation is separated
//! from pixel writes so callers can fan polygon work out across threads and
//! apply the results to one image serially.

use image::{Rgb, RgbImage};

/// A horizontal run of pixels: row, first column, last column (inclusive).
pub type Span = (u32, u32, u32);

/// Compute the filled spans of one polygon, clipped to a `width`×`height`
/// canvas. Degenerate polygons (fewer than 3 vertices) produce nothing.
pub fn polygon_spans(points: &[(f32, f32)], width: u32, height: u32) -> Vec<Span> {
    if points.len() < 3 {
        return Vec::new();
    }

    let min_y = points
        .iter()
        .map(|p| p.1)
        .fold(f32::INFINITY, f32::min)
        .max(0.0);
    let max_y = points
        .iter()
        .map(|p| p.1)
        .fold(f32::NEG_INFINITY, f32::max)
        .min(height as f32 - 1.0);
    if min_y > max_y {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut crossings: Vec<f32> = Vec::new();

    for row in min_y.floor() as i64..=max_y.ceil() as i64 {
        if row < 0 || row >= height as i64 {
            continue;
        }
        let sample_y = row as f32 + 0.5;
        crossings.clear();

        for i in 0..points.len() {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % points.len()];
            // Half-open rule on Y so shared vertices count once.
            if (y0 <= sample_y) != (y1 <= sample_y) {
                let t = (sample_y - y0) / (y1 - y0);
                crossings.push(x0 + t * (x1 - x0));
            }
        }
        crossings.sort_unstable_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let left = pair[0].max(0.0).round() as i64;
            let right = pair[1].min(width as f32 - 1.0).round() as i64;
            if left <= right {
                spans.push((row as u32, left as u32, right as u32));
            }
        }
    }

    spans
}

/// Write spans into the image with one color.
pub fn apply_spans(img: &mut RgbImage, spans: &[Span], color: Rgb<u8>) {
    for &(y, x0, x1) in spans {
        for x in x0..=x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// Stroke the polygon boundary, `thickness` pixels wide.
pub fn outline_polygon(img: &mut RgbImage, points: &[(f32, f32)], color: Rgb<u8>, thickness: u32) {
    if points.len() < 2 {
        return;
    }
    let (width, height) = img.dimensions();
    let radius = (thickness / 2) as i64;

    for i in 0..points.len() {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % points.len()];
        let steps = ((x1 - x0).abs().max((y1 - y0).abs()).ceil() as u32).max(1);
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let cx = (x0 + t * (x1 - x0)).round() as i64;
            let cy = (y0 + t * (y1 - y0)).round() as i64;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let (px, py) = (cx + dx, cy + dy);
                    if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                        img.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_fill_covers_interior() {
        let square = [(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)];
        let spans = polygon_spans(&square, 16, 16);

        let mut img = RgbImage::new(16, 16);
        apply_spans(&mut img, &spans, Rgb([255, 0, 0]));

        assert_eq!(img.get_pixel(5, 5), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(3, 7), &Rgb([255, 0, 0]));
        // Well outside stays untouched.
        assert_eq!(img.get_pixel(12, 12), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_degenerate_polygon_is_empty() {
        assert!(polygon_spans(&[(1.0, 1.0), (2.0, 2.0)], 16, 16).is_empty());
        assert!(polygon_spans(&[], 16, 16).is_empty());
    }

    #[test]
    fn test_spans_clip_to_canvas() {
        let square = [(-5.0, -5.0), (5.0, -5.0), (5.0, 5.0), (-5.0, 5.0)];
        for (y, x0, x1) in polygon_spans(&square, 8, 8) {
            assert!(y < 8);
            assert!(x0 <= x1 && x1 < 8);
        }
    }

    #[test]
    fn test_outline_touches_boundary_not_center() {
        let square = [(2.0, 2.0), (12.0, 2.0), (12.0, 12.0), (2.0, 12.0)];
        let mut img = RgbImage::new(16, 16);
        outline_polygon(&mut img, &square, Rgb([0, 255, 0]), 1);
        assert_eq!(img.get_pixel(2, 2), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(7, 2), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(7, 7), &Rgb([0, 0, 0]));
    }
}
