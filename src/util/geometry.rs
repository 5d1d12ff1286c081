// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Axis-aligned rectangles, the coordinate transforms between canvas pixels
//! and a scaled on-screen view, and distance helpers used for hit testing.

use crate::models::Point;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rectangle containing every point, grown by `margin`.
    pub fn bounding(points: &[Point], margin: f64) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x - margin,
            min_y - margin,
            max_x - min_x + 2.0 * margin,
            max_y - min_y + 2.0 * margin,
        ))
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// Scale that fits a canvas inside the available view, keeping aspect ratio.
pub fn fit_scale(canvas_width: u32, canvas_height: u32, view_width: f64, view_height: f64) -> f64 {
    if canvas_width == 0 || canvas_height == 0 {
        return 1.0;
    }
    let sx = view_width / canvas_width as f64;
    let sy = view_height / canvas_height as f64;
    sx.min(sy)
}

/// Convert a view position to canvas pixel coordinates.
pub fn view_to_canvas(view: Point, origin: Point, scale: f64) -> Point {
    Point {
        x: (view.x - origin.x) / scale,
        y: (view.y - origin.y) / scale,
    }
}

/// Convert canvas pixel coordinates to a view position.
pub fn canvas_to_view(point: Point, origin: Point, scale: f64) -> Point {
    Point {
        x: origin.x + point.x * scale,
        y: origin.y + point.y * scale,
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Whether `p` lies inside the triangle `a`, `b`, `c` (either winding).
pub fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let sign = |p1: Point, p2: Point, p3: Point| {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_canvas_roundtrip() {
        let origin = Point::new(40.0, 25.0);
        let scale = 0.5;
        let canvas = Point::new(960.0, 540.0);

        let view = canvas_to_view(canvas, origin, scale);
        let back = view_to_canvas(view, origin, scale);

        assert!((back.x - canvas.x).abs() < 0.0001);
        assert!((back.y - canvas.y).abs() < 0.0001);
    }

    #[test]
    fn test_fit_scale_uses_tighter_axis() {
        assert_eq!(fit_scale(1920, 1080, 960.0, 1080.0), 0.5);
        assert_eq!(fit_scale(800, 600, 1600.0, 600.0), 1.0);
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0);
    }

    #[test]
    fn test_point_in_triangle() {
        let (a, b, c) = (Point::new(5.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0));
        assert!(point_in_triangle(Point::new(5.0, 5.0), a, b, c));
        assert!(!point_in_triangle(Point::new(0.5, 0.5), a, b, c));
    }
}
