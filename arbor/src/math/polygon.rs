//! Rectangle vertices and polygon containment for hit testing

use super::transform::rotate;
use super::Size;
use glam::Vec2;

/// Corners of a node rectangle in its container space
///
/// Corners start at `-anchor * size`, then are scaled, rotated and finally
/// translated to `position`.
pub fn rect_vertices(
    position: Vec2,
    size: Size,
    scale: Vec2,
    anchor: Vec2,
    rotation: f32,
) -> [Vec2; 4] {
    let offset = anchor * size.as_vec2();
    let corners = [
        Vec2::new(-offset.x, -offset.y),
        Vec2::new(size.width - offset.x, -offset.y),
        Vec2::new(size.width - offset.x, size.height - offset.y),
        Vec2::new(-offset.x, size.height - offset.y),
    ];
    corners.map(|corner| rotate(corner * scale, rotation) + position)
}

/// Ray-casting point-in-polygon test; an odd number of crossings is inside
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        let crosses = (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// True when every vertex of `inner` lies inside `outer` and no edges cross
pub fn polygon_contains(outer: &[Vec2], inner: &[Vec2]) -> bool {
    if !inner.iter().all(|&p| point_in_polygon(p, outer)) {
        return false;
    }

    !edges(inner).any(|(a, b)| edges(outer).any(|(c, d)| segments_intersect(a, b, c, d)))
}

fn edges(polygon: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + n - 1) % n]))
}

fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

fn ccw(a: Vec2, b: Vec2, c: Vec2) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_centered_rect_vertices() {
        let v = rect_vertices(
            Vec2::new(10.0, 10.0),
            Size::new(4.0, 2.0),
            Vec2::ONE,
            Vec2::splat(0.5),
            0.0,
        );
        assert_eq!(v[0], Vec2::new(8.0, 9.0));
        assert_eq!(v[2], Vec2::new(12.0, 11.0));
    }

    #[test]
    fn test_anchor_and_scale_applied_before_rotation() {
        let v = rect_vertices(
            Vec2::ZERO,
            Size::new(2.0, 2.0),
            Vec2::new(2.0, 1.0),
            Vec2::ZERO,
            std::f32::consts::FRAC_PI_2,
        );
        // corner (2,0) scaled to (4,0) then rotated to (0,4)
        assert!((v[1] - Vec2::new(0.0, 4.0)).length() < 1e-4);
    }

    #[test]
    fn test_point_in_rotated_rect() {
        let v = rect_vertices(Vec2::ZERO, Size::new(10.0, 10.0), Vec2::ONE, Vec2::splat(0.5), FRAC_PI_4);
        assert!(point_in_polygon(Vec2::ZERO, &v));
        assert!(point_in_polygon(Vec2::new(0.0, 6.5), &v));
        // axis-aligned corner is outside once rotated by 45 degrees
        assert!(!point_in_polygon(Vec2::new(4.8, 4.8), &v));
    }

    #[test]
    fn test_non_convex_polygon() {
        // U shape opening upwards
        let u = [
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(2.0, 3.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(0.0, 3.0),
        ];
        assert!(point_in_polygon(Vec2::new(0.5, 2.0), &u));
        assert!(point_in_polygon(Vec2::new(1.5, 0.5), &u));
        assert!(!point_in_polygon(Vec2::new(1.5, 2.0), &u));
    }

    #[test]
    fn test_degenerate_polygon() {
        assert!(!point_in_polygon(Vec2::ZERO, &[Vec2::ZERO, Vec2::ONE]));
    }

    #[test]
    fn test_polygon_contains() {
        let outer = rect_vertices(Vec2::ZERO, Size::new(10.0, 10.0), Vec2::ONE, Vec2::splat(0.5), 0.0);
        let inner = rect_vertices(Vec2::ZERO, Size::new(2.0, 2.0), Vec2::ONE, Vec2::splat(0.5), 0.3);
        let straddling = rect_vertices(Vec2::new(5.0, 0.0), Size::new(2.0, 2.0), Vec2::ONE, Vec2::splat(0.5), 0.0);
        assert!(polygon_contains(&outer, &inner));
        assert!(!polygon_contains(&outer, &straddling));
    }
}
