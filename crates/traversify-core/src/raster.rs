//! Turning brush and eraser gestures into pixel regions.

use crate::pixels::{Dimensions, PixelCoord};
use crate::region::PixelRegion;
use kurbo::Point;

/// Every pixel within `radius` of `center` (`dx² + dy² ≤ r²`), clipped to `bounds`.
pub fn circle_region(center: PixelCoord, radius: u32, bounds: Dimensions) -> PixelRegion {
    let mut indices = Vec::new();
    stamp_circle(&mut indices, bounds, i64::from(center.x), i64::from(center.y), radius);
    PixelRegion::from_indices(bounds, indices)
}

fn stamp_circle(indices: &mut Vec<usize>, bounds: Dimensions, cx: i64, cy: i64, radius: u32) {
    let r = i64::from(radius);
    let rsq = r * r;
    for dy in -r..=r {
        for dx in -r..=r {
            let (x, y) = (cx + dx, cy + dy);
            if dx * dx + dy * dy <= rsq && bounds.contains_signed(x, y) {
                indices.push(bounds.index_of(PixelCoord::new(x as u32, y as u32)));
            }
        }
    }
}

/// The union of circles stamped along the segment `from → to`.
///
/// `ceil(distance)` steps are taken, sampling both endpoints, so consecutive
/// stamps are never more than one pixel apart and the stroke has no gaps.
pub fn line_stroke(from: PixelCoord, to: PixelCoord, radius: u32, bounds: Dimensions) -> PixelRegion {
    let start = Point::new(f64::from(from.x), f64::from(from.y));
    let end = Point::new(f64::from(to.x), f64::from(to.y));
    let steps = start.distance(end).ceil() as u64;
    if steps == 0 {
        return circle_region(from, radius, bounds);
    }

    let mut indices = Vec::new();
    for i in 0..=steps {
        let p = start.lerp(end, i as f64 / steps as f64);
        stamp_circle(&mut indices, bounds, p.x.round() as i64, p.y.round() as i64, radius);
    }
    PixelRegion::from_indices(bounds, indices)
}

/// Pixels 8-adjacent to `mask` that are not already part of it.
///
/// Adding the result to `mask` grows every blob by one pixel.
pub fn dilation_ring(mask: &PixelRegion) -> PixelRegion {
    let bounds = mask.bounds();
    let mut ring = Vec::new();
    for coord in mask.iter() {
        let (x, y) = (i64::from(coord.x), i64::from(coord.y));
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if (dx, dy) != (0, 0) && bounds.contains_signed(nx, ny) {
                    ring.push(bounds.index_of(PixelCoord::new(nx as u32, ny as u32)));
                }
            }
        }
    }
    PixelRegion::from_indices(bounds, ring).difference(mask)
}
