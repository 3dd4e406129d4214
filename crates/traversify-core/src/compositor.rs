//! Writing regions into layers.
//!
//! This is the only code that mutates layer pixels, and every write checks the
//! other layers first: a pixel already claimed elsewhere is skipped, so no
//! coordinate ever ends up non-transparent in two layers.

use crate::color::Rgba;
use crate::error::{EngineError, EngineResult};
use crate::layers::{LayerKind, LayerStore};
use crate::pixels::{Dimensions, PixelBuffer, PixelCoord};
use crate::raster::dilation_ring;
use crate::region::PixelRegion;

/// What happened to a region handed to [`apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintReport {
    /// Pixels in the region.
    pub requested: usize,
    /// Pixels written.
    pub painted: usize,
    /// Pixels skipped because another layer owns them.
    pub blocked: usize,
}

impl PaintReport {
    pub fn is_partial(&self) -> bool {
        self.blocked > 0
    }

    fn merge(&mut self, other: PaintReport) {
        self.requested += other.requested;
        self.painted += other.painted;
        self.blocked += other.blocked;
    }
}

fn check_bounds(store: &LayerStore, region: &PixelRegion) -> EngineResult<()> {
    let (expected, actual) = (store.dimensions(), region.bounds());
    if expected != actual {
        return Err(EngineError::DimensionMismatch {
            expected: (expected.width, expected.height),
            actual: (actual.width, actual.height),
        });
    }
    Ok(())
}

/// Paint `region` into the `kind` layer.
///
/// At full opacity the pixel is replaced; below it the color is blended over
/// what the layer already holds.
pub fn apply(
    store: &mut LayerStore,
    kind: LayerKind,
    region: &PixelRegion,
    color: Rgba,
    opacity: f32,
) -> EngineResult<PaintReport> {
    check_bounds(store, region)?;

    let mut report = PaintReport {
        requested: region.len(),
        ..PaintReport::default()
    };
    for index in region.indices() {
        if store.claimed_by_other(kind, index) {
            report.blocked += 1;
            continue;
        }
        let pixels = &mut store.layer_mut(kind).pixels;
        let painted = if opacity >= 1.0 {
            color
        } else {
            color.blend_over(pixels.at(index), opacity)
        };
        pixels.set_at(index, painted);
        report.painted += 1;
    }

    log::debug!(
        "Painted {}/{} pixels on {} layer ({} blocked)",
        report.painted,
        report.requested,
        kind,
        report.blocked
    );
    Ok(report)
}

/// Make every pixel of `region` transparent in the `kind` layer.
///
/// Returns the number of pixels that were not already transparent.
pub fn erase(store: &mut LayerStore, kind: LayerKind, region: &PixelRegion) -> EngineResult<usize> {
    check_bounds(store, region)?;

    let pixels = &mut store.layer_mut(kind).pixels;
    let mut erased = 0;
    for index in region.indices() {
        if pixels.alpha_at(index) != 0 {
            erased += 1;
        }
        pixels.set_at(index, Rgba::TRANSPARENT);
    }
    Ok(erased)
}

/// Make the whole `kind` layer transparent.
pub fn clear(store: &mut LayerStore, kind: LayerKind) {
    store.layer_mut(kind).pixels.clear();
}

/// Grow every painted blob in the `kind` layer by one pixel.
///
/// Each new pixel copies the color of an already painted 8-neighbor, scanning
/// neighbors row by row. Pixels owned by another layer are left alone.
pub fn thicken(store: &mut LayerStore, kind: LayerKind) -> PaintReport {
    let before = store.layer(kind).pixels().clone();
    let ring = dilation_ring(&opaque_region(&before));
    let dims = before.dimensions();

    let mut report = PaintReport {
        requested: ring.len(),
        ..PaintReport::default()
    };
    for coord in ring.iter() {
        let index = dims.index_of(coord);
        if store.claimed_by_other(kind, index) {
            report.blocked += 1;
            continue;
        }
        if let Some(color) = painted_neighbor(&before, coord) {
            store.layer_mut(kind).pixels.set_at(index, color);
            report.painted += 1;
        }
    }
    report
}

/// [`thicken`] every layer in stacking order.
pub fn thicken_all(store: &mut LayerStore) -> PaintReport {
    let mut total = PaintReport::default();
    for kind in LayerKind::ALL {
        total.merge(thicken(store, kind));
    }
    total
}

/// Coordinates of every non-transparent pixel.
pub fn opaque_region(pixels: &PixelBuffer) -> PixelRegion {
    let dims = pixels.dimensions();
    PixelRegion::from_indices(
        dims,
        (0..dims.pixel_count()).filter(|&i| pixels.alpha_at(i) != 0).collect(),
    )
}

fn painted_neighbor(pixels: &PixelBuffer, coord: PixelCoord) -> Option<Rgba> {
    let dims = pixels.dimensions();
    let (x, y) = (i64::from(coord.x), i64::from(coord.y));
    for dy in -1..=1 {
        for dx in -1..=1 {
            let (nx, ny) = (x + dx, y + dy);
            if (dx, dy) == (0, 0) || !dims.contains_signed(nx, ny) {
                continue;
            }
            let color = pixels.at(dims.index_of(PixelCoord::new(nx as u32, ny as u32)));
            if !color.is_transparent() {
                return Some(color);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::SourceImage;
    use crate::raster::circle_region;
    use std::sync::Arc;

    fn store(width: u32, height: u32) -> LayerStore {
        let image = SourceImage::from_buffer(PixelBuffer::filled(width, height, Rgba::WHITE)).unwrap();
        LayerStore::new(Arc::new(image))
    }

    fn row(dims: Dimensions, y: u32, xs: std::ops::Range<u32>) -> PixelRegion {
        PixelRegion::from_coords(dims, xs.map(|x| PixelCoord::new(x, y)))
    }

    #[test]
    fn test_apply_replaces_at_full_opacity() {
        let mut store = store(32, 32);
        let region = circle_region(PixelCoord::new(10, 10), 2, store.dimensions());
        let report = apply(&mut store, LayerKind::Traversable, &region, Rgba::GREEN, 1.0).unwrap();
        assert_eq!(
            report,
            PaintReport {
                requested: 13,
                painted: 13,
                blocked: 0
            }
        );
        let layer = store.layer(LayerKind::Traversable);
        assert_eq!(layer.painted_count(), 13);
        assert_eq!(layer.pixels().get(PixelCoord::new(10, 10)), Some(Rgba::GREEN));
    }

    #[test]
    fn test_apply_blocked_by_other_layer() {
        let mut store = store(8, 1);
        let dims = store.dimensions();
        apply(&mut store, LayerKind::NonTraversable, &row(dims, 0, 0..4), Rgba::RED, 1.0).unwrap();

        let report = apply(&mut store, LayerKind::Traversable, &row(dims, 0, 2..8), Rgba::GREEN, 1.0).unwrap();
        assert_eq!(report.requested, 6);
        assert_eq!(report.painted, 4);
        assert_eq!(report.blocked, 2);
        assert!(report.is_partial());
        assert!(store.is_exclusive());
        assert_eq!(
            store.layer(LayerKind::NonTraversable).pixels().get(PixelCoord::new(2, 0)),
            Some(Rgba::RED)
        );
    }

    #[test]
    fn test_apply_blends_below_full_opacity() {
        let mut store = store(2, 1);
        let dims = store.dimensions();
        let region = row(dims, 0, 0..1);
        apply(&mut store, LayerKind::Traversable, &region, Rgba::GREEN, 0.5).unwrap();
        let first = store.layer(LayerKind::Traversable).pixels().at(0);
        assert_eq!(first.g, 255);
        assert_eq!(first.a, 128);

        apply(&mut store, LayerKind::Traversable, &region, Rgba::GREEN, 0.5).unwrap();
        let second = store.layer(LayerKind::Traversable).pixels().at(0);
        assert!(second.a > first.a);
    }

    #[test]
    fn test_apply_rejects_foreign_region() {
        let mut store = store(4, 4);
        let region = PixelRegion::new(Dimensions::new(5, 4));
        assert!(matches!(
            apply(&mut store, LayerKind::Traversable, &region, Rgba::GREEN, 1.0),
            Err(EngineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_erase_only_touches_own_layer() {
        let mut store = store(8, 1);
        let dims = store.dimensions();
        apply(&mut store, LayerKind::Traversable, &row(dims, 0, 0..4), Rgba::GREEN, 1.0).unwrap();
        apply(&mut store, LayerKind::NonTraversable, &row(dims, 0, 4..8), Rgba::RED, 1.0).unwrap();

        let erased = erase(&mut store, LayerKind::Traversable, &row(dims, 0, 2..6)).unwrap();
        assert_eq!(erased, 2);
        assert_eq!(store.layer(LayerKind::Traversable).painted_count(), 2);
        assert_eq!(store.layer(LayerKind::NonTraversable).painted_count(), 4);
    }

    #[test]
    fn test_erase_frees_pixels_for_other_layer() {
        let mut store = store(4, 1);
        let dims = store.dimensions();
        let all = row(dims, 0, 0..4);
        apply(&mut store, LayerKind::Traversable, &all, Rgba::GREEN, 1.0).unwrap();
        erase(&mut store, LayerKind::Traversable, &all).unwrap();
        let report = apply(&mut store, LayerKind::NonTraversable, &all, Rgba::RED, 1.0).unwrap();
        assert_eq!(report.painted, 4);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = store(6, 6);
        let region = circle_region(PixelCoord::new(3, 3), 1, store.dimensions());
        apply(&mut store, LayerKind::NonTraversable, &region, Rgba::BLUE, 1.0).unwrap();

        clear(&mut store, LayerKind::NonTraversable);
        let once = store.layer(LayerKind::NonTraversable).pixels().clone();
        clear(&mut store, LayerKind::NonTraversable);
        assert_eq!(store.layer(LayerKind::NonTraversable).pixels(), &once);
        assert_eq!(once.opaque_count(), 0);
    }

    #[test]
    fn test_thicken_copies_neighbor_color() {
        let mut store = store(7, 7);
        let dims = store.dimensions();
        let dot = PixelRegion::from_coords(dims, [PixelCoord::new(3, 3)]);
        apply(&mut store, LayerKind::Traversable, &dot, Rgba::YELLOW, 1.0).unwrap();

        let report = thicken(&mut store, LayerKind::Traversable);
        assert_eq!(report.painted, 8);
        let layer = store.layer(LayerKind::Traversable);
        assert_eq!(layer.painted_count(), 9);
        assert_eq!(layer.pixels().get(PixelCoord::new(2, 2)), Some(Rgba::YELLOW));
    }

    #[test]
    fn test_thicken_respects_exclusivity() {
        let mut store = store(5, 1);
        let dims = store.dimensions();
        apply(&mut store, LayerKind::Traversable, &row(dims, 0, 0..2), Rgba::GREEN, 1.0).unwrap();
        apply(&mut store, LayerKind::NonTraversable, &row(dims, 0, 2..3), Rgba::RED, 1.0).unwrap();

        let report = thicken_all(&mut store);
        assert!(store.is_exclusive());
        // Traversable is blocked at x=2; non-traversable then grows into x=3.
        assert_eq!(report.blocked, 2);
        assert_eq!(store.layer(LayerKind::Traversable).painted_count(), 2);
        assert_eq!(store.layer(LayerKind::NonTraversable).painted_count(), 2);
    }
}
