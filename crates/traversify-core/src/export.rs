//! Flattening layers into one annotation image.

use crate::color::Rgba;
use crate::layers::{LayerKind, LayerStore};
use crate::pixels::PixelBuffer;

/// Layer order used by [`merge`] unless configured otherwise.
///
/// Obstacles win over walkable areas wherever both were somehow painted.
pub const DEFAULT_PRECEDENCE: [LayerKind; 2] = [LayerKind::NonTraversable, LayerKind::Traversable];

/// Composite all layers into a single buffer.
///
/// `precedence` lists layers from highest to lowest priority; the first layer
/// with a non-transparent pixel at a coordinate supplies it. Layers missing
/// from `precedence` are ignored. Pixels empty everywhere stay transparent.
pub fn merge(store: &LayerStore, precedence: &[LayerKind]) -> PixelBuffer {
    let dims = store.dimensions();
    let mut out = PixelBuffer::new(dims.width, dims.height);

    for index in 0..dims.pixel_count() {
        let winner = precedence
            .iter()
            .map(|&kind| store.layer(kind).pixels().at(index))
            .find(|color| !color.is_transparent());
        out.set_at(index, winner.unwrap_or(Rgba::TRANSPARENT));
    }
    out
}

/// File stem for a saved annotation, e.g. `Annotation_Forest`.
///
/// The persistence layer appends its own timestamp and extension. Characters
/// that are awkward in file names are replaced with `_`.
pub fn annotation_file_stem(map_type: &str) -> String {
    let cleaned: String = map_type
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "Annotation".to_string()
    } else {
        format!("Annotation_{cleaned}")
    }
}
