//! Annotation layers and the store that owns them.

use crate::color::Rgba;
use crate::pixels::{Dimensions, PixelBuffer, SourceImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Which annotation a layer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerKind {
    Traversable,
    NonTraversable,
}

impl LayerKind {
    /// Every kind, in stacking order (bottom first).
    pub const ALL: [LayerKind; 2] = [LayerKind::Traversable, LayerKind::NonTraversable];

    /// Tint used when showing the layer over the source image.
    pub fn default_overlay(self) -> Rgba {
        match self {
            LayerKind::Traversable => Rgba::GREEN,
            LayerKind::NonTraversable => Rgba::RED,
        }
    }

    fn slot(self) -> usize {
        match self {
            LayerKind::Traversable => 0,
            LayerKind::NonTraversable => 1,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Traversable => write!(f, "traversable"),
            LayerKind::NonTraversable => write!(f, "non-traversable"),
        }
    }
}

/// One annotation layer, sized to the source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    kind: LayerKind,
    pub(crate) pixels: PixelBuffer,
    /// Display tint; has no effect on stored pixels.
    pub overlay_color: Rgba,
    /// Display-only; hidden layers are still painted, merged and exported.
    pub visible: bool,
}

impl Layer {
    fn new(kind: LayerKind, dims: Dimensions) -> Self {
        Self {
            kind,
            pixels: PixelBuffer::new(dims.width, dims.height),
            overlay_color: kind.default_overlay(),
            visible: true,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Number of annotated (non-transparent) pixels.
    pub fn painted_count(&self) -> usize {
        self.pixels.opaque_count()
    }
}

/// The source image plus one layer per [`LayerKind`].
///
/// All layers share the image's dimensions. Writes go through the compositor,
/// which keeps every pixel claimed by at most one layer.
#[derive(Debug, Clone)]
pub struct LayerStore {
    id: Uuid,
    source: Arc<SourceImage>,
    layers: Vec<Layer>,
}

impl LayerStore {
    /// Fresh, empty layers for a newly loaded image.
    pub fn new(source: Arc<SourceImage>) -> Self {
        let dims = source.dimensions();
        Self {
            id: Uuid::new_v4(),
            layers: LayerKind::ALL.iter().map(|&kind| Layer::new(kind, dims)).collect(),
            source,
        }
    }

    /// Identifier of this load, for correlating log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &Arc<SourceImage> {
        &self.source
    }

    pub fn dimensions(&self) -> Dimensions {
        self.source.dimensions()
    }

    pub fn layer(&self, kind: LayerKind) -> &Layer {
        &self.layers[kind.slot()]
    }

    pub(crate) fn layer_mut(&mut self, kind: LayerKind) -> &mut Layer {
        &mut self.layers[kind.slot()]
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn set_visible(&mut self, kind: LayerKind, visible: bool) {
        self.layer_mut(kind).visible = visible;
    }

    /// Flip a layer's visibility, returning the new state.
    pub fn toggle_visible(&mut self, kind: LayerKind) -> bool {
        let layer = self.layer_mut(kind);
        layer.visible = !layer.visible;
        layer.visible
    }

    pub fn set_overlay_color(&mut self, kind: LayerKind, color: Rgba) {
        self.layer_mut(kind).overlay_color = color;
    }

    /// Whether a layer other than `kind` has a non-transparent pixel at `index`.
    pub fn claimed_by_other(&self, kind: LayerKind, index: usize) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.kind != kind && layer.pixels.alpha_at(index) != 0)
    }

    /// The layer holding a non-transparent pixel at `index`, if any.
    pub fn owner_of(&self, index: usize) -> Option<LayerKind> {
        self.layers
            .iter()
            .find(|layer| layer.pixels.alpha_at(index) != 0)
            .map(|layer| layer.kind)
    }

    /// Whether no pixel is non-transparent in more than one layer.
    pub fn is_exclusive(&self) -> bool {
        (0..self.dimensions().pixel_count()).all(|index| {
            self.layers
                .iter()
                .filter(|layer| layer.pixels.alpha_at(index) != 0)
                .count()
                <= 1
        })
    }
}
