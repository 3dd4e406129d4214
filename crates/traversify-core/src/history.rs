//! Bounded undo history of whole-layer snapshots.

use crate::error::{EngineError, EngineResult};
use crate::layers::{LayerKind, LayerStore};
use crate::pixels::{Dimensions, PixelBuffer};
use std::collections::VecDeque;

/// Default number of undo states kept.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// A copy of every layer buffer at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoSnapshot {
    dims: Dimensions,
    layers: Vec<(LayerKind, PixelBuffer)>,
}

impl UndoSnapshot {
    /// Capture all layers of `store`.
    pub fn capture(store: &LayerStore) -> Self {
        Self {
            dims: store.dimensions(),
            layers: store
                .layers()
                .map(|layer| (layer.kind(), layer.pixels().clone()))
                .collect(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Stored pixels for one layer.
    pub fn layer(&self, kind: LayerKind) -> Option<&PixelBuffer> {
        self.layers.iter().find(|(k, _)| *k == kind).map(|(_, pixels)| pixels)
    }

    /// Write the captured pixels back into `store`.
    ///
    /// Fails without touching the store when the sizes differ.
    pub fn restore(&self, store: &mut LayerStore) -> EngineResult<()> {
        let dims = store.dimensions();
        if self.dims != dims {
            return Err(EngineError::DimensionMismatch {
                expected: (dims.width, dims.height),
                actual: (self.dims.width, self.dims.height),
            });
        }
        for (kind, pixels) in &self.layers {
            store.layer_mut(*kind).pixels.copy_from(pixels)?;
        }
        Ok(())
    }
}

/// Undo stack holding at most `max_depth` snapshots.
///
/// When full, the oldest snapshot is dropped to make room for the new one.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<UndoSnapshot>,
    max_depth: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl HistoryStack {
    /// Create an empty stack. A depth of zero is treated as one.
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            entries: VecDeque::with_capacity(max_depth),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the depth, dropping the oldest snapshots if there are too many.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
    }

    /// Record the current state of `store` (call before making changes).
    pub fn snapshot(&mut self, store: &LayerStore) {
        if self.entries.len() == self.max_depth {
            self.entries.pop_front();
        }
        self.entries.push_back(UndoSnapshot::capture(store));
    }

    /// Restore the most recent snapshot.
    ///
    /// Returns `Ok(false)` if there was nothing to undo. A snapshot of the
    /// wrong size is left on the stack and reported as an error.
    pub fn undo(&mut self, store: &mut LayerStore) -> EngineResult<bool> {
        let Some(snapshot) = self.entries.back() else {
            return Ok(false);
        };
        snapshot.restore(store)?;
        self.entries.pop_back();
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }
}
