//! The annotation engine: owns the layers and dispatches input to tools.

use crate::color::Rgba;
use crate::compositor::{self, PaintReport};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::export;
use crate::grow::{GrowStep, RegionGrowth};
use crate::history::HistoryStack;
use crate::input::{DragStep, DragTracker, PointerEvent, PointerPhase};
use crate::layers::{Layer, LayerKind, LayerStore};
use crate::mapper::{DisplayTransform, View};
use crate::pixels::{PixelBuffer, PixelCoord, SourceImage};
use crate::raster;
use crate::region::PixelRegion;
use crate::tools::{ToolConfig, ToolKind, ToolManager, ToolState};
use kurbo::{Point, Size, Vec2};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No image loaded; painting and export fail with `NoActiveImage`.
    Uninitialized,
    Ready,
}

/// Result of an input event or command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Nothing happened (off-image pointer, stray move, no pending fill).
    Ignored,
    Painted(PaintReport),
    /// Number of pixels cleared.
    Erased(usize),
    StrokeEnded,
    FillStarted { seed: PixelCoord },
    FillPending { accepted: usize, queued: usize },
    Filled(PaintReport),
    /// The fill finished but nothing was written.
    FillSkipped { region_size: usize },
    /// Border color picked from the source image.
    Sampled(Rgba),
    Panned(Vec2),
    Undone,
    NothingToUndo,
    Cleared,
    Thickened(PaintReport),
}

#[derive(Debug)]
struct PendingFill {
    growth: RegionGrowth,
    layer: LayerKind,
    color: Rgba,
    opacity: f32,
}

/// Multi-layer raster annotation engine.
///
/// Configure with [`Engine::configure`], then hand it an image with
/// [`Engine::on_image_loaded`]. Reloading starts again with empty layers and
/// an empty history; tool settings carry over.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    tools: ToolManager,
    view: View,
    drag: DragTracker,
    history: HistoryStack,
    store: Option<LayerStore>,
    pending_fill: Option<PendingFill>,
    /// Pixels the current brush stroke has already written.
    stroke_touched: Option<PixelRegion>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with default settings and no image.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let mut engine = Self {
            tools: ToolManager::new(config.tools.clone()),
            view: View::default(),
            drag: DragTracker::default(),
            history: HistoryStack::default(),
            store: None,
            pending_fill: None,
            stroke_touched: None,
            config,
        };
        engine.apply_config();
        engine
    }

    /// Replace the configuration. An invalid config is rejected and the
    /// current one kept.
    pub fn configure(&mut self, config: EngineConfig) -> EngineResult<()> {
        if let Err(err) = config.validate() {
            log::warn!("Rejected engine config: {err}");
            return Err(err);
        }
        self.cancel_interaction();
        self.tools = ToolManager::new(config.tools.clone());
        self.config = config;
        self.apply_config();
        log::debug!("Engine configured: {:?}", self.config);
        Ok(())
    }

    fn apply_config(&mut self) {
        self.history.set_max_depth(self.config.max_history_depth);
        self.drag.min_distance = self.config.min_drag_distance;
        self.view.min_zoom = self.config.min_zoom;
        self.view.max_zoom = self.config.max_zoom;
        self.view.zoom_step = self.config.zoom_step;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a session on a new image.
    ///
    /// The display is reset to one unit per pixel at the current origin;
    /// call [`Engine::set_display`] or [`Engine::fit_to_viewport`] to place it.
    pub fn on_image_loaded(&mut self, image: impl Into<Arc<SourceImage>>) -> Uuid {
        let image = image.into();
        self.cancel_interaction();
        self.history.clear();

        let dims = image.dimensions();
        let pivot = self.view.display.pivot;
        self.view.display = DisplayTransform::identity_for(dims, self.view.display.origin).with_pivot(pivot);

        let store = LayerStore::new(image);
        let id = store.id();
        log::info!("Loaded {}x{} image (session {id})", dims.width, dims.height);
        self.store = Some(store);
        id
    }

    pub fn state(&self) -> EngineState {
        if self.store.is_some() {
            EngineState::Ready
        } else {
            EngineState::Uninitialized
        }
    }

    /// Session id of the loaded image.
    pub fn session_id(&self) -> Option<Uuid> {
        self.store.as_ref().map(LayerStore::id)
    }

    pub fn source(&self) -> Option<&Arc<SourceImage>> {
        self.store.as_ref().map(LayerStore::source)
    }

    fn store(&self) -> EngineResult<&LayerStore> {
        self.store.as_ref().ok_or(EngineError::NoActiveImage)
    }

    pub fn layers(&self) -> EngineResult<&LayerStore> {
        self.store()
    }

    pub fn layer(&self, kind: LayerKind) -> EngineResult<&Layer> {
        Ok(self.store()?.layer(kind))
    }

    /// Change the color a layer is drawn with in the overlay.
    pub fn set_overlay_color(&mut self, kind: LayerKind, color: Rgba) -> EngineResult<()> {
        self.store
            .as_mut()
            .ok_or(EngineError::NoActiveImage)?
            .set_overlay_color(kind, color);
        Ok(())
    }

    pub fn set_layer_visible(&mut self, kind: LayerKind, visible: bool) -> EngineResult<()> {
        self.store
            .as_mut()
            .ok_or(EngineError::NoActiveImage)?
            .set_visible(kind, visible);
        Ok(())
    }

    /// Flip a layer's visibility, returning the new state.
    pub fn toggle_layer_visibility(&mut self, kind: LayerKind) -> EngineResult<bool> {
        Ok(self
            .store
            .as_mut()
            .ok_or(EngineError::NoActiveImage)?
            .toggle_visible(kind))
    }

    pub fn tool_config(&self) -> &ToolConfig {
        &self.tools.config
    }

    /// Tool settings; every setter validates its input.
    pub fn tool_config_mut(&mut self) -> &mut ToolConfig {
        &mut self.tools.config
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current_tool()
    }

    /// Switch tools, abandoning any stroke or fill in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.cancel_interaction();
        self.tools.set_tool(tool);
        log::info!("Switched to {tool:?}");
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn set_display(&mut self, display: DisplayTransform) {
        self.view.display = display;
    }

    /// Fit the loaded image inside a viewport of the given size.
    pub fn fit_to_viewport(&mut self, viewport: Size) -> EngineResult<()> {
        let dims = self.store()?.dimensions();
        self.view.fit_to(viewport, dims);
        Ok(())
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
    }

    pub fn zoom_at(&mut self, point: Point, factor: f64) {
        self.view.zoom_at(point, factor);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn fill_pending(&self) -> bool {
        self.pending_fill.is_some()
    }

    fn cancel_interaction(&mut self) {
        if self.pending_fill.take().is_some() {
            log::debug!("Pending fill cancelled");
        }
        self.tools.cancel();
        self.drag.cancel();
        self.stroke_touched = None;
    }

    /// Route a pointer event to the active tool.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> EngineResult<Outcome> {
        let tool = self.tools.current_tool();
        if tool != ToolKind::Pan && self.store.is_none() {
            return Err(EngineError::NoActiveImage);
        }
        let Some(step) = self.drag.handle(event) else {
            return Ok(Outcome::Ignored);
        };

        match tool {
            ToolKind::Brush | ToolKind::Eraser => self.stroke(tool, step),
            ToolKind::MagicWand => self.start_fill(step),
            ToolKind::EyeDropper => self.sample(step),
            ToolKind::Pan => Ok(self.pan(step)),
        }
    }

    /// Pixel under a screen point, or `None` off the image.
    fn pixel_at(&self, position: Point) -> EngineResult<Option<PixelCoord>> {
        let dims = self.store()?.dimensions();
        match self.view.display.screen_to_pixel(position, dims) {
            Ok(coord) => Ok(Some(coord)),
            Err(EngineError::OutOfBounds { x, y }) => {
                log::debug!("Pointer at ({x:.1}, {y:.1}) is off the image");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn stroke(&mut self, tool: ToolKind, step: DragStep) -> EngineResult<Outcome> {
        if step.phase == PointerPhase::End {
            self.tools.cancel();
            self.stroke_touched = None;
            return Ok(Outcome::StrokeEnded);
        }
        let Some(coord) = self.pixel_at(step.position)? else {
            return Ok(Outcome::Ignored);
        };
        let config = &self.tools.config;
        let radius = if tool == ToolKind::Eraser {
            config.eraser_radius()
        } else {
            config.brush_radius()
        };
        let (color, opacity) = (config.paint_color(), config.opacity());

        let Some(store) = self.store.as_mut() else {
            return Err(EngineError::NoActiveImage);
        };
        let (layer, region) = match self.tools.state {
            ToolState::Stroking { layer, last } if step.phase == PointerPhase::Move => {
                (layer, raster::line_stroke(last, coord, radius, store.dimensions()))
            }
            // A press, or a drag that entered the image from outside.
            _ => {
                self.history.snapshot(store);
                self.stroke_touched = None;
                let layer = self.tools.config.paint_layer();
                (layer, raster::circle_region(coord, radius, store.dimensions()))
            }
        };
        self.tools.state = ToolState::Stroking { layer, last: coord };

        if tool == ToolKind::Eraser {
            return Ok(Outcome::Erased(compositor::erase(store, layer, &region)?));
        }
        // Each pixel is painted once per stroke, so overlapping stamps do not
        // stack alpha below full opacity.
        let fresh = match self.stroke_touched.as_mut() {
            Some(touched) => {
                let fresh = region.difference(touched);
                touched.union_with(&fresh);
                fresh
            }
            None => {
                self.stroke_touched = Some(region.clone());
                region
            }
        };
        Ok(Outcome::Painted(compositor::apply(store, layer, &fresh, color, opacity)?))
    }

    fn start_fill(&mut self, step: DragStep) -> EngineResult<Outcome> {
        if step.phase != PointerPhase::Begin {
            return Ok(Outcome::Ignored);
        }
        let Some(seed) = self.pixel_at(step.position)? else {
            return Ok(Outcome::Ignored);
        };
        self.pending_fill = None;

        let config = &self.tools.config;
        let (layer, color, opacity) = (config.paint_layer(), config.paint_color(), config.opacity());
        let store = self.store()?;
        if store.layer(layer).pixels().get(seed) == Some(color) {
            log::debug!("Fill seed {seed:?} already holds {}", color.to_hex());
            return Ok(Outcome::FillSkipped { region_size: 0 });
        }

        let growth = RegionGrowth::new(Arc::clone(store.source()), seed, config.grow_params())
            .with_chunk_size(self.config.fill_chunk_size);
        self.pending_fill = Some(PendingFill {
            growth,
            layer,
            color,
            opacity,
        });
        log::debug!("Fill started at {seed:?} on {layer} layer");
        Ok(Outcome::FillStarted { seed })
    }

    /// Advance the pending fill by at most `budget` queue entries, committing
    /// it once complete.
    pub fn poll_fill(&mut self, budget: usize) -> EngineResult<Outcome> {
        let Some(pending) = self.pending_fill.as_mut() else {
            return Ok(Outcome::Ignored);
        };
        match pending.growth.step(budget) {
            GrowStep::Pending { accepted, queued } => Ok(Outcome::FillPending { accepted, queued }),
            GrowStep::Complete { .. } => self.finish_fill(),
        }
    }

    /// Run the pending fill to completion and commit it.
    pub fn finish_fill(&mut self) -> EngineResult<Outcome> {
        let Some(pending) = self.pending_fill.take() else {
            return Ok(Outcome::Ignored);
        };
        let region = pending.growth.finish();
        self.commit_fill(pending.layer, &region, pending.color, pending.opacity)
    }

    /// Drive the pending fill as a future, yielding between chunks.
    pub async fn run_fill(&mut self) -> EngineResult<Outcome> {
        let Some(pending) = self.pending_fill.take() else {
            return Ok(Outcome::Ignored);
        };
        let region = pending.growth.await;
        self.commit_fill(pending.layer, &region, pending.color, pending.opacity)
    }

    fn commit_fill(
        &mut self,
        layer: LayerKind,
        region: &PixelRegion,
        color: Rgba,
        opacity: f32,
    ) -> EngineResult<Outcome> {
        let min = self.tools.config.min_fill_region();
        if region.is_empty() || region.len() < min {
            log::info!("Fill of {} pixels skipped (minimum {min})", region.len());
            return Ok(Outcome::FillSkipped {
                region_size: region.len(),
            });
        }

        let store = self.store.as_mut().ok_or(EngineError::NoActiveImage)?;
        if region.indices().all(|index| store.claimed_by_other(layer, index)) {
            log::info!("Fill of {} pixels skipped: all owned by another layer", region.len());
            return Ok(Outcome::FillSkipped {
                region_size: region.len(),
            });
        }
        self.history.snapshot(store);
        let report = compositor::apply(store, layer, region, color, opacity)?;
        log::info!(
            "Filled {} of {} pixels on {layer} layer",
            report.painted,
            report.requested
        );
        Ok(Outcome::Filled(report))
    }

    fn sample(&mut self, step: DragStep) -> EngineResult<Outcome> {
        if step.phase != PointerPhase::Begin {
            return Ok(Outcome::Ignored);
        }
        let Some(coord) = self.pixel_at(step.position)? else {
            return Ok(Outcome::Ignored);
        };
        let color = self
            .store()?
            .source()
            .get(coord)
            .ok_or(EngineError::OutOfBounds {
                x: step.position.x,
                y: step.position.y,
            })?;

        self.tools.config.set_border_color(color);
        self.drag.cancel();
        let tool = self.tools.revert_tool();
        log::info!("Sampled border color {} at {coord:?}, back to {tool:?}", color.to_hex());
        Ok(Outcome::Sampled(color))
    }

    fn pan(&mut self, step: DragStep) -> Outcome {
        self.view.pan(step.delta);
        self.tools.state = if step.phase == PointerPhase::End {
            ToolState::Idle
        } else {
            ToolState::Panning
        };
        Outcome::Panned(step.delta)
    }

    /// Cancel in-flight interactions ahead of a command and hand out the
    /// pieces it works on.
    fn begin_command(&mut self) -> EngineResult<(&mut LayerStore, &mut HistoryStack)> {
        self.cancel_interaction();
        let store = self.store.as_mut().ok_or(EngineError::NoActiveImage)?;
        Ok((store, &mut self.history))
    }

    /// Restore the layers to before the last change.
    pub fn undo(&mut self) -> EngineResult<Outcome> {
        let (store, history) = self.begin_command()?;
        if history.undo(store)? {
            log::info!("Undo ({} left)", history.len());
            Ok(Outcome::Undone)
        } else {
            Ok(Outcome::NothingToUndo)
        }
    }

    /// Clear every layer. Undoable.
    pub fn clear_all(&mut self) -> EngineResult<Outcome> {
        let (store, history) = self.begin_command()?;
        history.snapshot(store);
        for kind in LayerKind::ALL {
            compositor::clear(store, kind);
        }
        log::info!("Cleared all layers");
        Ok(Outcome::Cleared)
    }

    /// Clear one layer. Undoable.
    pub fn clear_layer(&mut self, kind: LayerKind) -> EngineResult<Outcome> {
        let (store, history) = self.begin_command()?;
        history.snapshot(store);
        compositor::clear(store, kind);
        log::info!("Cleared {kind} layer");
        Ok(Outcome::Cleared)
    }

    /// Grow every painted blob by one pixel. Undoable.
    pub fn thicken(&mut self) -> EngineResult<Outcome> {
        let (store, history) = self.begin_command()?;
        history.snapshot(store);
        let report = compositor::thicken_all(store);
        log::info!("Thickened blobs by {} pixels", report.painted);
        Ok(Outcome::Thickened(report))
    }

    /// Merge all layers into one annotation image.
    pub fn export(&self) -> EngineResult<PixelBuffer> {
        Ok(export::merge(self.store()?, &self.config.precedence))
    }
}
