//! Tool selection, per-tool settings and interaction state.

use crate::color::{MAX_DISTANCE, Rgba};
use crate::error::{EngineError, EngineResult};
use crate::grow::GrowParams;
use crate::layers::LayerKind;
use crate::pixels::PixelCoord;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Brush,
    Eraser,
    MagicWand,
    EyeDropper,
    Pan,
}

impl ToolKind {
    /// Whether the tool writes to a layer.
    pub fn paints(self) -> bool {
        matches!(self, ToolKind::Brush | ToolKind::Eraser | ToolKind::MagicWand)
    }
}

/// What a brush stroke or fill marks on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AnnotationCategory {
    #[default]
    TraversablePath,
    TraversableObject,
    NonTraversableTerrain,
    NonTraversableConstructed,
}

impl AnnotationCategory {
    pub const ALL: [AnnotationCategory; 4] = [
        AnnotationCategory::TraversablePath,
        AnnotationCategory::TraversableObject,
        AnnotationCategory::NonTraversableTerrain,
        AnnotationCategory::NonTraversableConstructed,
    ];

    /// Layer this category is painted into.
    pub fn layer(self) -> LayerKind {
        match self {
            AnnotationCategory::TraversablePath | AnnotationCategory::TraversableObject => LayerKind::Traversable,
            AnnotationCategory::NonTraversableTerrain | AnnotationCategory::NonTraversableConstructed => {
                LayerKind::NonTraversable
            }
        }
    }

    /// Paint color for this category.
    pub fn color(self) -> Rgba {
        match self {
            AnnotationCategory::TraversablePath => Rgba::GREEN,
            AnnotationCategory::TraversableObject => Rgba::YELLOW,
            AnnotationCategory::NonTraversableTerrain => Rgba::RED,
            AnnotationCategory::NonTraversableConstructed => Rgba::BLUE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnnotationCategory::TraversablePath => "Traversable Path",
            AnnotationCategory::TraversableObject => "Traversable Object",
            AnnotationCategory::NonTraversableTerrain => "Non-Traversable Terrain",
            AnnotationCategory::NonTraversableConstructed => "Non-Traversable Constructed",
        }
    }
}

/// Settings shared by all tools.
///
/// Fields are private so every change goes through a validating setter; a
/// rejected value leaves the previous one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    tool: ToolKind,
    brush_radius: u32,
    eraser_radius: u32,
    opacity: f32,
    tolerance: u32,
    border_color: Rgba,
    border_tolerance: u32,
    category: AnnotationCategory,
    min_fill_region: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tool: ToolKind::default(),
            brush_radius: 10,
            eraser_radius: 10,
            opacity: 1.0,
            tolerance: 25,
            border_color: Rgba::BLACK,
            border_tolerance: 13,
            category: AnnotationCategory::default(),
            min_fill_region: 1,
        }
    }
}

impl ToolConfig {
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn brush_radius(&self) -> u32 {
        self.brush_radius
    }

    pub fn eraser_radius(&self) -> u32 {
        self.eraser_radius
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    pub fn border_color(&self) -> Rgba {
        self.border_color
    }

    pub fn border_tolerance(&self) -> u32 {
        self.border_tolerance
    }

    pub fn category(&self) -> AnnotationCategory {
        self.category
    }

    pub fn min_fill_region(&self) -> usize {
        self.min_fill_region
    }

    /// Layer the active category paints into.
    pub fn paint_layer(&self) -> LayerKind {
        self.category.layer()
    }

    pub fn paint_color(&self) -> Rgba {
        self.category.color()
    }

    pub fn grow_params(&self) -> GrowParams {
        GrowParams {
            tolerance: self.tolerance,
            border_color: self.border_color,
            border_tolerance: self.border_tolerance,
        }
    }

    pub(crate) fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn set_brush_radius(&mut self, radius: u32) -> EngineResult<()> {
        check_radius("brush_radius", radius)?;
        self.brush_radius = radius;
        Ok(())
    }

    pub fn set_eraser_radius(&mut self, radius: u32) -> EngineResult<()> {
        check_radius("eraser_radius", radius)?;
        self.eraser_radius = radius;
        Ok(())
    }

    pub fn increase_brush_size(&mut self) -> u32 {
        self.brush_radius = self.brush_radius.saturating_add(1);
        self.brush_radius
    }

    /// Shrink the brush by one, never below a radius of 1.
    pub fn decrease_brush_size(&mut self) -> u32 {
        self.brush_radius = self.brush_radius.saturating_sub(1).max(1);
        self.brush_radius
    }

    pub fn set_opacity(&mut self, opacity: f32) -> EngineResult<()> {
        check_opacity(opacity)?;
        self.opacity = opacity;
        Ok(())
    }

    pub fn set_tolerance(&mut self, tolerance: u32) -> EngineResult<()> {
        check_tolerance("tolerance", tolerance)?;
        self.tolerance = tolerance;
        Ok(())
    }

    pub fn set_border_color(&mut self, color: Rgba) {
        self.border_color = color;
    }

    pub fn set_border_tolerance(&mut self, tolerance: u32) -> EngineResult<()> {
        check_tolerance("border_tolerance", tolerance)?;
        self.border_tolerance = tolerance;
        Ok(())
    }

    pub fn set_category(&mut self, category: AnnotationCategory) {
        self.category = category;
    }

    pub fn set_min_fill_region(&mut self, pixels: usize) -> EngineResult<()> {
        if pixels == 0 {
            return Err(EngineError::invalid("min_fill_region", "must be at least 1"));
        }
        self.min_fill_region = pixels;
        Ok(())
    }

    /// Check every field, e.g. after deserializing.
    pub fn validate(&self) -> EngineResult<()> {
        check_radius("brush_radius", self.brush_radius)?;
        check_radius("eraser_radius", self.eraser_radius)?;
        check_opacity(self.opacity)?;
        check_tolerance("tolerance", self.tolerance)?;
        check_tolerance("border_tolerance", self.border_tolerance)?;
        if self.min_fill_region == 0 {
            return Err(EngineError::invalid("min_fill_region", "must be at least 1"));
        }
        Ok(())
    }
}

fn check_radius(field: &'static str, radius: u32) -> EngineResult<()> {
    if radius == 0 {
        return Err(EngineError::invalid(field, "must be at least 1"));
    }
    Ok(())
}

fn check_opacity(opacity: f32) -> EngineResult<()> {
    if !(opacity > 0.0 && opacity <= 1.0) {
        return Err(EngineError::invalid("opacity", format!("{opacity} is not in (0, 1]")));
    }
    Ok(())
}

fn check_tolerance(field: &'static str, tolerance: u32) -> EngineResult<()> {
    if tolerance > MAX_DISTANCE {
        return Err(EngineError::invalid(
            field,
            format!("{tolerance} exceeds the maximum of {MAX_DISTANCE}"),
        ));
    }
    Ok(())
}

/// State of a tool interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolState {
    /// Waiting for a press.
    #[default]
    Idle,
    /// A brush or eraser stroke is in progress.
    Stroking {
        layer: LayerKind,
        /// Pixel the last stamp was centered on.
        last: PixelCoord,
    },
    /// The view is being dragged.
    Panning,
}

/// The active tool, its settings and what it is currently doing.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub config: ToolConfig,
    pub state: ToolState,
    previous_tool: Option<ToolKind>,
}

impl ToolManager {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            state: ToolState::Idle,
            previous_tool: None,
        }
    }

    pub fn current_tool(&self) -> ToolKind {
        self.config.tool()
    }

    /// Switch tools, abandoning any interaction in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        let current = self.config.tool();
        if tool == ToolKind::EyeDropper && current != ToolKind::EyeDropper {
            self.previous_tool = Some(current);
        }
        self.config.set_tool(tool);
        self.state = ToolState::Idle;
    }

    /// Return to the tool used before the eyedropper.
    pub fn revert_tool(&mut self) -> ToolKind {
        let tool = self.previous_tool.take().unwrap_or_default();
        self.set_tool(tool);
        tool
    }

    pub fn is_active(&self) -> bool {
        self.state != ToolState::Idle
    }

    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_selection() {
        let mut tm = ToolManager::default();
        assert_eq!(tm.current_tool(), ToolKind::Brush);

        tm.set_tool(ToolKind::MagicWand);
        assert_eq!(tm.current_tool(), ToolKind::MagicWand);
        assert!(tm.current_tool().paints());
        assert!(!ToolKind::Pan.paints());
    }

    #[test]
    fn test_set_tool_cancels_interaction() {
        let mut tm = ToolManager::default();
        tm.state = ToolState::Stroking {
            layer: LayerKind::Traversable,
            last: PixelCoord::new(1, 1),
        };
        assert!(tm.is_active());
        tm.set_tool(ToolKind::Eraser);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_eyedropper_reverts_to_previous_tool() {
        let mut tm = ToolManager::default();
        tm.set_tool(ToolKind::MagicWand);
        tm.set_tool(ToolKind::EyeDropper);
        assert_eq!(tm.revert_tool(), ToolKind::MagicWand);
        assert_eq!(tm.current_tool(), ToolKind::MagicWand);

        // Re-selecting the eyedropper does not forget the tool before it.
        tm.set_tool(ToolKind::EyeDropper);
        tm.set_tool(ToolKind::EyeDropper);
        assert_eq!(tm.revert_tool(), ToolKind::MagicWand);

        // Without a remembered tool, fall back to the brush.
        let mut config = ToolConfig::default();
        config.set_tool(ToolKind::EyeDropper);
        let mut tm = ToolManager::new(config);
        assert_eq!(tm.revert_tool(), ToolKind::Brush);
    }

    #[test]
    fn test_categories_map_to_layers() {
        assert_eq!(AnnotationCategory::TraversableObject.layer(), LayerKind::Traversable);
        assert_eq!(AnnotationCategory::TraversableObject.color(), Rgba::YELLOW);
        assert_eq!(AnnotationCategory::NonTraversableConstructed.layer(), LayerKind::NonTraversable);
        assert_eq!(AnnotationCategory::NonTraversableConstructed.color(), Rgba::BLUE);
        let traversable = AnnotationCategory::ALL
            .iter()
            .filter(|c| c.layer() == LayerKind::Traversable)
            .count();
        assert_eq!(traversable, 2);
    }

    #[test]
    fn test_invalid_values_keep_previous() {
        let mut config = ToolConfig::default();
        assert!(config.set_brush_radius(0).is_err());
        assert_eq!(config.brush_radius(), 10);

        assert!(config.set_opacity(0.0).is_err());
        assert!(config.set_opacity(1.5).is_err());
        assert!(config.set_opacity(f32::NAN).is_err());
        assert!((config.opacity() - 1.0).abs() < f32::EPSILON);

        assert!(matches!(
            config.set_tolerance(MAX_DISTANCE + 1),
            Err(EngineError::InvalidConfig { field: "tolerance", .. })
        ));
        assert_eq!(config.tolerance(), 25);
        assert!(config.set_min_fill_region(0).is_err());

        config.set_opacity(0.25).unwrap();
        config.set_tolerance(MAX_DISTANCE).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_brush_size_floor() {
        let mut config = ToolConfig::default();
        config.set_brush_radius(2).unwrap();
        assert_eq!(config.decrease_brush_size(), 1);
        assert_eq!(config.decrease_brush_size(), 1);
        assert_eq!(config.increase_brush_size(), 2);
    }

    #[test]
    fn test_category_drives_paint_target() {
        let mut config = ToolConfig::default();
        config.set_category(AnnotationCategory::NonTraversableTerrain);
        assert_eq!(config.paint_layer(), LayerKind::NonTraversable);
        assert_eq!(config.paint_color(), Rgba::RED);
    }
}
