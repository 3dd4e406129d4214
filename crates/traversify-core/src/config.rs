//! Engine configuration, loadable from JSON.

use crate::error::{EngineError, EngineResult};
use crate::export::DEFAULT_PRECEDENCE;
use crate::grow::DEFAULT_CHUNK_SIZE;
use crate::history::DEFAULT_MAX_DEPTH;
use crate::input::DEFAULT_MIN_DRAG_DISTANCE;
use crate::layers::LayerKind;
use crate::mapper::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM_STEP};
use crate::tools::ToolConfig;
use serde::{Deserialize, Serialize};

/// Settings applied by [`Engine::configure`](crate::Engine::configure).
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Undo snapshots kept before the oldest is dropped.
    pub max_history_depth: usize,
    /// Queue entries a fill processes per slice.
    pub fill_chunk_size: usize,
    /// Pointer travel, in display units, below which moves are ignored.
    pub min_drag_distance: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    /// Export order, highest priority first.
    pub precedence: Vec<LayerKind>,
    /// Tool settings in effect before the user changes anything.
    pub tools: ToolConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history_depth: DEFAULT_MAX_DEPTH,
            fill_chunk_size: DEFAULT_CHUNK_SIZE,
            min_drag_distance: DEFAULT_MIN_DRAG_DISTANCE,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
            precedence: DEFAULT_PRECEDENCE.to_vec(),
            tools: ToolConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.max_history_depth == 0 {
            return Err(EngineError::invalid("max_history_depth", "must be at least 1"));
        }
        if self.fill_chunk_size == 0 {
            return Err(EngineError::invalid("fill_chunk_size", "must be at least 1"));
        }
        if !(self.min_drag_distance.is_finite() && self.min_drag_distance >= 0.0) {
            return Err(EngineError::invalid("min_drag_distance", "must be a non-negative number"));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(EngineError::invalid(
                "zoom",
                format!("limits {}..{} are not a positive range", self.min_zoom, self.max_zoom),
            ));
        }
        if !(self.zoom_step > 0.0 && self.zoom_step.is_finite()) {
            return Err(EngineError::invalid("zoom_step", "must be positive"));
        }
        if self.precedence.is_empty() {
            return Err(EngineError::invalid("precedence", "must name at least one layer"));
        }
        self.tools.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::AnnotationCategory;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_history_depth, 20);
        assert_eq!(config.precedence, vec![LayerKind::NonTraversable, LayerKind::Traversable]);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = EngineConfig {
            max_history_depth: 5,
            ..EngineConfig::default()
        };
        config.tools.set_category(AnnotationCategory::NonTraversableTerrain);

        let json = config.to_json().unwrap();
        let restored = EngineConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "fill_chunk_size": 500, "tools": { "brush_radius": 3 } }"#).unwrap();
        assert_eq!(config.fill_chunk_size, 500);
        assert_eq!(config.tools.brush_radius(), 3);
        assert_eq!(config.tools.eraser_radius(), 10);
        assert_eq!(config.max_history_depth, 20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "max_history_depth": 0 }"#),
            Err(EngineError::InvalidConfig { field: "max_history_depth", .. })
        ));
        assert!(EngineConfig::from_json(r#"{ "min_zoom": 4.0, "max_zoom": 2.0 }"#).is_err());
        assert!(EngineConfig::from_json(r#"{ "tools": { "opacity": 0.0 } }"#).is_err());
        assert!(EngineConfig::from_json(r#"{ "precedence": [] }"#).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(EngineError::Config(_))
        ));
    }
}
