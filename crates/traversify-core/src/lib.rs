//! Traversify Core Library
//!
//! Multi-layer raster annotation engine for marking walkable and blocked
//! areas on map images. Hosts feed it pointer events and commands; it keeps
//! the annotation layers, undo history and tool state.

pub mod color;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod grow;
pub mod history;
pub mod input;
pub mod layers;
pub mod mapper;
pub mod pixels;
pub mod raster;
pub mod region;
pub mod tools;

pub use color::{Rgba, MAX_DISTANCE};
pub use compositor::PaintReport;
pub use config::EngineConfig;
pub use engine::{Engine, EngineState, Outcome};
pub use error::{EngineError, EngineResult};
pub use export::{annotation_file_stem, merge, DEFAULT_PRECEDENCE};
pub use grow::{grow, GrowParams, GrowStep, RegionGrowth};
pub use history::{HistoryStack, UndoSnapshot};
pub use input::{DragTracker, PointerEvent, PointerPhase};
pub use layers::{Layer, LayerKind, LayerStore};
pub use mapper::{DisplayTransform, View};
pub use pixels::{Dimensions, PixelBuffer, PixelCoord, SourceImage};
pub use region::PixelRegion;
pub use tools::{AnnotationCategory, ToolConfig, ToolKind, ToolManager, ToolState};
