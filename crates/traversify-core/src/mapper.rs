//! Coordinate mapping between display space and image pixel space.

use crate::error::{EngineError, EngineResult};
use crate::pixels::{Dimensions, PixelCoord};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default zoom limits and step, matching the map tool's zoom buttons.
pub const DEFAULT_MIN_ZOOM: f64 = 0.5;
pub const DEFAULT_MAX_ZOOM: f64 = 3.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.1;

// Slack for affine round-off on the rectangle's edges, in unscaled units.
const EDGE_EPSILON: f64 = 1e-9;

/// Placement of the displayed image rectangle on screen.
///
/// `size` is the unscaled rectangle, `scale` the zoom applied to it and
/// `pivot` the normalized anchor inside the rectangle that sits at `origin`.
/// A pivot of `(0, 0)` anchors the top-left corner, `(0.5, 0.5)` the center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    pub origin: Point,
    pub size: Size,
    pub scale: f64,
    pub pivot: Vec2,
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            size: Size::new(1.0, 1.0),
            scale: 1.0,
            pivot: Vec2::ZERO,
        }
    }
}

impl DisplayTransform {
    /// A top-left anchored rectangle.
    pub fn new(origin: Point, size: Size, scale: f64) -> Self {
        Self {
            origin,
            size,
            scale,
            pivot: Vec2::ZERO,
        }
    }

    /// Show `image` at one display unit per pixel, anchored at `origin`.
    pub fn identity_for(image: Dimensions, origin: Point) -> Self {
        Self::new(
            origin,
            Size::new(f64::from(image.width), f64::from(image.height)),
            1.0,
        )
    }

    pub fn with_pivot(mut self, pivot: Vec2) -> Self {
        self.pivot = pivot;
        self
    }

    fn pivot_offset(&self) -> Vec2 {
        Vec2::new(self.pivot.x * self.size.width, self.pivot.y * self.size.height)
    }

    /// Rectangle-local (top-left origin, unscaled) to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2())
            * Affine::scale(self.scale)
            * Affine::translate(-self.pivot_offset())
    }

    /// Screen to rectangle-local.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(self.pivot_offset())
            * Affine::scale(1.0 / self.scale)
            * Affine::translate(-self.origin.to_vec2())
    }

    pub fn screen_to_local(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn local_to_screen(&self, local_point: Point) -> Point {
        self.transform() * local_point
    }

    /// Whether a screen point falls on the displayed rectangle (edges included).
    pub fn contains(&self, screen_point: Point) -> bool {
        if !self.is_valid() {
            return false;
        }
        let local = self.screen_to_local(screen_point);
        (-EDGE_EPSILON..=self.size.width + EDGE_EPSILON).contains(&local.x)
            && (-EDGE_EPSILON..=self.size.height + EDGE_EPSILON).contains(&local.y)
    }

    fn is_valid(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.size.width > 0.0 && self.size.height > 0.0
    }

    /// Map a screen point to the pixel beneath it.
    ///
    /// Points off the displayed rectangle are rejected rather than clamped so
    /// that a stray pointer never paints the nearest edge.
    pub fn screen_to_pixel(&self, screen_point: Point, image: Dimensions) -> EngineResult<PixelCoord> {
        if !self.contains(screen_point) {
            return Err(EngineError::OutOfBounds {
                x: screen_point.x,
                y: screen_point.y,
            });
        }
        let local = self.screen_to_local(screen_point);
        let nx = local.x / self.size.width;
        let ny = local.y / self.size.height;
        Ok(PixelCoord::new(
            to_pixel(nx, image.width),
            to_pixel(ny, image.height),
        ))
    }

    /// Screen position that maps back to `coord`.
    pub fn pixel_to_screen(&self, coord: PixelCoord, image: Dimensions) -> Point {
        let local = Point::new(
            f64::from(coord.x) / f64::from(image.width) * self.size.width,
            f64::from(coord.y) / f64::from(image.height) * self.size.height,
        );
        self.local_to_screen(local)
    }

    /// Screen-space center of the displayed rectangle.
    pub fn center(&self) -> Point {
        self.local_to_screen(Point::new(self.size.width / 2.0, self.size.height / 2.0))
    }
}

fn to_pixel(normalized: f64, extent: u32) -> u32 {
    let max = f64::from(extent.saturating_sub(1));
    (normalized * f64::from(extent)).round().clamp(0.0, max) as u32
}

/// Pan and zoom state for the displayed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub display: DisplayTransform,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
}

impl Default for View {
    fn default() -> Self {
        Self {
            display: DisplayTransform::default(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
        }
    }
}

impl View {
    pub fn new(display: DisplayTransform) -> Self {
        Self {
            display,
            ..Self::default()
        }
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.display.origin += delta;
    }

    /// Zoom, keeping the given screen point fixed over the same image point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_scale = (self.display.scale * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_scale - self.display.scale).abs() < f64::EPSILON {
            return;
        }

        let local = self.display.screen_to_local(screen_point);
        self.display.scale = new_scale;

        let moved = self.display.local_to_screen(local);
        self.display.origin += Vec2::new(screen_point.x - moved.x, screen_point.y - moved.y);
    }

    /// Step the zoom in around the rectangle's center.
    pub fn zoom_in(&mut self) {
        self.zoom_by_step(self.zoom_step);
    }

    /// Step the zoom out around the rectangle's center.
    pub fn zoom_out(&mut self) {
        self.zoom_by_step(-self.zoom_step);
    }

    fn zoom_by_step(&mut self, step: f64) {
        let current = self.display.scale;
        let target = (current + step).clamp(self.min_zoom, self.max_zoom);
        let center = self.display.center();
        self.zoom_at(center, target / current);
    }

    /// Fit the image uniformly inside a viewport and center it.
    ///
    /// The fitted scale may fall outside the zoom limits; the limits only
    /// constrain interactive zooming.
    pub fn fit_to(&mut self, viewport: Size, image: Dimensions) {
        let size = Size::new(f64::from(image.width), f64::from(image.height));
        let scale = (viewport.width / size.width).min(viewport.height / size.height);
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };

        self.display.size = size;
        self.display.scale = scale;
        let viewport_center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        let offset = Vec2::new(
            (self.display.pivot.x - 0.5) * size.width * scale,
            (self.display.pivot.y - 0.5) * size.height * scale,
        );
        self.display.origin = viewport_center + offset;
    }
}
