//! Flat RGBA8 pixel storage.
//!
//! All buffers are row-major with `index = y * width + x`; pixel rows start at
//! the top of the image, matching display space.

use crate::color::Rgba;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An integer pixel coordinate inside some image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: u32,
    pub y: u32,
}

impl PixelCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

// Row-major ordering so region iteration walks memory forward.
impl Ord for PixelCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for PixelCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub const fn contains(self, coord: PixelCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Signed variant of [`Dimensions::contains`] for offsets that may leave the image.
    pub fn contains_signed(self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Flat index of a coordinate known to be in bounds.
    pub const fn index_of(self, coord: PixelCoord) -> usize {
        coord.y as usize * self.width as usize + coord.x as usize
    }

    pub const fn coord_of(self, index: usize) -> PixelCoord {
        let w = self.width as usize;
        PixelCoord::new((index % w) as u32, (index / w) as u32)
    }

    fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A mutable RGBA8 buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    dims: Dimensions,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        let dims = Dimensions::new(width, height);
        Self {
            dims,
            data: vec![0; dims.pixel_count() * 4],
        }
    }

    /// Create a buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let dims = Dimensions::new(width, height);
        let data = color.to_array().repeat(dims.pixel_count());
        Self { dims, data }
    }

    /// Wrap raw RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> EngineResult<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::invalid("image", "dimensions must be non-zero"));
        }
        let dims = Dimensions::new(width, height);
        if data.len() != dims.pixel_count() * 4 {
            return Err(EngineError::invalid(
                "image",
                format!(
                    "expected {} bytes for {}x{} RGBA, got {}",
                    dims.pixel_count() * 4,
                    width,
                    height,
                    data.len()
                ),
            ));
        }
        Ok(Self { dims, data })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn width(&self) -> u32 {
        self.dims.width
    }

    pub fn height(&self) -> u32 {
        self.dims.height
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Color at a flat pixel index.
    #[inline]
    pub fn at(&self, index: usize) -> Rgba {
        let i = index * 4;
        Rgba::new(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
    }

    #[inline]
    pub fn set_at(&mut self, index: usize, color: Rgba) {
        let i = index * 4;
        self.data[i..i + 4].copy_from_slice(&color.to_array());
    }

    /// Alpha channel at a flat pixel index.
    #[inline]
    pub fn alpha_at(&self, index: usize) -> u8 {
        self.data[index * 4 + 3]
    }

    /// Color at a coordinate, `None` when outside the buffer.
    pub fn get(&self, coord: PixelCoord) -> Option<Rgba> {
        self.dims
            .contains(coord)
            .then(|| self.at(self.dims.index_of(coord)))
    }

    /// Set a pixel; returns false when the coordinate is outside the buffer.
    pub fn set(&mut self, coord: PixelCoord, color: Rgba) -> bool {
        if !self.dims.contains(coord) {
            return false;
        }
        let index = self.dims.index_of(coord);
        self.set_at(index, color);
        true
    }

    /// Set every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Number of pixels with non-zero alpha.
    pub fn opaque_count(&self) -> usize {
        self.data.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    /// Replace all pixels with those of `other`, which must match in size.
    pub fn copy_from(&mut self, other: &PixelBuffer) -> EngineResult<()> {
        if other.dims != self.dims {
            return Err(EngineError::DimensionMismatch {
                expected: self.dims.as_tuple(),
                actual: other.dims.as_tuple(),
            });
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }
}

/// The immutable image being annotated.
///
/// Supplied once per load by the host; the engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pixels: PixelBuffer,
}

impl SourceImage {
    /// Build a source image from raw RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> EngineResult<Self> {
        PixelBuffer::from_rgba8(width, height, data).map(|pixels| Self { pixels })
    }

    /// Build a source image from an existing buffer.
    pub fn from_buffer(pixels: PixelBuffer) -> EngineResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(EngineError::invalid("image", "dimensions must be non-zero"));
        }
        Ok(Self { pixels })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.pixels.dimensions()
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Color at a flat pixel index.
    #[inline]
    pub fn at(&self, index: usize) -> Rgba {
        self.pixels.at(index)
    }

    pub fn get(&self, coord: PixelCoord) -> Option<Rgba> {
        self.pixels.get(coord)
    }
}
