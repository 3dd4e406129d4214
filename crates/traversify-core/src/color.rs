//! RGBA8 pixel color.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Largest value [`Rgba::distance`] can return (three channels of 255).
pub const MAX_DISTANCE: u32 = 255 * 3;

/// An 8-bit straight-alpha RGBA color, the unit of every pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0, 255);
    pub const GREEN: Self = Self::new(0, 255, 0, 255);
    pub const BLUE: Self = Self::new(0, 0, 255, 255);
    pub const YELLOW: Self = Self::new(255, 235, 4, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn from_array(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// A zero-alpha pixel is unclaimed by its layer.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Cumulative absolute channel difference `|Δr| + |Δg| + |Δb|`.
    ///
    /// Alpha is ignored; the source image is treated as opaque for similarity.
    pub fn distance(self, other: Self) -> u32 {
        u32::from(self.r.abs_diff(other.r))
            + u32::from(self.g.abs_diff(other.g))
            + u32::from(self.b.abs_diff(other.b))
    }

    /// Whether `other` lies within `tolerance` of this color.
    pub fn is_similar(self, other: Self, tolerance: u32) -> bool {
        self.distance(other) <= tolerance
    }

    /// Composite `self` over `dst` with the given opacity in `[0, 1]`.
    ///
    /// An opacity of `1.0` with an opaque source is a straight replace.
    pub fn blend_over(self, dst: Self, opacity: f32) -> Self {
        let sa = (f32::from(self.a) / 255.0) * opacity.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return dst;
        }
        let da = f32::from(dst.a) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Self::TRANSPARENT;
        }
        let mix = |s: u8, d: u8| -> u8 {
            let v = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        Self::new(
            mix(self.r, dst.r),
            mix(self.g, dst.g),
            mix(self.b, dst.b),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        )
    }

    /// Black or white, whichever reads better on top of this color (YIQ luma).
    pub fn contrasting(self) -> Self {
        let yiq = (u32::from(self.r) * 299 + u32::from(self.g) * 587 + u32::from(self.b) * 114) / 1000;
        if yiq >= 128 { Self::BLACK } else { Self::WHITE }
    }

    /// `#RRGGBBAA` hex string.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}
