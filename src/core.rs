use serde::{Deserialize, Serialize};

use crate::error::{CapError, CapResult};

/// Cap height as a fraction of cap width.
pub const DEFAULT_CAP_ASPECT: f64 = 0.8;

/// Centered square crop of a `width x height` raster.
///
/// `side = min(width, height)`; the longer dimension is trimmed equally from both ends. Odd
/// remainders round the origin down, so a 5x2 source crops at `x = 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareCrop {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

impl SquareCrop {
    pub fn centered(width: u32, height: u32) -> CapResult<Self> {
        if width == 0 || height == 0 {
            return Err(CapError::decode(format!(
                "source has empty dimensions: {width}x{height}"
            )));
        }
        let side = width.min(height);
        Ok(Self {
            x: (width - side) / 2,
            y: (height - side) / 2,
            side,
        })
    }
}

/// Cap placement expressed as fractions of the square canvas.
///
/// - `scale`: cap width / canvas side
/// - `offset_x`: horizontal shift from the centered position, in canvas widths
/// - `offset_y`: top edge of the cap, in canvas heights (negative = above the canvas)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementParams {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for PlacementParams {
    /// Same placement auto-detection falls back to when it finds nothing.
    fn default() -> Self {
        Self {
            scale: 0.6,
            offset_x: 0.0,
            offset_y: -0.35,
        }
    }
}

impl PlacementParams {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Clamp `scale` into `[min, max]`; offsets pass through untouched.
    pub fn clamped(self, min: f64, max: f64) -> Self {
        Self {
            scale: self.scale.clamp(min, max),
            ..self
        }
    }

    /// Pixel-space rectangle the cap is drawn into on a `side x side` canvas.
    ///
    /// Nothing is clamped here: oversized caps and caps hanging above the top edge are drawn as
    /// computed.
    pub fn cap_rect(&self, side: u32, aspect: f64) -> kurbo::Rect {
        let side = f64::from(side);
        let cap_w = side * self.scale;
        let cap_h = cap_w * aspect;
        let x = (side - cap_w) / 2.0 + self.offset_x * side;
        let y = self.offset_y * side;
        kurbo::Rect::new(x, y, x + cap_w, y + cap_h)
    }
}
