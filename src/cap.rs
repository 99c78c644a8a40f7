use std::{
    path::Path,
    sync::{Arc, OnceLock},
};

use resvg::tiny_skia::{FilterQuality, Pixmap, PixmapPaint, PixmapRef, Transform};

use crate::{CapError, CapResult, decode::premultiply_rgba8_in_place};

static BUILTIN_CAP_SVG: &[u8] = include_bytes!("../assets/cap.svg");

#[derive(Clone, Debug)]
pub struct PreparedRaster {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// The overlay graphic. Immutable once loaded; clones share the underlying data.
#[derive(Clone, Debug)]
pub enum CapAsset {
    Svg(Arc<usvg::Tree>),
    Raster(PreparedRaster),
}

/// Process-wide built-in cap, parsed on first use.
pub fn builtin() -> CapResult<&'static CapAsset> {
    static BUILTIN: OnceLock<CapAsset> = OnceLock::new();
    if let Some(cap) = BUILTIN.get() {
        return Ok(cap);
    }
    let cap = CapAsset::from_svg_bytes(BUILTIN_CAP_SVG)?;
    tracing::debug!("built-in cap parsed");
    Ok(BUILTIN.get_or_init(|| cap))
}

impl CapAsset {
    pub fn from_svg_bytes(bytes: &[u8]) -> CapResult<Self> {
        let opts = usvg::Options::default();
        let tree = usvg::Tree::from_data(bytes, &opts)
            .map_err(|e| CapError::asset_load(format!("parse cap svg: {e}")))?;
        let size = tree.size();
        if !(size.width() > 0.0 && size.height() > 0.0) {
            return Err(CapError::asset_load("cap svg has an empty viewport"));
        }
        Ok(Self::Svg(Arc::new(tree)))
    }

    pub fn from_raster_bytes(bytes: &[u8]) -> CapResult<Self> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| CapError::asset_load(format!("decode cap image: {e}")))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(CapError::asset_load("cap image has no pixels"));
        }
        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Ok(Self::Raster(PreparedRaster {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }))
    }

    /// SVG when the bytes look like markup, raster otherwise.
    pub fn from_bytes(bytes: &[u8]) -> CapResult<Self> {
        if looks_like_svg(bytes) {
            Self::from_svg_bytes(bytes)
        } else {
            Self::from_raster_bytes(bytes)
        }
    }

    pub fn from_path(path: &Path) -> CapResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            CapError::asset_load(format!("read cap asset '{}': {e}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Intrinsic size in the asset's own units.
    pub fn size(&self) -> (f32, f32) {
        match self {
            Self::Svg(tree) => (tree.size().width(), tree.size().height()),
            Self::Raster(r) => (r.width as f32, r.height as f32),
        }
    }

    /// Draw the cap stretched into `rect` on a transparent `side x side` premultiplied layer.
    ///
    /// Parts of `rect` outside the layer are clipped; an empty or non-finite rect yields a fully
    /// transparent layer.
    pub fn render_layer(&self, side: u32, rect: kurbo::Rect) -> CapResult<Pixmap> {
        let mut layer = Pixmap::new(side, side)
            .ok_or_else(|| CapError::asset_load(format!("allocate {side}x{side} cap layer")))?;

        let drawable = rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0;
        if !drawable {
            return Ok(layer);
        }

        let (w, h) = self.size();
        let xform = Transform::from_row(
            (rect.width() / f64::from(w)) as f32,
            0.0,
            0.0,
            (rect.height() / f64::from(h)) as f32,
            rect.x0 as f32,
            rect.y0 as f32,
        );

        match self {
            Self::Svg(tree) => resvg::render(tree, xform, &mut layer.as_mut()),
            Self::Raster(r) => {
                let src = PixmapRef::from_bytes(&r.rgba8_premul, r.width, r.height)
                    .ok_or_else(|| CapError::asset_load("cap raster buffer size mismatch"))?;
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                layer.draw_pixmap(0, 0, src, &paint, xform, None);
            }
        }
        Ok(layer)
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with('<') && text.contains("<svg")
}
