use std::io::Cursor;

use image::RgbaImage;

use crate::{CapError, CapResult};

/// Encode straight-alpha RGBA as PNG.
pub fn encode_png(canvas: RgbaImage) -> CapResult<Vec<u8>> {
    let (width, height) = canvas.dimensions();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| CapError::encode(format!("write {width}x{height} png: {e}")))?;
    if buf.is_empty() {
        return Err(CapError::encode("png encoder produced no output"));
    }
    Ok(buf)
}
