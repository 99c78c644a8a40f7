use image::RgbaImage;

use crate::{
    CapError, CapResult,
    core::SquareCrop,
};

/// Straight-alpha RGBA8 pixels decoded from a [`crate::SourceImage`].
pub type DecodedRaster = RgbaImage;

pub fn decode_source(bytes: &[u8]) -> CapResult<DecodedRaster> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| CapError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(CapError::decode("decoded image has no pixels"));
    }
    Ok(rgba)
}

/// Copy the centered square out of `raster`.
pub fn center_crop(raster: &DecodedRaster) -> CapResult<(SquareCrop, RgbaImage)> {
    let crop = SquareCrop::centered(raster.width(), raster.height())?;
    let square = image::imageops::crop_imm(raster, crop.x, crop.y, crop.side, crop.side).to_image();
    Ok((crop, square))
}

pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        match a {
            0 => {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
            }
            255 => {}
            _ => {
                for c in &mut px[..3] {
                    *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
    }
}
