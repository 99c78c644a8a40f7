use crate::{
    CapError, CapResult,
    decode::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
};

pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Composite a premultiplied layer over a straight-alpha canvas of the same size.
///
/// Canvas pixels under a fully transparent layer pixel are left byte-for-byte untouched.
pub fn over_layer_in_place(canvas: &mut [u8], layer: &[u8]) -> CapResult<()> {
    if canvas.len() != layer.len() || !canvas.len().is_multiple_of(4) {
        return Err(CapError::validation(
            "over_layer_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in canvas.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        premultiply_rgba8_in_place(d);
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
        unpremultiply_rgba8_in_place(d);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
