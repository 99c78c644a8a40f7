//! Best-effort head localization for automatic cap placement.
//!
//! The scan looks at the top 40% of a square, straight-alpha canvas and treats a pixel as part
//! of the head if it passes a coarse skin-tone rule *or* is simply bright. The brightness clause
//! also matches light backgrounds, so on bright photos the estimate drifts toward the top edge
//! and the image center. That behavior is kept as-is; it is a known weakness, not a bug.
//! Fully transparent pixels never count, whatever color they carry.

use image::RgbaImage;

use crate::core::PlacementParams;

/// Rows scanned from the top, as the fraction `SCAN_NUM / SCAN_DEN` of the canvas.
const SCAN_NUM: u64 = 2;
const SCAN_DEN: u64 = 5;

const SCALE_MIN: f64 = 0.6;
const SCALE_MAX: f64 = 0.85;
const HEAD_WIDTH_GAIN: f64 = 1.2;
/// How far above the topmost candidate the cap starts, in canvas heights.
const LIFT_ABOVE_HEAD: f64 = 0.15;
/// Cap top when nothing was found, in canvas heights.
const FALLBACK_OFFSET_Y: f64 = -0.35;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadEstimate {
    pub side: u32,
    /// Smallest row index holding a candidate pixel.
    pub top_row: Option<u32>,
    /// Mean column of candidate pixels, or `side / 2` with no candidates.
    pub center_x: f64,
    pub candidates: u64,
}

impl HeadEstimate {
    /// `sqrt(candidates)`, a rough stand-in for head width in pixels.
    pub fn head_width(&self) -> f64 {
        (self.candidates as f64).sqrt()
    }

    pub fn placement(&self) -> PlacementParams {
        let side = f64::from(self.side);
        if side <= 0.0 {
            return PlacementParams::default();
        }

        let scale = (self.head_width() / side * HEAD_WIDTH_GAIN).clamp(SCALE_MIN, SCALE_MAX);
        let cap_y = match self.top_row {
            Some(top) => f64::from(top) - side * LIFT_ABOVE_HEAD,
            None => side * FALLBACK_OFFSET_Y,
        };
        let cap_x = self.center_x - side / 2.0;

        PlacementParams {
            scale,
            offset_x: cap_x / side,
            offset_y: cap_y / side,
        }
    }
}

pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    r > 95 && g > 40 && b > 20 && r > g && r > b
}

/// Mean channel value above 100.
pub fn is_bright(r: u8, g: u8, b: u8) -> bool {
    u16::from(r) + u16::from(g) + u16::from(b) > 300
}

pub fn is_head_candidate(r: u8, g: u8, b: u8) -> bool {
    is_skin_tone(r, g, b) || is_bright(r, g, b)
}

/// Number of rows scanned on a canvas of `side` rows. Rounds up so tiny canvases still get one.
pub fn scan_rows(side: u32) -> u32 {
    (u64::from(side) * SCAN_NUM).div_ceil(SCAN_DEN) as u32
}

/// Scan `canvas` (expected square) for head candidates.
pub fn scan_head(canvas: &RgbaImage) -> HeadEstimate {
    let side = canvas.width().min(canvas.height());
    let rows = scan_rows(side);

    let mut top_row = None;
    let mut sum_x = 0u64;
    let mut candidates = 0u64;

    for y in 0..rows {
        for x in 0..side {
            let [r, g, b, a] = canvas.get_pixel(x, y).0;
            if a == 0 || !is_head_candidate(r, g, b) {
                continue;
            }
            top_row.get_or_insert(y);
            sum_x += u64::from(x);
            candidates += 1;
        }
    }

    let center_x = if candidates == 0 {
        f64::from(side) / 2.0
    } else {
        sum_x as f64 / candidates as f64
    };

    HeadEstimate {
        side,
        top_row,
        center_x,
        candidates,
    }
}

pub fn estimate_placement(canvas: &RgbaImage) -> PlacementParams {
    let estimate = scan_head(canvas);
    if estimate.candidates == 0 {
        tracing::warn!(
            side = estimate.side,
            "no head candidates found, using default placement"
        );
    }
    let params = estimate.placement();
    tracing::debug!(?estimate, ?params, "auto placement");
    params
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn black(side: u32) -> RgbaImage {
        RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn classification_rules() {
        assert!(is_skin_tone(200, 150, 120));
        assert!(!is_skin_tone(90, 60, 40));
        assert!(!is_skin_tone(120, 130, 40));
        assert!(is_bright(101, 101, 101));
        assert!(!is_bright(100, 100, 100));
        assert!(is_head_candidate(250, 250, 250));
        assert!(!is_head_candidate(0, 0, 0));
    }

    #[test]
    fn no_candidates_falls_back() {
        let p = estimate_placement(&black(50));
        assert!(approx(p.scale, 0.6));
        assert!(approx(p.offset_x, 0.0));
        assert!(approx(p.offset_y, -0.35));
    }

    #[test]
    fn single_candidate_on_top_row_center() {
        let mut img = black(20);
        img.put_pixel(10, 0, Rgba([255, 255, 255, 255]));
        let est = scan_head(&img);
        assert_eq!(est.top_row, Some(0));
        assert_eq!(est.candidates, 1);
        assert!(approx(est.center_x, 10.0));

        let p = est.placement();
        assert!(approx(p.scale, 0.6));
        assert!(approx(p.offset_x, 0.0));
        assert!(approx(p.offset_y, -0.15));
    }

    #[test]
    fn rows_below_scan_band_are_ignored() {
        let mut img = black(10);
        assert_eq!(scan_rows(10), 4);
        img.put_pixel(3, 4, Rgba([255, 255, 255, 255]));
        assert_eq!(scan_head(&img).candidates, 0);
        img.put_pixel(3, 3, Rgba([255, 255, 255, 255]));
        assert_eq!(scan_head(&img).top_row, Some(3));
    }

    #[test]
    fn bright_background_counts_as_head() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([240, 240, 240, 255]));
        let est = scan_head(&img);
        assert_eq!(est.candidates, 40 * 100);
        assert!(approx(est.center_x, 49.5));
        let p = est.placement();
        assert!(approx(p.scale, 4000f64.sqrt() / 100.0 * 1.2));
        assert!(approx(p.offset_y, -0.15));
        assert!(approx(p.offset_x, -0.005));
    }

    #[test]
    fn off_center_blob_shifts_cap() {
        let mut img = black(100);
        for y in 10..30 {
            for x in 60..80 {
                img.put_pixel(x, y, Rgba([210, 160, 130, 255]));
            }
        }
        let est = scan_head(&img);
        assert_eq!(est.top_row, Some(10));
        assert!(approx(est.center_x, 69.5));
        let p = est.placement();
        assert!(approx(p.offset_x, 0.195));
        assert!(approx(p.offset_y, -0.05));
        assert!(approx(p.scale, 0.6));
    }

    #[test]
    fn transparent_background_is_not_head() {
        let mut img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 0]));
        for y in 30..90 {
            for x in 60..90 {
                img.put_pixel(x, y, Rgba([210, 160, 130, 255]));
            }
        }
        let est = scan_head(&img);
        assert_eq!(est.top_row, Some(30));
        assert_eq!(est.candidates, 10 * 30);
        assert!(approx(est.center_x, 74.5));
        let p = est.placement();
        assert!(approx(p.offset_x, 0.245));
        assert!(approx(p.offset_y, 0.15));
        assert!(approx(p.scale, 0.6));
    }

    #[test]
    fn tiny_canvas_scans_one_row() {
        assert_eq!(scan_rows(1), 1);
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        assert_eq!(scan_head(&img).top_row, Some(0));
    }
}
