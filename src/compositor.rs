use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    CapResult,
    cap::{self, CapAsset},
    composite,
    config::CompositorOpts,
    core::{PlacementParams, SquareCrop},
    decode, detect, encode, preview,
    session::{PreviewSession, RequestTicket},
    validate::SourceImage,
};

/// How the cap is positioned for one call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    Explicit(PlacementParams),
    Auto,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompositeResult {
    /// PNG bytes of the `side x side` canvas.
    pub png: Vec<u8>,
    pub crop: SquareCrop,
    /// Placement actually drawn (detected one for [`Placement::Auto`]).
    pub placement: PlacementParams,
}

impl CompositeResult {
    pub fn side(&self) -> u32 {
        self.crop.side
    }
}

/// Before/after previews for an upload, plus the capped PNG for handing to an uploader.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewPair {
    pub original: String,
    pub capped: String,
    pub result: CompositeResult,
}

/// Center-crops a picture and draws the cap on top.
///
/// Holds no per-call state: the cap is shared read-only, so one compositor can serve any number
/// of overlapping calls.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    opts: CompositorOpts,
    custom_cap: Option<Arc<CapAsset>>,
}

impl Compositor {
    /// Validate `opts` and load `opts.cap_path` when set.
    pub fn new(opts: CompositorOpts) -> CapResult<Self> {
        opts.validate()?;
        let custom_cap = match &opts.cap_path {
            Some(path) => Some(Arc::new(CapAsset::from_path(path)?)),
            None => None,
        };
        Ok(Self { opts, custom_cap })
    }

    pub fn with_cap(opts: CompositorOpts, cap: CapAsset) -> CapResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            custom_cap: Some(Arc::new(cap)),
        })
    }

    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    pub fn cap(&self) -> CapResult<&CapAsset> {
        match &self.custom_cap {
            Some(cap) => Ok(cap.as_ref()),
            None => cap::builtin(),
        }
    }

    pub fn check_upload(&self, source: &SourceImage) -> CapResult<()> {
        source.check(self.opts.max_upload_bytes)
    }

    pub fn composite_with_placement(
        &self,
        source: &[u8],
        params: PlacementParams,
    ) -> CapResult<CompositeResult> {
        self.composite(source, Placement::Explicit(params))
    }

    pub fn composite_auto(&self, source: &[u8]) -> CapResult<CompositeResult> {
        self.composite(source, Placement::Auto)
    }

    /// Decode and crop `source`, then run the head heuristic without drawing anything.
    pub fn detect_placement(&self, source: &[u8]) -> CapResult<PlacementParams> {
        let raster = decode::decode_source(source)?;
        let (_, square) = decode::center_crop(&raster)?;
        Ok(detect::estimate_placement(&square))
    }

    #[tracing::instrument(skip(self, source), fields(source_len = source.len()))]
    pub fn composite(&self, source: &[u8], placement: Placement) -> CapResult<CompositeResult> {
        let raster = decode::decode_source(source)?;
        let (crop, mut canvas) = decode::center_crop(&raster)?;
        drop(raster);

        let params = match placement {
            Placement::Explicit(params) => params,
            Placement::Auto => detect::estimate_placement(&canvas),
        };
        let rect = params.cap_rect(crop.side, self.opts.cap_aspect);
        tracing::debug!(?crop, ?params, ?rect, "cap placement");

        let layer = self.cap()?.render_layer(crop.side, rect)?;

        composite::over_layer_in_place(&mut canvas, layer.data())?;

        let png = encode::encode_png(canvas)?;
        Ok(CompositeResult {
            png,
            crop,
            placement: params,
        })
    }

    pub fn preview_pair(
        &self,
        source: &SourceImage,
        placement: Placement,
    ) -> CapResult<PreviewPair> {
        let original = preview::data_uri_with_mime(&source.bytes, &source.media_type);
        let result = self.composite(&source.bytes, placement)?;
        let capped = preview::to_data_uri(&result.png);
        Ok(PreviewPair {
            original,
            capped,
            result,
        })
    }

    /// Run one request under `session`'s "last request wins" rule.
    ///
    /// Returns `Ok(true)` when the result was applied and `Ok(false)` when the ticket had been
    /// superseded, either before work started or by the time it finished. Failures of
    /// superseded requests are swallowed the same way.
    pub fn composite_into(
        &self,
        session: &PreviewSession<CompositeResult>,
        ticket: RequestTicket,
        source: &[u8],
        placement: Placement,
    ) -> CapResult<bool> {
        if !session.is_current(ticket) {
            return Ok(false);
        }
        match self.composite(source, placement) {
            Ok(result) => Ok(session.apply(ticket, result)),
            Err(_) if !session.is_current(ticket) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::CapError;

    fn png(img: RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn red_cap() -> CapAsset {
        CapAsset::from_svg_bytes(
            br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="8"><rect width="10" height="8" fill="#ff0000"/></svg>"##,
        )
        .unwrap()
    }

    #[test]
    fn output_is_square_of_min_side() {
        let src = png(RgbaImage::from_pixel(120, 80, Rgba([0, 0, 255, 255])));
        let out = Compositor::default().composite_auto(&src).unwrap();
        assert_eq!(out.side(), 80);
        assert_eq!(out.crop.x, 20);
        let img = image::load_from_memory(&out.png).unwrap();
        assert_eq!((img.width(), img.height()), (80, 80));
    }

    #[test]
    fn explicit_placement_draws_cap_in_rect() {
        let c = Compositor::with_cap(CompositorOpts::default(), red_cap()).unwrap();
        let src = png(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 255, 255])));
        let out = c
            .composite_with_placement(&src, PlacementParams::new(0.5, 0.0, 0.0))
            .unwrap();
        let img = image::load_from_memory(&out.png).unwrap().to_rgba8();
        // rect is x 25..75, y 0..40
        assert_eq!(img.get_pixel(50, 20).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(50, 60).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(10, 20).0, [0, 0, 255, 255]);
    }

    #[test]
    fn auto_uses_detected_placement() {
        let c = Compositor::default();
        let src = png(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255])));
        let out = c.composite_auto(&src).unwrap();
        assert_eq!(out.placement, PlacementParams::new(0.6, 0.0, -0.35));
        assert_eq!(c.detect_placement(&src).unwrap(), out.placement);
    }

    #[test]
    fn undecodable_source_is_decode_error() {
        let err = Compositor::default()
            .composite_auto(b"GIF89a but not really")
            .unwrap_err();
        assert!(matches!(err, CapError::Decode(_)));
    }

    #[test]
    fn missing_custom_cap_fails_construction() {
        let opts = CompositorOpts {
            cap_path: Some("/nonexistent/cap.png".into()),
            ..CompositorOpts::default()
        };
        assert!(matches!(
            Compositor::new(opts),
            Err(CapError::AssetLoad(_))
        ));
    }

    #[test]
    fn preview_pair_carries_both_uris() {
        let bytes = png(RgbaImage::from_pixel(8, 8, Rgba([200, 200, 200, 255])));
        let source = SourceImage::new(bytes, "image/png");
        let pair = Compositor::default()
            .preview_pair(&source, Placement::Auto)
            .unwrap();
        assert!(pair.original.starts_with("data:image/png;base64,"));
        assert!(pair.capped.starts_with("data:image/png;base64,"));
        assert_eq!(pair.result.side(), 8);
    }

    #[test]
    fn composite_into_skips_superseded_ticket() {
        let c = Compositor::default();
        let session = PreviewSession::new();
        let src = png(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255])));

        let stale = session.begin();
        let fresh = session.begin();
        assert!(!c.composite_into(&session, stale, &src, Placement::Auto).unwrap());
        assert!(session.current().is_none());
        assert!(c.composite_into(&session, fresh, &src, Placement::Auto).unwrap());
        assert_eq!(session.current().unwrap().side(), 16);
    }

    #[test]
    fn composite_into_hides_errors_of_stale_requests() {
        let c = Compositor::default();
        let session = PreviewSession::new();
        let t = session.begin();
        assert!(c.composite_into(&session, t, b"junk", Placement::Auto).is_err());
        let stale = session.begin();
        let _newer = session.begin();
        assert!(!c.composite_into(&session, stale, b"junk", Placement::Auto).unwrap());
    }
}
