use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    CapError, CapResult,
    core::{DEFAULT_CAP_ASPECT, PlacementParams},
    validate::MAX_UPLOAD_BYTES,
};

/// Tunables for a [`crate::Compositor`]. Every field has a default, so a JSON file only needs
/// the keys it wants to change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorOpts {
    /// Cap height / cap width.
    pub cap_aspect: f64,
    pub scale_min: f64,
    pub scale_max: f64,
    pub max_upload_bytes: u64,
    /// Custom cap graphic (SVG or raster). `None` uses the built-in cap.
    pub cap_path: Option<PathBuf>,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            cap_aspect: DEFAULT_CAP_ASPECT,
            scale_min: 0.3,
            scale_max: 2.0,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            cap_path: None,
        }
    }
}

impl CompositorOpts {
    pub fn from_json_path(path: &Path) -> CapResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("open config '{}'", path.display()))?;
        let opts: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> CapResult<()> {
        if !self.cap_aspect.is_finite() || self.cap_aspect <= 0.0 {
            return Err(CapError::validation(format!(
                "cap_aspect must be finite and > 0, got {}",
                self.cap_aspect
            )));
        }
        if !self.scale_min.is_finite() || !self.scale_max.is_finite() {
            return Err(CapError::validation("scale range must be finite"));
        }
        if self.scale_min <= 0.0 || self.scale_min > self.scale_max {
            return Err(CapError::validation(format!(
                "scale range [{}, {}] is empty or non-positive",
                self.scale_min, self.scale_max
            )));
        }
        Ok(())
    }

    /// Caller-side clamp for user-driven placement controls.
    pub fn clamp_placement(&self, params: PlacementParams) -> PlacementParams {
        params.clamped(self.scale_min, self.scale_max)
    }
}
