use std::path::Path;

use crate::{CapError, CapResult};

/// Largest accepted upload, 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Raw picture bytes as handed over by an upload surface, plus their declared media type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Read a file, declaring its media type from the extension.
    pub fn from_path(path: &Path) -> CapResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| CapError::read(format!("read '{}': {e}", path.display())))?;
        let media_type = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        Ok(Self::new(bytes, media_type))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_acceptable_image_input(&self) -> bool {
        is_acceptable_image_input(&self.media_type)
    }

    pub fn is_acceptable_file_size(&self) -> bool {
        is_acceptable_file_size(self.len())
    }

    /// Both upload checks, reported with a user-facing message.
    pub fn check(&self, max_bytes: u64) -> CapResult<()> {
        if !self.is_acceptable_image_input() {
            return Err(CapError::validation("Please upload a valid image file"));
        }
        if self.len() > max_bytes {
            return Err(CapError::validation(format!(
                "Image must be less than {}",
                format_size(max_bytes)
            )));
        }
        Ok(())
    }
}

/// Whole MB or KB when the limit divides evenly, bytes otherwise.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB && bytes.is_multiple_of(MB) {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes.is_multiple_of(KB) {
        format!("{}KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}

pub fn is_acceptable_image_input(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

pub fn is_acceptable_file_size(len: u64) -> bool {
    len <= MAX_UPLOAD_BYTES
}
