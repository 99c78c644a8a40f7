use std::io::Read;

use base64::{Engine as _, engine::general_purpose};

use crate::{CapError, CapResult};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Media type sniffed from the leading bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

pub fn data_uri_with_mime(bytes: &[u8], mime: &str) -> String {
    let b64 = general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{b64}")
}

/// Self-contained `data:` URI for displaying `bytes`.
pub fn to_data_uri(bytes: &[u8]) -> String {
    data_uri_with_mime(bytes, sniff_mime(bytes))
}

pub fn data_uri_from_reader<R: Read>(mut reader: R) -> CapResult<String> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| CapError::read(format!("read preview bytes: {e}")))?;
    Ok(to_data_uri(&bytes))
}
