//! Capstamp puts a cap on a profile picture.
//!
//! A source picture is decoded, center-cropped to a square, optionally scanned for a head
//! position, overlaid with the cap graphic and re-encoded as PNG. Everything is an in-memory
//! transform; uploading and display are left to the caller.
#![forbid(unsafe_code)]

pub mod cap;
pub mod composite;
pub mod compositor;
pub mod config;
pub mod core;
pub mod decode;
pub mod detect;
pub mod encode;
pub mod error;
pub mod preview;
pub mod session;
pub mod validate;

pub use cap::CapAsset;
pub use compositor::{CompositeResult, Compositor, Placement, PreviewPair};
pub use config::CompositorOpts;
pub use crate::core::{DEFAULT_CAP_ASPECT, PlacementParams, SquareCrop};
pub use decode::DecodedRaster;
pub use error::{CapError, CapResult};
pub use preview::{data_uri_from_reader, to_data_uri};
pub use session::{PreviewSession, RequestTicket};
pub use validate::{
    MAX_UPLOAD_BYTES, SourceImage, is_acceptable_file_size, is_acceptable_image_input,
};
