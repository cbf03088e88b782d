//! Protocol module - wire format and frame types.
//!
//! This module implements the scan-level protocol:
//! - 3-character prefix (version tag + hex page) encoding/decoding
//! - Frame struct with typed accessors

mod frame;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use wire_format::{
    decode_frame, decode_frame_bytes, decode_frame_with, encode_prefix, Version,
    CONFIGURATION_PAGE, FRAME_PREFIX_LEN, MAX_PAGES, PAGE_FIELD_LEN, VERSION_TAG_LEN,
};
