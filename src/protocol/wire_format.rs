//! Wire format encoding and decoding.
//!
//! One scanned QR code carries one frame as text:
//! ```text
//! ┌─────────┬──────────┬──────────────────────┐
//! │ Version │ Page     │ Payload              │
//! │ 1 char  │ 2 chars  │ rest of the text     │
//! │ "1"|"2" │ hex u8   │ UTF-8                │
//! └─────────┴──────────┴──────────────────────┘
//! ```
//!
//! Page 0 carries the transfer configuration, pages `1..total_pages` carry
//! consecutive chunks of the account payload.

use std::fmt;

use bytes::Bytes;

use super::Frame;
use crate::error::FrameError;

/// Version tag size in characters.
pub const VERSION_TAG_LEN: usize = 1;

/// Page field size in characters (two hex digits).
pub const PAGE_FIELD_LEN: usize = 2;

/// Minimum length of a well-formed frame (version + page, empty payload).
pub const FRAME_PREFIX_LEN: usize = VERSION_TAG_LEN + PAGE_FIELD_LEN;

/// Page reserved for the transfer configuration.
pub const CONFIGURATION_PAGE: u8 = 0;

/// Number of pages addressable by the page field.
pub const MAX_PAGES: u16 = 256;

/// Frame format version.
///
/// This is an allow-list: a new tag gets a new variant, old tags keep
/// their own validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// Tag `"1"`.
    V1,
    /// Tag `"2"`.
    V2,
}

impl Version {
    /// Every version this crate can decode.
    pub const SUPPORTED: [Version; 2] = [Version::V1, Version::V2];

    /// Look up a version by its one-character tag.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            '1' => Some(Version::V1),
            '2' => Some(Version::V2),
            _ => None,
        }
    }

    /// The one-character wire tag.
    #[inline]
    pub fn tag(self) -> char {
        match self {
            Version::V1 => '1',
            Version::V2 => '2',
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Encode the version tag and page field that prefix every frame.
///
/// # Example
///
/// ```
/// use account_transfer::protocol::{encode_prefix, Version};
///
/// assert_eq!(encode_prefix(Version::V1, 0x0A), "10A");
/// ```
pub fn encode_prefix(version: Version, page: u8) -> String {
    format!("{}{:02X}", version.tag(), page)
}

/// Decode one scanned string into a [`Frame`], accepting every supported version.
///
/// # Example
///
/// ```
/// use account_transfer::protocol::{decode_frame, Version};
///
/// let frame = decode_frame("201hello").unwrap();
/// assert_eq!(frame.version(), Version::V2);
/// assert_eq!(frame.page(), 1);
/// assert_eq!(frame.payload(), b"hello");
/// ```
pub fn decode_frame(raw: &str) -> Result<Frame, FrameError> {
    decode_frame_with(raw, &Version::SUPPORTED)
}

/// Decode one scanned string, accepting only the versions in `allowed`.
///
/// Checks, in order:
/// - Input is not empty
/// - First character is an allowed version tag
/// - Next two characters are hex digits
pub fn decode_frame_with(raw: &str, allowed: &[Version]) -> Result<Frame, FrameError> {
    let mut chars = raw.chars();
    let tag = chars.next().ok_or(FrameError::Empty)?;

    let version = Version::from_tag(tag)
        .filter(|v| allowed.contains(v))
        .ok_or(FrameError::UnsupportedVersion(tag))?;

    let rest = chars.as_str();
    let page = decode_page_field(rest)?;

    // The page field is two ASCII digits, so byte 2 is a char boundary.
    let payload = &rest[PAGE_FIELD_LEN..];

    Ok(Frame::new(
        version,
        page,
        Bytes::copy_from_slice(payload.as_bytes()),
    ))
}

/// Decode a frame from raw scanner bytes.
///
/// Some QR decoders hand back bytes rather than text; anything that is not
/// valid UTF-8 is rejected before framing.
pub fn decode_frame_bytes(raw: &[u8]) -> Result<Frame, FrameError> {
    let text = std::str::from_utf8(raw).map_err(|_| FrameError::Encoding)?;
    decode_frame(text)
}

fn decode_page_field(rest: &str) -> Result<u8, FrameError> {
    let field: String = rest.chars().take(PAGE_FIELD_LEN).collect();

    if field.chars().count() < PAGE_FIELD_LEN {
        return Err(FrameError::MalformedPage(format!(
            "expected {} hex characters, got {:?}",
            PAGE_FIELD_LEN, field
        )));
    }

    // from_str_radix alone would accept a leading '+'
    if !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FrameError::MalformedPage(format!("{:?} is not hex", field)));
    }

    u8::from_str_radix(&field, 16).map_err(|e| FrameError::MalformedPage(e.to_string()))
}
