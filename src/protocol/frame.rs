//! Frame struct with typed accessors.
//!
//! Represents one decoded QR scan: version tag, page index and payload.
//! Uses `bytes::Bytes` so the accumulator can hold payloads without copying.
//!
//! # Example
//!
//! ```
//! use account_transfer::protocol::{build_frame, decode_frame, Frame, Version};
//!
//! let frame = Frame::from_text(Version::V1, 3, "chunk");
//! assert_eq!(frame.encode(), "103chunk");
//!
//! let raw = build_frame(Version::V2, 0, "{}");
//! assert_eq!(decode_frame(&raw).unwrap().page(), 0);
//! ```

use bytes::Bytes;

use super::wire_format::{encode_prefix, Version, CONFIGURATION_PAGE, FRAME_PREFIX_LEN};

/// One decoded frame.
///
/// Immutable once constructed. The payload is always valid UTF-8 because
/// frames only come from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    version: Version,
    page: u8,
    payload: Bytes,
}

impl Frame {
    /// Caller guarantees `payload` is UTF-8.
    pub(crate) fn new(version: Version, page: u8, payload: Bytes) -> Self {
        Self {
            version,
            page,
            payload,
        }
    }

    /// Create a frame from a text payload (copies data).
    pub fn from_text(version: Version, page: u8, payload: &str) -> Self {
        Self::new(version, page, Bytes::copy_from_slice(payload.as_bytes()))
    }

    /// Get the version tag.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the page index.
    #[inline]
    pub fn page(&self) -> u8 {
        self.page
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Get the payload length in bytes.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Check if this is the configuration frame (page 0).
    #[inline]
    pub fn is_configuration(&self) -> bool {
        self.page == CONFIGURATION_PAGE
    }

    /// Re-encode the frame as scan text.
    pub fn encode(&self) -> String {
        build_frame(
            self.version,
            self.page,
            &String::from_utf8_lossy(&self.payload),
        )
    }
}

/// Build the scan text for one frame.
///
/// This is what the exporter renders into a QR code.
pub fn build_frame(version: Version, page: u8, payload: &str) -> String {
    let mut buf = String::with_capacity(FRAME_PREFIX_LEN + payload.len());
    buf.push_str(&encode_prefix(version, page));
    buf.push_str(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_frame;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::from_text(Version::V1, 7, "hello");

        assert_eq!(frame.version(), Version::V1);
        assert_eq!(frame.page(), 7);
        assert_eq!(frame.payload(), b"hello");
        assert_eq!(frame.payload_len(), 5);
        assert!(!frame.is_configuration());
    }

    #[test]
    fn test_configuration_frame() {
        let frame = Frame::from_text(Version::V2, 0, "{}");
        assert!(frame.is_configuration());
    }

    #[test]
    fn test_frame_empty_payload() {
        let frame = Frame::from_text(Version::V1, 1, "");

        assert_eq!(frame.payload_len(), 0);
        assert!(frame.payload().is_empty());
        assert_eq!(frame.encode(), "101");
    }

    #[test]
    fn test_payload_bytes_zero_copy() {
        let original = Bytes::from_static(b"test data");
        let frame = Frame::new(Version::V1, 1, original.clone());

        let cloned = frame.payload_bytes();
        assert_eq!(cloned, original);
        assert_eq!(cloned.as_ptr(), original.as_ptr());
    }

    #[test]
    fn test_build_frame() {
        assert_eq!(build_frame(Version::V1, 0, "{}"), "100{}");
        assert_eq!(build_frame(Version::V2, 0xFF, "x"), "2FFx");
    }

    #[test]
    fn test_build_frame_roundtrip() {
        let original = Frame::from_text(Version::V2, 0x1C, "\"armored_key\":\"-----BEGIN");
        let decoded = decode_frame(&original.encode()).unwrap();
        assert_eq!(decoded, original);
    }
}
