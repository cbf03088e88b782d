//! JSON codec using `serde_json`.
//!
//! Both JSON documents in a transfer (the page-0 configuration and the
//! reassembled account record) are a contract with the exporter: key names
//! are snake_case and must match bit-for-bit.
//!
//! # Example
//!
//! ```
//! use account_transfer::codec::JsonCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message {
//!     user_id: String,
//! }
//!
//! let msg = Message { user_id: "u1".to_string() };
//! let encoded = JsonCodec::encode(&msg).unwrap();
//! assert_eq!(encoded, br#"{"user_id":"u1"}"#);
//! let decoded: Message = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

/// JSON codec for wire documents.
///
/// Compact output (no whitespace) so encoded payloads stay small enough
/// for QR pages.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to compact JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(value)
    }

    /// Encode a value to a compact JSON string.
    #[inline]
    pub fn encode_string<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string(value)
    }

    /// Decode JSON bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not JSON or do not match type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Decode JSON bytes into an untyped object map.
    ///
    /// Returns `None` if the document parses but its root is not an object.
    pub fn decode_object(
        bytes: &[u8],
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, serde_json::Error> {
        match serde_json::from_slice(bytes)? {
            serde_json::Value::Object(map) => Ok(Some(map)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestStruct {
        user_id: String,
        total_pages: u32,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = TestStruct {
            user_id: "u1".to_string(),
            total_pages: 3,
        };

        let encoded = JsonCodec::encode(&original).unwrap();
        let decoded: TestStruct = JsonCodec::decode(&encoded).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_is_compact() {
        let value = TestStruct {
            user_id: "u1".to_string(),
            total_pages: 3,
        };
        let encoded = JsonCodec::encode_string(&value).unwrap();
        assert_eq!(encoded, r#"{"user_id":"u1","total_pages":3}"#);
    }

    #[test]
    fn test_decode_invalid_json() {
        let result: Result<TestStruct, _> = JsonCodec::decode(b"{not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_type_mismatch() {
        let result: Result<TestStruct, _> =
            JsonCodec::decode(br#"{"user_id":"u1","total_pages":"three"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_object() {
        let map = JsonCodec::decode_object(br#"{"a":1}"#).unwrap().unwrap();
        assert_eq!(map["a"], 1);

        assert!(JsonCodec::decode_object(b"[1,2]").unwrap().is_none());
        assert!(JsonCodec::decode_object(b"\"str\"").unwrap().is_none());
        assert!(JsonCodec::decode_object(b"").is_err());
    }
}
