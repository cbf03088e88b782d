//! Page-0 transfer configuration.
//!
//! The configuration frame tells the receiver:
//! - How many pages the exporter emits (including page 0)
//! - Which transfer, user and server the sequence belongs to
//! - The one-time token for the post-transfer handshake
//! - The SHA-512 hex digest of the reassembled data pages
//!
//! # Example
//!
//! ```
//! use account_transfer::control::parse_configuration;
//!
//! let payload = br#"{
//!     "transfer_id": "t-1",
//!     "total_pages": 3,
//!     "user_id": "u1",
//!     "authentication_token": "secret",
//!     "domain": "https://example.org",
//!     "hash": "00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000"
//! }"#;
//!
//! let config = parse_configuration(payload).unwrap();
//! assert_eq!(config.total_pages, 3);
//! assert_eq!(config.data_pages(), 2);
//! ```

use serde_json::{Map, Value};

use crate::codec::JsonCodec;
use crate::error::ConfigError;
use crate::protocol::MAX_PAGES;
use crate::secret::SecretString;

/// Wire key names, shared with the exporter.
pub mod keys {
    /// Transfer session identifier.
    pub const TRANSFER_ID: &str = "transfer_id";
    /// Total frame count, configuration frame included.
    pub const TOTAL_PAGES: &str = "total_pages";
    /// Account being transferred.
    pub const USER_ID: &str = "user_id";
    /// One-time token for the session handshake.
    pub const AUTHENTICATION_TOKEN: &str = "authentication_token";
    /// Server origin of the account.
    pub const DOMAIN: &str = "domain";
    /// Hex SHA-512 of the concatenated data pages.
    pub const HASH: &str = "hash";
}

/// Hex length of a SHA-512 digest.
pub const DIGEST_HEX_LEN: usize = 128;

/// Transfer metadata parsed from the page-0 frame.
#[derive(Debug, PartialEq, Eq)]
pub struct TransferConfiguration {
    /// Opaque transfer session identifier.
    pub transfer_id: String,
    /// Frames the exporter emits, configuration frame included (2..=256).
    pub total_pages: u16,
    /// Identifier of the account being transferred.
    pub user_id: String,
    /// One-time token, passed through to the login handshake.
    pub authentication_token: SecretString,
    /// Server origin associated with the account.
    pub domain: String,
    /// Lowercase hex SHA-512 the reassembled data pages must match.
    pub expected_hash: String,
}

impl TransferConfiguration {
    /// Number of data frames (every page except the configuration).
    #[inline]
    pub fn data_pages(&self) -> usize {
        usize::from(self.total_pages) - 1
    }

    /// Index of the last page of the transfer.
    #[inline]
    pub fn last_page(&self) -> u8 {
        // total_pages is validated to 2..=256
        (self.total_pages - 1) as u8
    }
}

/// Parse the page-0 payload into a [`TransferConfiguration`].
///
/// # Errors
///
/// - `MalformedJson` if the payload is not a JSON object
/// - `MissingField` if a key is absent or has the wrong type
/// - `InvalidPageCount` if `total_pages` is outside 2..=256
/// - `InvalidHash` if `hash` is not 128 hex characters
pub fn parse_configuration(payload: &[u8]) -> Result<TransferConfiguration, ConfigError> {
    let mut map = JsonCodec::decode_object(payload)
        .map_err(|e| ConfigError::MalformedJson(e.to_string()))?
        .ok_or_else(|| ConfigError::MalformedJson("root is not an object".to_string()))?;

    let total_pages = map
        .get(keys::TOTAL_PAGES)
        .and_then(Value::as_u64)
        .ok_or(ConfigError::MissingField(keys::TOTAL_PAGES))?;
    if !(2..=u64::from(MAX_PAGES)).contains(&total_pages) {
        return Err(ConfigError::InvalidPageCount(total_pages));
    }

    let transfer_id = take_string(&mut map, keys::TRANSFER_ID)?;
    let user_id = take_string(&mut map, keys::USER_ID)?;
    let authentication_token =
        SecretString::new(take_string(&mut map, keys::AUTHENTICATION_TOKEN)?);
    let domain = take_string(&mut map, keys::DOMAIN)?;

    let hash = take_string(&mut map, keys::HASH)?;
    if hash.len() != DIGEST_HEX_LEN || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidHash);
    }

    Ok(TransferConfiguration {
        transfer_id,
        total_pages: total_pages as u16,
        user_id,
        authentication_token,
        domain,
        expected_hash: hash.to_ascii_lowercase(),
    })
}

/// Remove a string field, moving it out so no copy of a secret stays in the map.
fn take_string(map: &mut Map<String, Value>, key: &'static str) -> Result<String, ConfigError> {
    match map.remove(key) {
        Some(Value::String(value)) => Ok(value),
        _ => Err(ConfigError::MissingField(key)),
    }
}
