//! Account reconstruction from collected data frames.
//!
//! Pipeline:
//! 1. Order frames by page and check they are exactly `1..=n`
//! 2. Concatenate payloads into one buffer (wiped on drop)
//! 3. Compare the buffer's SHA-512 against the configuration's hash
//! 4. Only on match, parse the buffer as an [`AccountRecord`]
//!
//! # Example
//!
//! ```
//! use account_transfer::protocol::{Frame, Version};
//! use account_transfer::transfer::{finalize, sha512_hex};
//!
//! let chunks = [r#"{"user_id":"u1","finger"#, r#"print":"ABCD","armored_key":"KEY"}"#];
//! let hash = sha512_hex(chunks.concat().as_bytes());
//! let frames: Vec<Frame> = chunks
//!     .iter()
//!     .enumerate()
//!     .map(|(i, chunk)| Frame::from_text(Version::V1, i as u8 + 1, chunk))
//!     .collect();
//!
//! let account = finalize(&frames, &hash).unwrap();
//! assert_eq!(account.user_id, "u1");
//! assert_eq!(account.armored_key.expose(), "KEY");
//! ```

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::integrity::digest_matches;
use crate::codec::JsonCodec;
use crate::error::{Result, TransferError};
use crate::protocol::Frame;
use crate::secret::SecretString;

/// The transferred account credential.
///
/// Produced at most once per transfer; ownership passes to the caller.
#[derive(Debug, PartialEq, Eq)]
pub struct AccountRecord {
    /// Identifier of the account.
    pub user_id: String,
    /// Key fingerprint.
    pub fingerprint: String,
    /// Armored private key text.
    pub armored_key: SecretString,
}

impl AccountRecord {
    /// Create a new account record.
    pub fn new(
        user_id: impl Into<String>,
        fingerprint: impl Into<String>,
        armored_key: SecretString,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            fingerprint: fingerprint.into(),
            armored_key,
        }
    }
}

/// Wire shape of the account document (decode side).
#[derive(Deserialize)]
struct AccountWire {
    user_id: String,
    fingerprint: String,
    armored_key: String,
}

/// Wire shape of the account document (encode side, borrows).
#[derive(Serialize)]
pub(crate) struct AccountWireRef<'a> {
    pub user_id: &'a str,
    pub fingerprint: &'a str,
    pub armored_key: &'a str,
}

impl<'a> From<&'a AccountRecord> for AccountWireRef<'a> {
    fn from(account: &'a AccountRecord) -> Self {
        Self {
            user_id: &account.user_id,
            fingerprint: &account.fingerprint,
            armored_key: account.armored_key.expose(),
        }
    }
}

/// Verify and decode the collected data frames, with no payload size limit.
///
/// # Errors
///
/// - `OutOfOrder` / `DuplicatePage` if the frames are not exactly pages `1..=n`
/// - `IntegrityMismatch` if the SHA-512 does not match `expected_hash`
/// - `InvalidAccountPayload` if the digest matches but the JSON does not
pub fn finalize(frames: &[Frame], expected_hash: &str) -> Result<AccountRecord> {
    finalize_with_limit(frames, expected_hash, usize::MAX)
}

/// Verify and decode the collected data frames.
///
/// Fails with `PayloadTooLarge` before hashing if the concatenated payloads
/// exceed `max_payload_size` bytes.
pub fn finalize_with_limit(
    frames: &[Frame],
    expected_hash: &str,
    max_payload_size: usize,
) -> Result<AccountRecord> {
    let buffer = reassemble(frames, max_payload_size)?;

    if !digest_matches(&buffer, expected_hash) {
        tracing::warn!(
            "Integrity check failed for {} reassembled bytes",
            buffer.len()
        );
        return Err(TransferError::IntegrityMismatch);
    }

    let wire: AccountWire = JsonCodec::decode(&buffer).map_err(|e| {
        // Keep only the category and position; serde messages can quote values.
        TransferError::InvalidAccountPayload(format!(
            "{:?} error at line {} column {}",
            e.classify(),
            e.line(),
            e.column()
        ))
    })?;

    Ok(AccountRecord {
        user_id: wire.user_id,
        fingerprint: wire.fingerprint,
        armored_key: SecretString::new(wire.armored_key),
    })
}

/// Concatenate payloads in page order.
fn reassemble(frames: &[Frame], max_payload_size: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mut ordered: Vec<&Frame> = frames.iter().collect();
    ordered.sort_by_key(|frame| frame.page());

    for (index, frame) in ordered.iter().enumerate() {
        let expected = index + 1;
        let page = usize::from(frame.page());
        if page == expected {
            continue;
        }
        return Err(if page != 0 && page < expected {
            TransferError::DuplicatePage(frame.page())
        } else {
            TransferError::OutOfOrder {
                expected: expected as u8,
                got: frame.page(),
            }
        });
    }

    let size: usize = ordered.iter().map(|frame| frame.payload_len()).sum();
    if size > max_payload_size {
        return Err(TransferError::PayloadTooLarge {
            size,
            max: max_payload_size,
        });
    }

    let mut buffer = Zeroizing::new(Vec::with_capacity(size));
    for frame in ordered {
        buffer.extend_from_slice(frame.payload());
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Version;
    use crate::transfer::sha512_hex;

    const CHUNK_1: &str = r#"{"user_id":"u1","finger"#;
    const CHUNK_2: &str = r#"print":"ABCD","armored_key":"KEY"}"#;

    fn frames_for(chunks: &[&str]) -> Vec<Frame> {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| Frame::from_text(Version::V1, i as u8 + 1, chunk))
            .collect()
    }

    fn hash_of(chunks: &[&str]) -> String {
        sha512_hex(chunks.concat().as_bytes())
    }

    #[test]
    fn test_finalize_valid_account() {
        let chunks = [CHUNK_1, CHUNK_2];
        let account = finalize(&frames_for(&chunks), &hash_of(&chunks)).unwrap();

        assert_eq!(
            account,
            AccountRecord::new("u1", "ABCD", SecretString::from("KEY"))
        );
    }

    #[test]
    fn test_finalize_orders_frames_by_page() {
        let chunks = [CHUNK_1, CHUNK_2];
        let mut frames = frames_for(&chunks);
        frames.reverse();

        let account = finalize(&frames, &hash_of(&chunks)).unwrap();
        assert_eq!(account.fingerprint, "ABCD");
    }

    #[test]
    fn test_finalize_integrity_mismatch() {
        let chunks = [CHUNK_1, CHUNK_2];
        let tampered = [CHUNK_1, r#"print":"ABCE","armored_key":"KEY"}"#];

        let result = finalize(&frames_for(&tampered), &hash_of(&chunks));
        assert_eq!(result, Err(TransferError::IntegrityMismatch));
    }

    #[test]
    fn test_finalize_wrong_hash_never_parses() {
        // Payload is not even JSON; the digest gate must fire first.
        let chunks = ["not json"];
        let result = finalize(&frames_for(&chunks), &"0".repeat(128));
        assert_eq!(result, Err(TransferError::IntegrityMismatch));
    }

    #[test]
    fn test_finalize_matching_hash_invalid_json() {
        let chunks = [r#"{"user_id":"u1""#];
        let result = finalize(&frames_for(&chunks), &hash_of(&chunks));
        assert!(matches!(result, Err(TransferError::InvalidAccountPayload(_))));
    }

    #[test]
    fn test_finalize_matching_hash_missing_field() {
        let chunks = [r#"{"user_id":"u1","fingerprint":"ABCD"}"#];
        let result = finalize(&frames_for(&chunks), &hash_of(&chunks));
        assert!(matches!(result, Err(TransferError::InvalidAccountPayload(_))));
    }

    #[test]
    fn test_invalid_payload_error_does_not_quote_key() {
        let chunks = [r#"{"user_id":"u1","fingerprint":false,"armored_key":"SECRETKEY"}"#];
        let err = finalize(&frames_for(&chunks), &hash_of(&chunks)).unwrap_err();
        assert!(matches!(err, TransferError::InvalidAccountPayload(_)));
        assert!(!err.to_string().contains("SECRETKEY"));
    }

    #[test]
    fn test_finalize_gap_rejected() {
        let frames = vec![
            Frame::from_text(Version::V1, 1, CHUNK_1),
            Frame::from_text(Version::V1, 3, CHUNK_2),
        ];
        let result = finalize(&frames, &"0".repeat(128));
        assert_eq!(
            result,
            Err(TransferError::OutOfOrder {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn test_finalize_duplicate_rejected() {
        let frames = vec![
            Frame::from_text(Version::V1, 1, CHUNK_1),
            Frame::from_text(Version::V1, 1, CHUNK_1),
        ];
        let result = finalize(&frames, &"0".repeat(128));
        assert_eq!(result, Err(TransferError::DuplicatePage(1)));
    }

    #[test]
    fn test_finalize_configuration_page_rejected() {
        let frames = vec![Frame::from_text(Version::V1, 0, "{}")];
        let result = finalize(&frames, &"0".repeat(128));
        assert_eq!(
            result,
            Err(TransferError::OutOfOrder {
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn test_finalize_payload_limit() {
        let chunks = [CHUNK_1, CHUNK_2];
        let result = finalize_with_limit(&frames_for(&chunks), &hash_of(&chunks), 10);
        assert_eq!(
            result,
            Err(TransferError::PayloadTooLarge {
                size: CHUNK_1.len() + CHUNK_2.len(),
                max: 10
            })
        );
    }

    #[test]
    fn test_wire_ref_serializes_snake_case_keys() {
        let account = AccountRecord::new("u1", "ABCD", SecretString::from("KEY"));
        let json = JsonCodec::encode_string(&AccountWireRef::from(&account)).unwrap();
        assert_eq!(json, r#"{"user_id":"u1","fingerprint":"ABCD","armored_key":"KEY"}"#);
    }

    #[test]
    fn test_account_debug_redacts_key() {
        let account = AccountRecord::new("u1", "ABCD", SecretString::from("PRIVATE"));
        let debug = format!("{:?}", account);
        assert!(debug.contains("u1"));
        assert!(!debug.contains("PRIVATE"));
    }
}
