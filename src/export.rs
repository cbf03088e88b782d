//! Exporter-side frame builder.
//!
//! Produces a frame sequence the [`Receiver`](crate::Receiver) accepts:
//! page 0 carries the configuration with the SHA-512 of the data, pages
//! `1..` carry the account JSON split on character boundaries.
//!
//! # Example
//!
//! ```
//! use account_transfer::{AccountRecord, ExportBuilder, SecretString};
//!
//! let account = AccountRecord::new("u1", "ABCD", SecretString::from("KEY"));
//! let frames = ExportBuilder::new("t-1", "u1", "token", "https://example.org")
//!     .chunk_size(20)
//!     .build(&account)
//!     .unwrap();
//!
//! assert!(frames[0].starts_with("100{"));
//! assert!(frames[1].starts_with("101"));
//! ```

use serde::Serialize;
use zeroize::Zeroizing;

use crate::codec::JsonCodec;
use crate::error::ExportError;
use crate::protocol::{build_frame, Version, MAX_PAGES};
use crate::secret::SecretString;
use crate::transfer::{sha512_hex, AccountRecord, AccountWireRef};

/// Default data chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default frame version.
pub const DEFAULT_VERSION: Version = Version::V1;

#[derive(Serialize)]
struct ConfigurationWire<'a> {
    transfer_id: &'a str,
    total_pages: usize,
    user_id: &'a str,
    authentication_token: &'a str,
    domain: &'a str,
    hash: &'a str,
}

/// Builder for an exported frame sequence.
#[derive(Debug)]
pub struct ExportBuilder {
    transfer_id: String,
    user_id: String,
    authentication_token: SecretString,
    domain: String,
    chunk_size: usize,
    version: Version,
}

impl ExportBuilder {
    /// Create a new export builder for one transfer.
    pub fn new(
        transfer_id: impl Into<String>,
        user_id: impl Into<String>,
        authentication_token: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            transfer_id: transfer_id.into(),
            user_id: user_id.into(),
            authentication_token: SecretString::new(authentication_token.into()),
            domain: domain.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            version: DEFAULT_VERSION,
        }
    }

    /// Set the data chunk size in characters.
    ///
    /// Default: 256
    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.chunk_size = chars;
        self
    }

    /// Set the frame version tag.
    ///
    /// Default: `Version::V1`
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Build the frames, configuration first.
    ///
    /// # Errors
    ///
    /// - `InvalidChunkSize` if the chunk size is 0
    /// - `TooManyPages` if the sequence would exceed 256 frames
    pub fn build(&self, account: &AccountRecord) -> Result<Vec<String>, ExportError> {
        if self.chunk_size == 0 {
            return Err(ExportError::InvalidChunkSize);
        }

        let data = Zeroizing::new(
            JsonCodec::encode_string(&AccountWireRef::from(account))
                .map_err(|e| ExportError::Json(e.to_string()))?,
        );
        let chunks = split_chars(&data, self.chunk_size);

        let total_pages = chunks.len() + 1;
        if total_pages > usize::from(MAX_PAGES) {
            return Err(ExportError::TooManyPages(total_pages));
        }

        let hash = sha512_hex(data.as_bytes());
        let configuration = JsonCodec::encode_string(&ConfigurationWire {
            transfer_id: &self.transfer_id,
            total_pages,
            user_id: &self.user_id,
            authentication_token: self.authentication_token.expose(),
            domain: &self.domain,
            hash: &hash,
        })
        .map_err(|e| ExportError::Json(e.to_string()))?;

        let mut frames = Vec::with_capacity(total_pages);
        frames.push(build_frame(self.version, 0, &configuration));
        for (index, chunk) in chunks.iter().enumerate() {
            // index + 1 < total_pages <= 256
            frames.push(build_frame(self.version, (index + 1) as u8, chunk));
        }

        tracing::debug!(
            "Exported transfer {} as {} frames",
            self.transfer_id,
            total_pages
        );
        Ok(frames)
    }
}

/// Split into chunks of at most `chars` characters. Never empty.
fn split_chars(text: &str, chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == chars {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::parse_configuration;
    use crate::protocol::decode_frame;
    use crate::transfer::digest_matches;

    fn account() -> AccountRecord {
        AccountRecord::new("u1", "ABCD", SecretString::from("KEY"))
    }

    fn builder() -> ExportBuilder {
        ExportBuilder::new("t-1", "u1", "tok", "https://example.org")
    }

    #[test]
    fn test_split_chars() {
        assert_eq!(split_chars("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(split_chars("abcd", 2), vec!["ab", "cd"]);
        assert_eq!(split_chars("", 3), vec![""]);
        assert_eq!(split_chars("äöü€", 3), vec!["äöü", "€"]);
    }

    #[test]
    fn test_configuration_frame() {
        let frames = builder().chunk_size(20).build(&account()).unwrap();
        let config_frame = decode_frame(&frames[0]).unwrap();
        assert!(config_frame.is_configuration());

        let configuration = parse_configuration(config_frame.payload()).unwrap();
        assert_eq!(configuration.transfer_id, "t-1");
        assert_eq!(usize::from(configuration.total_pages), frames.len());
        assert_eq!(configuration.authentication_token.expose(), "tok");
        assert_eq!(configuration.domain, "https://example.org");
    }

    #[test]
    fn test_data_frames_concatenate_to_hashed_payload() {
        let frames = builder().chunk_size(7).build(&account()).unwrap();
        let configuration =
            parse_configuration(decode_frame(&frames[0]).unwrap().payload()).unwrap();

        let mut data = Vec::new();
        for (index, raw) in frames.iter().enumerate().skip(1) {
            let frame = decode_frame(raw).unwrap();
            assert_eq!(usize::from(frame.page()), index);
            assert!(frame.payload_len() <= 7);
            data.extend_from_slice(frame.payload());
        }

        assert_eq!(
            data,
            br#"{"user_id":"u1","fingerprint":"ABCD","armored_key":"KEY"}"#
        );
        assert!(digest_matches(&data, &configuration.expected_hash));
    }

    #[test]
    fn test_version_tag_applied() {
        let frames = builder().version(Version::V2).build(&account()).unwrap();
        assert!(frames.iter().all(|raw| raw.starts_with('2')));
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert_eq!(
            builder().chunk_size(0).build(&account()),
            Err(ExportError::InvalidChunkSize)
        );
    }

    #[test]
    fn test_too_many_pages_rejected() {
        let key = "k".repeat(300);
        let account = AccountRecord::new("u1", "ABCD", SecretString::new(key));
        let result = builder().chunk_size(1).build(&account);
        assert!(matches!(result, Err(ExportError::TooManyPages(n)) if n > 256));
    }
}
