//! Error types for account-transfer.
//!
//! One enum per layer, converging on [`TransferError`]:
//!
//! - [`FrameError`] - a single scanned string could not be decoded
//! - [`ConfigError`] - the page-0 configuration is unusable
//! - [`TransferError`] - sequencing, integrity and lifecycle failures
//! - [`ExportError`] - the exporter could not build a frame sequence

use thiserror::Error;

use crate::protocol::Version;

/// Errors produced while decoding one scanned QR string.
///
/// Always recoverable: the operator rescans and accumulated state is untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The scanned text was empty.
    #[error("Empty frame")]
    Empty,

    /// The version tag is not on the allow-list.
    #[error("Unsupported frame version: {0:?}")]
    UnsupportedVersion(char),

    /// The two-character hex page field is missing or not hex.
    #[error("Malformed page field: {0}")]
    MalformedPage(String),

    /// The scanned bytes are not valid UTF-8 text.
    #[error("Frame payload is not valid UTF-8")]
    Encoding,
}

/// Errors produced while parsing the page-0 configuration payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The payload is not a JSON object.
    #[error("Malformed configuration JSON: {0}")]
    MalformedJson(String),

    /// A required key is absent or has the wrong type.
    #[error("Missing or invalid configuration field: {0}")]
    MissingField(&'static str),

    /// `total_pages` cannot describe a valid transfer.
    #[error("Invalid page count: {0} (expected 2..=256)")]
    InvalidPageCount(u64),

    /// `hash` is not a hex-encoded SHA-512 digest.
    #[error("Expected hash is not a 128-character hex digest")]
    InvalidHash,
}

/// Main error type for all transfer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Scanned string could not be decoded.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Page-0 configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Frame does not carry the next expected page.
    #[error("Out of order frame: expected page {expected}, got {got}")]
    OutOfOrder { expected: u8, got: u8 },

    /// Frame carries a page that was already collected.
    #[error("Duplicate frame for page {0}")]
    DuplicatePage(u8),

    /// Data frame version differs from the configuration frame's.
    #[error("Frame version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: Version, got: Version },

    /// Frame carries a page beyond the declared page count.
    #[error("Page {page} is outside the declared {total_pages} pages")]
    PageOutOfRange { page: u8, total_pages: u16 },

    /// The configuration frame has not been accepted yet.
    #[error("Awaiting configuration frame")]
    AwaitingConfiguration,

    /// Finalize was requested before all pages were collected.
    #[error("Transfer incomplete: {collected} of {required} data pages collected")]
    Incomplete { collected: usize, required: usize },

    /// Reassembled payload exceeds the configured limit.
    #[error("Payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// SHA-512 of the reassembled payload does not match the declared hash.
    #[error("Integrity check failed: payload digest does not match")]
    IntegrityMismatch,

    /// Digest matched but the payload is not a valid account record.
    #[error("Invalid account payload: {0}")]
    InvalidAccountPayload(String),

    /// Account record belongs to a different user than the configuration.
    #[error("Account user does not match the transfer configuration")]
    UserMismatch,

    /// Transfer already failed; start a new one.
    #[error("Transfer already failed")]
    AlreadyFailed,

    /// Transfer already completed.
    #[error("Transfer already complete")]
    AlreadyComplete,

    /// No scan arrived within the idle timeout.
    #[error("Scan timeout")]
    ScanTimeout,

    /// The scan source closed before the transfer completed.
    #[error("Scan channel closed")]
    ChannelClosed,
}

impl TransferError {
    /// Check if the operator can simply rescan.
    ///
    /// Frame-level and sequencing errors never touch accumulated state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransferError::Frame(_)
                | TransferError::OutOfOrder { .. }
                | TransferError::DuplicatePage(_)
                | TransferError::VersionMismatch { .. }
                | TransferError::AwaitingConfiguration
                | TransferError::Incomplete { .. }
        )
    }

    /// Check if this failure should be surfaced as a possible tamper.
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self,
            TransferError::IntegrityMismatch
                | TransferError::InvalidAccountPayload(_)
                | TransferError::UserMismatch
        )
    }
}

/// Errors produced by the exporter-side frame builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Chunk size must be at least one character.
    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    /// The payload needs more pages than the one-byte page field allows.
    #[error("Transfer needs {0} pages, at most 256 are addressable")]
    TooManyPages(usize),

    /// Serialization failed.
    #[error("JSON error: {0}")]
    Json(String),
}

/// Result type alias using TransferError.
pub type Result<T> = std::result::Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_converts_into_transfer_error() {
        let err: TransferError = FrameError::UnsupportedVersion('9').into();
        assert_eq!(err, TransferError::Frame(FrameError::UnsupportedVersion('9')));
        assert!(err.to_string().contains("Unsupported frame version"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(TransferError::OutOfOrder { expected: 1, got: 2 }.is_recoverable());
        assert!(TransferError::DuplicatePage(1).is_recoverable());
        assert!(TransferError::Frame(FrameError::Empty).is_recoverable());

        assert!(!TransferError::IntegrityMismatch.is_recoverable());
        assert!(!TransferError::Config(ConfigError::MissingField("hash")).is_recoverable());
        assert!(!TransferError::AlreadyFailed.is_recoverable());
    }

    #[test]
    fn test_security_relevant_classification() {
        assert!(TransferError::IntegrityMismatch.is_security_relevant());
        assert!(TransferError::InvalidAccountPayload("x".into()).is_security_relevant());
        assert!(TransferError::UserMismatch.is_security_relevant());
        assert!(!TransferError::ScanTimeout.is_security_relevant());
    }
}
