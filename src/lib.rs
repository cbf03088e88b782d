//! # account-transfer
//!
//! Receiver-side decoder for offline account transfer over a sequence of
//! QR codes.
//!
//! A source device displays frames; this crate turns the scanned strings into
//! a verified account record without any network channel.
//!
//! ## Architecture
//!
//! - **Frames**: `<version><2 hex page><payload>`, one per QR code
//! - **Page 0**: JSON configuration (page count, identity, expected SHA-512)
//! - **Pages 1..n**: chunks of the account JSON, accepted strictly in order
//! - **Integrity gate**: the reassembled payload is parsed only if its digest
//!   matches
//!
//! ## Example
//!
//! ```
//! use account_transfer::{AccountRecord, ExportBuilder, Receiver, ScanOutcome, SecretString};
//!
//! let account = AccountRecord::new("u1", "ABCD", SecretString::from("-----KEY-----"));
//! let frames = ExportBuilder::new("t-1", "u1", "token", "https://example.org")
//!     .chunk_size(8)
//!     .build(&account)
//!     .unwrap();
//!
//! let mut receiver = Receiver::new();
//! // The camera delivers repeats and noise; recoverable errors are skipped.
//! for raw in frames.iter().chain(frames.iter()) {
//!     match receiver.scan(raw) {
//!         Ok(ScanOutcome::Completed(record)) => {
//!             assert_eq!(record.fingerprint, "ABCD");
//!             break;
//!         }
//!         Ok(_) => {}
//!         Err(e) if e.is_recoverable() => {}
//!         Err(e) => panic!("transfer failed: {}", e),
//!     }
//! }
//! ```

pub mod codec;
pub mod control;
pub mod error;
pub mod protocol;
pub mod transfer;

mod export;
mod receiver;
mod secret;

pub use error::{ConfigError, ExportError, FrameError, Result, TransferError};
pub use export::{ExportBuilder, DEFAULT_CHUNK_SIZE, DEFAULT_VERSION};
pub use receiver::{
    CompletedTransfer, Receiver, ReceiverBuilder, ScanOutcome, DEFAULT_DUPLICATE_POLICY,
    DEFAULT_IDLE_TIMEOUT,
};
pub use secret::SecretString;
pub use transfer::{AccountRecord, TransferState};
