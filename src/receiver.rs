//! Receiver builder and scan loop.
//!
//! The [`ReceiverBuilder`] configures the accepted versions, the accumulator
//! policy and an optional idle timeout. The [`Receiver`] turns raw scanned
//! text into accumulator updates:
//! 1. Decode the scanned string into a frame
//! 2. Ingest it into the transfer state
//! 3. Finalize automatically once the last page lands
//!
//! # Example
//!
//! ```
//! use account_transfer::{AccountRecord, ExportBuilder, Receiver, ScanOutcome, SecretString};
//!
//! let account = AccountRecord::new("u1", "ABCD", SecretString::from("KEY"));
//! let frames = ExportBuilder::new("t-1", "u1", "token", "https://example.org")
//!     .chunk_size(16)
//!     .build(&account)
//!     .unwrap();
//!
//! let mut receiver = Receiver::new();
//! let mut received = None;
//! for raw in &frames {
//!     if let ScanOutcome::Completed(record) = receiver.scan(raw).unwrap() {
//!         received = Some(record);
//!     }
//! }
//! assert_eq!(received.unwrap(), account);
//! ```

use std::time::Duration;

use tokio::sync::mpsc;

use crate::control::TransferConfiguration;
use crate::error::{FrameError, Result, TransferError};
use crate::protocol::{decode_frame_bytes, decode_frame_with, Frame, Version};
use crate::transfer::{
    AccountRecord, DuplicatePolicy, Ingested, Progress, TransferPolicy, TransferState,
    DEFAULT_MAX_PAYLOAD_SIZE,
};

/// Default duplicate handling.
pub const DEFAULT_DUPLICATE_POLICY: DuplicatePolicy = DuplicatePolicy::Reject;

/// Default idle timeout for the scan loop (none).
pub const DEFAULT_IDLE_TIMEOUT: Option<Duration> = None;

/// Outcome of one accepted scan.
#[derive(Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The frame was ingested.
    Accepted(Progress),
    /// The frame was already collected and ignored.
    Ignored(Progress),
    /// The last page landed and the account was verified.
    Completed(AccountRecord),
}

/// A finished transfer: the account and the configuration needed for the
/// post-transfer login handshake.
#[derive(Debug)]
pub struct CompletedTransfer {
    pub configuration: TransferConfiguration,
    pub account: AccountRecord,
}

/// Builder for configuring a [`Receiver`].
#[derive(Debug, Clone)]
pub struct ReceiverBuilder {
    versions: Vec<Version>,
    policy: TransferPolicy,
    idle_timeout: Option<Duration>,
}

impl ReceiverBuilder {
    /// Create a new receiver builder.
    pub fn new() -> Self {
        Self {
            versions: Version::SUPPORTED.to_vec(),
            policy: TransferPolicy::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Set how re-scanned pages are handled.
    ///
    /// Default: `DuplicatePolicy::Reject`
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy.duplicate = policy;
        self
    }

    /// Set the maximum reassembled payload size in bytes.
    ///
    /// Default: 1 MiB
    pub fn max_payload_size(mut self, max: usize) -> Self {
        self.policy.max_payload_size = max;
        self
    }

    /// Set the idle timeout for `run`.
    ///
    /// Default: no timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Restrict the accepted version tags.
    ///
    /// Only supported versions are kept; the list cannot be widened.
    pub fn versions(mut self, versions: &[Version]) -> Self {
        self.versions = Version::SUPPORTED
            .iter()
            .copied()
            .filter(|v| versions.contains(v))
            .collect();
        self
    }

    /// Build the receiver.
    pub fn build(self) -> Receiver {
        Receiver {
            versions: self.versions,
            state: TransferState::with_policy(self.policy),
            idle_timeout: self.idle_timeout,
        }
    }
}

impl Default for ReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of one account transfer.
///
/// Owns exactly one [`TransferState`]; create a new receiver per attempt.
#[derive(Debug)]
pub struct Receiver {
    versions: Vec<Version>,
    state: TransferState,
    idle_timeout: Option<Duration>,
}

impl Receiver {
    /// Create a new receiver builder.
    pub fn builder() -> ReceiverBuilder {
        ReceiverBuilder::new()
    }

    /// Create a receiver with default settings.
    pub fn new() -> Self {
        ReceiverBuilder::new().build()
    }

    /// Process one scanned string.
    ///
    /// # Errors
    ///
    /// Returns the decode or accumulator error. Check
    /// [`TransferError::is_recoverable`] to decide whether to keep scanning.
    pub fn scan(&mut self, raw: &str) -> Result<ScanOutcome> {
        self.check_active()?;
        let frame = decode_frame_with(raw, &self.versions)?;
        self.accept(frame)
    }

    /// Process one scan delivered as raw bytes.
    pub fn scan_bytes(&mut self, raw: &[u8]) -> Result<ScanOutcome> {
        self.check_active()?;
        let frame = decode_frame_bytes(raw)?;
        if !self.versions.contains(&frame.version()) {
            return Err(FrameError::UnsupportedVersion(frame.version().tag()).into());
        }
        self.accept(frame)
    }

    fn check_active(&self) -> Result<()> {
        if self.state.is_failed() {
            Err(TransferError::AlreadyFailed)
        } else if self.state.is_complete() {
            Err(TransferError::AlreadyComplete)
        } else {
            Ok(())
        }
    }

    fn accept(&mut self, frame: Frame) -> Result<ScanOutcome> {
        match self.state.ingest(frame)? {
            Ingested::AlreadyCollected(page) => {
                tracing::trace!("Ignoring already collected page {}", page);
                Ok(ScanOutcome::Ignored(self.state.progress()))
            }
            Ingested::Configuration | Ingested::Page(_) => {
                if self.state.is_ready() {
                    Ok(ScanOutcome::Completed(self.state.finalize()?))
                } else {
                    Ok(ScanOutcome::Accepted(self.state.progress()))
                }
            }
        }
    }

    /// Drive the transfer from a channel of scanned strings.
    ///
    /// Recoverable errors are skipped. Returns on completion, on the first
    /// fatal error, when the idle timeout elapses (`ScanTimeout`) or when the
    /// channel closes first (`ChannelClosed`).
    pub async fn run(mut self, mut rx: mpsc::Receiver<String>) -> Result<CompletedTransfer> {
        loop {
            let next = match self.idle_timeout {
                Some(timeout) => tokio::time::timeout(timeout, rx.recv())
                    .await
                    .map_err(|_| TransferError::ScanTimeout)?,
                None => rx.recv().await,
            };

            let raw = match next {
                Some(raw) => raw,
                None => return Err(TransferError::ChannelClosed),
            };

            match self.scan(&raw) {
                Ok(ScanOutcome::Completed(account)) => {
                    let configuration = self
                        .state
                        .into_configuration()
                        .ok_or(TransferError::AlreadyFailed)?;
                    return Ok(CompletedTransfer {
                        configuration,
                        account,
                    });
                }
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::trace!("Skipping scan: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// The underlying transfer state.
    pub fn state(&self) -> &TransferState {
        &self.state
    }

    /// Next page the receiver will accept.
    pub fn expected_next_page(&self) -> Option<u8> {
        self.state.expected_next_page()
    }

    /// Progress for UI reporting.
    pub fn progress(&self) -> Progress {
        self.state.progress()
    }

    /// The parsed configuration, once page 0 was accepted.
    pub fn configuration(&self) -> Option<&TransferConfiguration> {
        self.state.configuration()
    }

    /// Accepted version tags.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}
