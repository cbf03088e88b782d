//! Transfer accumulator for one transfer attempt.
//!
//! Implements a state machine over scanned frames:
//! - `AwaitingConfiguration`: only page 0 is accepted
//! - `Collecting`: only the single next page is accepted
//! - `Complete`: the account record was handed to the caller
//! - `Failed`: absorbing; every further call returns `AlreadyFailed`
//!
//! Strict contiguity turns a stream of repeated and out-of-order camera
//! scans into a deterministic accumulation: anything but the expected page
//! is rejected without touching state, and the caller keeps scanning.
//!
//! A `TransferState` is single-writer. Callers feeding it from a capture
//! callback must serialize `ingest` calls themselves.
//!
//! # Example
//!
//! ```
//! use account_transfer::protocol::decode_frame;
//! use account_transfer::transfer::{sha512_hex, Ingested, TransferState};
//!
//! let data = r#"{"user_id":"u1","fingerprint":"ABCD","armored_key":"KEY"}"#;
//! let config = format!(
//!     r#"100{{"transfer_id":"t","total_pages":2,"user_id":"u1","authentication_token":"a","domain":"d","hash":"{}"}}"#,
//!     sha512_hex(data.as_bytes())
//! );
//!
//! let mut state = TransferState::new();
//! assert_eq!(state.expected_next_page(), Some(0));
//!
//! state.ingest(decode_frame(&config).unwrap()).unwrap();
//! assert_eq!(state.expected_next_page(), Some(1));
//!
//! let page = state.ingest(decode_frame(&format!("101{}", data)).unwrap()).unwrap();
//! assert_eq!(page, Ingested::Page(1));
//! assert!(state.is_ready());
//!
//! let account = state.finalize().unwrap();
//! assert_eq!(account.fingerprint, "ABCD");
//! assert!(state.is_complete());
//! ```

use super::reconstruct::{finalize_with_limit, AccountRecord};
use crate::control::{parse_configuration, TransferConfiguration};
use crate::error::{Result, TransferError};
use crate::protocol::{Frame, Version};

/// Default maximum size of the reassembled account payload (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// What to do when an already-collected page is scanned again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Return `DuplicatePage` (recoverable, state untouched).
    #[default]
    Reject,
    /// Return `Ingested::AlreadyCollected` as a no-op.
    Ignore,
}

/// Accumulator limits and policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    /// Handling of re-scanned pages.
    pub duplicate: DuplicatePolicy,
    /// Maximum reassembled payload size in bytes.
    pub max_payload_size: usize,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            duplicate: DuplicatePolicy::default(),
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

/// Result of a successful `ingest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Page 0 was parsed; collection has started.
    Configuration,
    /// A data page was appended.
    Page(u8),
    /// The page was already collected (only under `DuplicatePolicy::Ignore`).
    AlreadyCollected(u8),
}

/// Observable lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingConfiguration,
    Collecting,
    Complete,
    Failed,
}

/// Scan progress for operator-facing UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Pages accepted so far, configuration page included.
    pub received_pages: usize,
    /// Declared page count, once the configuration is known.
    pub total_pages: Option<u16>,
}

impl Progress {
    /// Fraction of pages received, 0.0 while the total is unknown.
    pub fn fraction(&self) -> f32 {
        match self.total_pages {
            Some(total) if total > 0 => self.received_pages as f32 / f32::from(total),
            _ => 0.0,
        }
    }
}

#[derive(Debug)]
enum State {
    AwaitingConfiguration,
    Collecting {
        configuration: TransferConfiguration,
        /// Version tag of page 0; every data page must match.
        version: Version,
        /// Pages `1..=frames.len()`, in order.
        frames: Vec<Frame>,
        /// Sum of collected payload lengths.
        payload_size: usize,
    },
    Complete {
        configuration: TransferConfiguration,
    },
    Failed {
        cause: TransferError,
    },
}

/// State of one transfer attempt.
///
/// Created empty, mutated by `ingest` and the one-shot `finalize`, and
/// discarded afterwards. Never reused across transfers.
#[derive(Debug)]
pub struct TransferState {
    state: State,
    policy: TransferPolicy,
}

impl TransferState {
    /// Create a new transfer state with the default policy.
    pub fn new() -> Self {
        Self::with_policy(TransferPolicy::default())
    }

    /// Create a new transfer state with a custom policy.
    pub fn with_policy(policy: TransferPolicy) -> Self {
        Self {
            state: State::AwaitingConfiguration,
            policy,
        }
    }

    /// Feed one decoded frame.
    ///
    /// # Errors
    ///
    /// Recoverable (state untouched): `OutOfOrder`, `DuplicatePage`,
    /// `VersionMismatch`.
    ///
    /// Fatal (state moves to `Failed`): `Config`, `PageOutOfRange`,
    /// `PayloadTooLarge`.
    ///
    /// After a terminal phase: `AlreadyFailed`, `AlreadyComplete`.
    pub fn ingest(&mut self, frame: Frame) -> Result<Ingested> {
        let result = self.apply(frame);
        if let Err(err) = &result {
            if is_fatal(err) {
                self.fail(err.clone());
            } else {
                tracing::trace!("Rejected frame: {}", err);
            }
        }
        result
    }

    fn apply(&mut self, frame: Frame) -> Result<Ingested> {
        let duplicate_policy = self.policy.duplicate;
        let max_payload_size = self.policy.max_payload_size;

        match &mut self.state {
            State::Failed { .. } => Err(TransferError::AlreadyFailed),
            State::Complete { .. } => Err(TransferError::AlreadyComplete),

            State::AwaitingConfiguration => {
                if !frame.is_configuration() {
                    return Err(TransferError::OutOfOrder {
                        expected: 0,
                        got: frame.page(),
                    });
                }

                let configuration = parse_configuration(frame.payload())?;
                tracing::debug!(
                    "Transfer {} configured: {} pages, version {}",
                    configuration.transfer_id,
                    configuration.total_pages,
                    frame.version()
                );

                let capacity = configuration.data_pages();
                self.state = State::Collecting {
                    configuration,
                    version: frame.version(),
                    frames: Vec::with_capacity(capacity),
                    payload_size: 0,
                };
                Ok(Ingested::Configuration)
            }

            State::Collecting {
                configuration,
                version,
                frames,
                payload_size,
            } => {
                let page = frame.page();

                if frame.version() != *version {
                    return Err(TransferError::VersionMismatch {
                        expected: *version,
                        got: frame.version(),
                    });
                }

                if u16::from(page) >= configuration.total_pages {
                    return Err(TransferError::PageOutOfRange {
                        page,
                        total_pages: configuration.total_pages,
                    });
                }

                // Page 0 and pages 1..=len are already held.
                if usize::from(page) <= frames.len() {
                    return match duplicate_policy {
                        DuplicatePolicy::Reject => Err(TransferError::DuplicatePage(page)),
                        DuplicatePolicy::Ignore => Ok(Ingested::AlreadyCollected(page)),
                    };
                }

                let expected = frames.len() + 1;
                if usize::from(page) != expected {
                    return Err(TransferError::OutOfOrder {
                        // expected <= page - 1 <= 254 here
                        expected: expected as u8,
                        got: page,
                    });
                }

                let size = *payload_size + frame.payload_len();
                if size > max_payload_size {
                    return Err(TransferError::PayloadTooLarge {
                        size,
                        max: max_payload_size,
                    });
                }

                *payload_size = size;
                frames.push(frame);
                tracing::debug!(
                    "Collected page {}/{}",
                    page,
                    configuration.last_page()
                );
                Ok(Ingested::Page(page))
            }
        }
    }

    /// Verify and decode the collected payload.
    ///
    /// Requires every data page. On success the state moves to `Complete`
    /// and keeps the configuration for the login handshake; on integrity or
    /// payload failure it moves to `Failed` and the buffer is wiped.
    ///
    /// # Errors
    ///
    /// - `AwaitingConfiguration` / `Incomplete` if pages are missing (not fatal)
    /// - `IntegrityMismatch`, `InvalidAccountPayload`, `UserMismatch` (fatal)
    /// - `AlreadyFailed`, `AlreadyComplete` after a terminal phase
    pub fn finalize(&mut self) -> Result<AccountRecord> {
        match &self.state {
            State::Collecting {
                configuration,
                frames,
                ..
            } if frames.len() < configuration.data_pages() => {
                return Err(TransferError::Incomplete {
                    collected: frames.len(),
                    required: configuration.data_pages(),
                });
            }
            State::Collecting { .. } => {}
            State::AwaitingConfiguration => return Err(TransferError::AwaitingConfiguration),
            State::Complete { .. } => return Err(TransferError::AlreadyComplete),
            State::Failed { .. } => return Err(TransferError::AlreadyFailed),
        }

        let (configuration, frames) =
            match std::mem::replace(&mut self.state, State::AwaitingConfiguration) {
                State::Collecting {
                    configuration,
                    frames,
                    ..
                } => (configuration, frames),
                other => {
                    self.state = other;
                    return Err(TransferError::AlreadyFailed);
                }
            };

        let result = finalize_with_limit(
            &frames,
            &configuration.expected_hash,
            self.policy.max_payload_size,
        )
        .and_then(|account| {
            if account.user_id == configuration.user_id {
                Ok(account)
            } else {
                Err(TransferError::UserMismatch)
            }
        });
        drop(frames);

        match result {
            Ok(account) => {
                tracing::debug!("Transfer {} complete", configuration.transfer_id);
                self.state = State::Complete { configuration };
                Ok(account)
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    fn fail(&mut self, cause: TransferError) {
        tracing::warn!("Transfer failed: {}", cause);
        self.state = State::Failed { cause };
    }

    /// Next page the accumulator will accept.
    ///
    /// `Some(0)` before configuration, `None` once every page is held or the
    /// transfer reached a terminal phase.
    pub fn expected_next_page(&self) -> Option<u8> {
        match &self.state {
            State::AwaitingConfiguration => Some(0),
            State::Collecting {
                configuration,
                frames,
                ..
            } if frames.len() < configuration.data_pages() => Some(frames.len() as u8 + 1),
            _ => None,
        }
    }

    /// Check if every data page is held and `finalize` can run.
    pub fn is_ready(&self) -> bool {
        matches!(
            &self.state,
            State::Collecting { configuration, frames, .. }
                if frames.len() == configuration.data_pages()
        )
    }

    /// Check if the account record was produced.
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Complete { .. })
    }

    /// Check if the transfer failed.
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed { .. })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        match self.state {
            State::AwaitingConfiguration => Phase::AwaitingConfiguration,
            State::Collecting { .. } => Phase::Collecting,
            State::Complete { .. } => Phase::Complete,
            State::Failed { .. } => Phase::Failed,
        }
    }

    /// The parsed configuration, while collecting or after completion.
    pub fn configuration(&self) -> Option<&TransferConfiguration> {
        match &self.state {
            State::Collecting { configuration, .. } | State::Complete { configuration } => {
                Some(configuration)
            }
            _ => None,
        }
    }

    /// Consume the state and return the configuration of a completed transfer.
    pub fn into_configuration(self) -> Option<TransferConfiguration> {
        match self.state {
            State::Complete { configuration } => Some(configuration),
            _ => None,
        }
    }

    /// Number of data pages held (configuration page excluded).
    pub fn collected_pages(&self) -> usize {
        match &self.state {
            State::Collecting { frames, .. } => frames.len(),
            State::Complete { configuration } => configuration.data_pages(),
            _ => 0,
        }
    }

    /// Progress for UI reporting.
    pub fn progress(&self) -> Progress {
        match &self.state {
            State::AwaitingConfiguration | State::Failed { .. } => Progress {
                received_pages: 0,
                total_pages: None,
            },
            State::Collecting {
                configuration,
                frames,
                ..
            } => Progress {
                received_pages: frames.len() + 1,
                total_pages: Some(configuration.total_pages),
            },
            State::Complete { configuration } => Progress {
                received_pages: usize::from(configuration.total_pages),
                total_pages: Some(configuration.total_pages),
            },
        }
    }

    /// Why the transfer failed, if it did.
    pub fn failure(&self) -> Option<&TransferError> {
        match &self.state {
            State::Failed { cause } => Some(cause),
            _ => None,
        }
    }

    /// The active policy.
    pub fn policy(&self) -> &TransferPolicy {
        &self.policy
    }
}

impl Default for TransferState {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that end the transfer attempt.
fn is_fatal(err: &TransferError) -> bool {
    !err.is_recoverable()
        && !matches!(
            err,
            TransferError::AlreadyFailed | TransferError::AlreadyComplete
        )
}
