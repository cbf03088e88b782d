//! Transfer accumulation, integrity verification and account reconstruction.

mod integrity;
mod reconstruct;
mod state;

pub use integrity::{digest_matches, sha512_hex};
pub(crate) use reconstruct::AccountWireRef;
pub use reconstruct::{finalize, finalize_with_limit, AccountRecord};
pub use state::{
    DuplicatePolicy, Ingested, Phase, Progress, TransferPolicy, TransferState,
    DEFAULT_MAX_PAYLOAD_SIZE,
};
