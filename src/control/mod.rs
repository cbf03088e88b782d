//! Control module - the page-0 configuration frame.
//!
//! Page 0 is the control frame of a transfer: JSON metadata that must be
//! parsed exactly once, before any data page can be validated. All later
//! pages are opaque chunks until the whole payload is reassembled.
//!
//! # Workflow
//!
//! 1. Exporter renders page 0 (configuration) followed by pages `1..total_pages`
//! 2. Receiver scans page 0 and parses it with [`parse_configuration`]
//! 3. Data pages are accumulated in order by [`crate::transfer::TransferState`]
//! 4. The reassembled payload is checked against `expected_hash`

mod configuration;

pub use configuration::{keys, parse_configuration, TransferConfiguration, DIGEST_HEX_LEN};
