#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod ledger;
mod registry;

pub use ledger::{TestLedger, GENESIS_TIMESTAMP, REGISTRY_ADDRESS};
pub use registry::expected_event_id;
