#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod event;
pub mod payout;
pub mod primitive;
pub mod rules;

pub use alloy_primitives::{Address, TxHash};
pub use event::{Event, NewEvent, Rsvp};
pub use payout::PayoutPlan;
pub use primitive::{ChainId, ChainIdParseError, EventId, Wei};
pub use rules::RuleViolation;
