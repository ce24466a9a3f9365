#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod client;
mod query;
pub mod types;

pub use client::{IndexClient, IndexError};
pub use types::{AccountRsvp, EventFilter, IndexSnapshot, Indexed, IndexedEvent};
