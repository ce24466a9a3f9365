use std::fmt::Display;

use rsvp_contract::GatewayError;
use rsvp_index::IndexError;
use rsvp_types::EventId;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// The ledger says the event does not exist, or neither source knows it.
    #[error("event {0} not found")]
    NotFound(EventId),

    /// A listing failed and no earlier listing for the same filter was cached.
    #[error("index unavailable: {0}")]
    Index(#[source] IndexError),

    #[error("ledger read failed: {0}")]
    Ledger(#[source] GatewayError),

    #[error("no ledger connection to read fresh data from")]
    Disconnected,

    /// Neither the ledger nor the index could serve the event.
    #[error("event {event_id} is unreadable (ledger: {}, index: {})", cause(.ledger), cause(.index))]
    Unavailable { event_id: EventId, ledger: Option<GatewayError>, index: Option<IndexError> },
}

fn cause<E: Display>(err: &Option<E>) -> String {
    match err {
        Some(err) => err.to_string(),
        None => "not available".to_string(),
    }
}
