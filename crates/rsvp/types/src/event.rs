use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::primitive::{EventId, Wei};

/// An event registered on the ledger.
///
/// The ledger owns this record. Every other copy (the secondary index, a view) is a replica
/// that may lag behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner: Address,
    pub name: String,
    pub description: String,
    /// Start time of the event, in seconds since the unix epoch.
    pub timestamp: u64,
    /// Stake every attendee locks when registering.
    pub deposit: Wei,
    /// Maximum number of RSVPs.
    pub capacity: u64,
    pub image_ref: Option<String>,
    /// Set once, when unclaimed deposits are distributed.
    pub paid_out: bool,
    pub rsvp_count: u64,
    pub confirmed_count: u64,
}

impl Event {
    /// Whether the event start time has been reached at ledger time `now`.
    pub fn has_started(&self, now: u64) -> bool {
        now >= self.timestamp
    }

    pub fn seats_left(&self) -> u64 {
        self.capacity.saturating_sub(self.rsvp_count)
    }

    pub fn is_full(&self) -> bool {
        self.seats_left() == 0
    }
}

/// Registration of one attendee to one event. Unique per `(event_id, attendee)`.
///
/// Records are never deleted, only flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rsvp {
    pub event_id: EventId,
    pub attendee: Address,
    /// A deposit is required to register, so this is true for every recorded RSVP.
    pub deposit_paid: bool,
    /// Set by the organizer at check-in.
    pub confirmed: bool,
    /// The deposit was returned to the attendee.
    pub refunded: bool,
}

impl Rsvp {
    /// A freshly recorded registration: deposit paid, not yet checked in.
    pub fn new(event_id: EventId, attendee: Address) -> Self {
        Self { event_id, attendee, deposit_paid: true, confirmed: false, refunded: false }
    }
}

/// Parameters of an event about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub timestamp: u64,
    pub deposit: Wei,
    pub capacity: u64,
    pub image_ref: Option<String>,
}
