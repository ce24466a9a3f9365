use chrono::{DateTime, Utc};
use rsvp_index::{IndexSnapshot, Indexed, IndexedEvent};
use rsvp_types::{Event, Rsvp};

/// Where the data of a view comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Read from the ledger when its latest block had this timestamp.
    Ledger { block_timestamp: u64 },
    /// Served by the index, which had processed up to `block`.
    Index { block: u64 },
}

/// An event ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventView {
    pub event: Event,
    pub attendees: Option<Vec<Rsvp>>,
    pub freshness: Freshness,
}

impl EventView {
    /// True unless the view was read from the ledger. Stale data must not drive a write.
    pub fn stale(&self) -> bool {
        !matches!(self.freshness, Freshness::Ledger { .. })
    }

    pub(crate) fn from_index(row: Indexed<IndexedEvent>) -> Self {
        Self {
            event: row.item.event,
            attendees: Some(row.item.attendees),
            freshness: Freshness::Index { block: row.block },
        }
    }
}

/// A listing of events, always from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub events: Vec<EventView>,
    pub block: u64,
    pub taken_at: DateTime<Utc>,
    /// The index could not be reached; this is the last listing it served for the same filter.
    pub degraded: bool,
}

impl Listing {
    pub(crate) fn from_snapshot(snapshot: &IndexSnapshot, degraded: bool) -> Self {
        let events = snapshot
            .events
            .iter()
            .cloned()
            .map(|item| EventView::from_index(Indexed { block: snapshot.block, item }))
            .collect();

        Self { events, block: snapshot.block, taken_at: snapshot.taken_at, degraded }
    }
}
