use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rsvp_types::{Event, EventId, Rsvp};
use serde::{Deserialize, Deserializer, Serialize};

/// An item read from the index, with the block the index had processed when it served it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexed<T> {
    pub block: u64,
    pub item: T,
}

/// An event and its registrations as the index saw them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEvent {
    pub event: Event,
    pub attendees: Vec<Rsvp>,
}

/// One registration of an account, with the event it is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRsvp {
    pub event: Event,
    pub rsvp: Rsvp,
}

impl AccountRsvp {
    pub fn event_id(&self) -> EventId {
        self.event.id
    }
}

/// A complete listing taken at once. Only good for display: it may lag the ledger by any
/// number of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Oldest block among the pages the listing was assembled from.
    pub block: u64,
    pub taken_at: DateTime<Utc>,
    pub events: Vec<IndexedEvent>,
}

/// Which events to list. The default lists everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventFilter {
    /// Only events created by this account.
    pub owner: Option<Address>,
    /// Only events starting strictly after this timestamp.
    pub upcoming_after: Option<u64>,
    /// Only events that started strictly before this timestamp.
    pub past_before: Option<u64>,
    /// Rows fetched per request.
    pub page_size: u32,
}

impl EventFilter {
    pub const DEFAULT_PAGE_SIZE: u32 = 100;
    /// Largest page the subgraph serves.
    pub const MAX_PAGE_SIZE: u32 = 1_000;

    pub fn owned_by(mut self, owner: Address) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn upcoming(mut self, now: u64) -> Self {
        self.upcoming_after = Some(now);
        self
    }

    pub fn past(mut self, now: u64) -> Self {
        self.past_before = Some(now);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub(crate) fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, Self::MAX_PAGE_SIZE)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self { owner: None, upcoming_after: None, past_before: None, page_size: Self::DEFAULT_PAGE_SIZE }
    }
}

// Subgraph entities. `BigInt` fields are decimal strings.

#[derive(Debug, Deserialize)]
pub(crate) struct Meta {
    pub block: MetaBlock,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetaBlock {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventEntity {
    id: EventId,
    event_owner: Address,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "imageURL")]
    image_url: Option<String>,
    #[serde(deserialize_with = "big_int_u64")]
    event_timestamp: u64,
    #[serde(deserialize_with = "big_int")]
    deposit: U256,
    #[serde(deserialize_with = "big_int_u64")]
    max_capacity: u64,
    paid_out: bool,
    #[serde(rename = "totalRSVPs", deserialize_with = "big_int_u64")]
    total_rsvps: u64,
    #[serde(deserialize_with = "big_int_u64")]
    total_confirmed_attendees: u64,
    #[serde(default)]
    rsvps: Vec<RsvpEntity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RsvpEntity {
    attendee: AccountRef,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    refunded: bool,
}

/// Link to an `Account` entity, whose id is the account address.
#[derive(Debug, Deserialize)]
pub(crate) struct AccountRef {
    id: Address,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountEntity {
    #[serde(default)]
    pub rsvps: Vec<AccountRsvpEntity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountRsvpEntity {
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    refunded: bool,
    event: EventEntity,
}

impl EventEntity {
    fn event(&self) -> Event {
        Event {
            id: self.id,
            owner: self.event_owner,
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            timestamp: self.event_timestamp,
            deposit: self.deposit,
            capacity: self.max_capacity,
            image_ref: self.image_url.clone().filter(|url| !url.is_empty()),
            paid_out: self.paid_out,
            rsvp_count: self.total_rsvps,
            confirmed_count: self.total_confirmed_attendees,
        }
    }
}

impl From<EventEntity> for IndexedEvent {
    fn from(entity: EventEntity) -> Self {
        let event = entity.event();
        let attendees = entity
            .rsvps
            .into_iter()
            .map(|r| Rsvp {
                event_id: event.id,
                attendee: r.attendee.id,
                deposit_paid: true,
                confirmed: r.confirmed,
                refunded: r.refunded,
            })
            .collect();
        IndexedEvent { event, attendees }
    }
}

impl AccountRsvpEntity {
    pub(crate) fn into_account_rsvp(self, account: Address) -> AccountRsvp {
        let event = self.event.event();
        let rsvp = Rsvp {
            event_id: event.id,
            attendee: account,
            deposit_paid: true,
            confirmed: self.confirmed,
            refunded: self.refunded,
        };
        AccountRsvp { event, rsvp }
    }
}

fn big_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse::<U256>().map_err(serde::de::Error::custom)
}

fn big_int_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse::<u64>().map_err(serde::de::Error::custom)
}
