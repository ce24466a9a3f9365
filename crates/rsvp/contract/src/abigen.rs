//! Typed bindings to the event registry contract.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolError, SolEvent, SolInterface};
use rsvp_types::{Event, EventId, Rsvp, RuleViolation};
use rsvp_utils::Log;

sol! {
    #[sol(all_derives)]
    interface IEventRegistry {
        struct EventRecord {
            bytes32 eventId;
            address owner;
            string name;
            string description;
            uint256 timestamp;
            uint256 deposit;
            uint256 capacity;
            string imageRef;
            bool paidOut;
            uint256 rsvpCount;
            uint256 confirmedCount;
        }

        struct AttendeeRecord {
            address attendee;
            bool confirmed;
            bool refunded;
        }

        event EventCreated(
            bytes32 indexed eventId,
            address indexed owner,
            uint256 timestamp,
            uint256 deposit,
            uint256 capacity
        );
        event NewRsvp(bytes32 indexed eventId, address indexed attendee);
        event AttendeeConfirmed(bytes32 indexed eventId, address indexed attendee);
        event UnclaimedPaidOut(
            bytes32 indexed eventId,
            uint256 total,
            uint256 share,
            uint256 remainder,
            uint256 recipients
        );

        error UnknownEvent(bytes32 eventId);
        error InvalidTiming(uint256 timestamp, uint256 current);
        error InsufficientCapacity();
        error DepositMismatch(uint256 expected, uint256 provided);
        error EventFull(uint256 capacity);
        error AlreadyRegistered(address attendee);
        error Unauthorized(address caller);
        error UnknownAttendee(address attendee);
        error TooEarly(uint256 timestamp, uint256 current);
        error AlreadyPaidOut(bytes32 eventId);

        function createEvent(
            string calldata name,
            string calldata description,
            uint256 timestamp,
            uint256 deposit,
            uint256 capacity,
            string calldata imageRef
        ) external returns (bytes32 eventId);
        function rsvp(bytes32 eventId) external payable;
        function confirmAttendee(bytes32 eventId, address attendee) external;
        function payoutUnclaimed(bytes32 eventId) external;
        function getEvent(bytes32 eventId) external view returns (EventRecord memory record);
        function getAttendees(bytes32 eventId) external view returns (AttendeeRecord[] memory attendees);
    }
}

pub use IEventRegistry::*;

/// Maps a revert payload of the registry to the rule it enforces. `None` for anything else
/// (panics, out of gas, errors of other contracts).
pub fn decode_revert(data: &[u8]) -> Option<RuleViolation> {
    let error = IEventRegistryErrors::abi_decode(data, true).ok()?;

    Some(match error {
        IEventRegistryErrors::UnknownEvent(e) => RuleViolation::UnknownEvent(e.eventId.into()),
        IEventRegistryErrors::InvalidTiming(e) => {
            RuleViolation::InvalidTiming { timestamp: to_u64(e.timestamp), now: to_u64(e.current) }
        }
        IEventRegistryErrors::InsufficientCapacity(_) => RuleViolation::InsufficientCapacity,
        IEventRegistryErrors::DepositMismatch(e) => {
            RuleViolation::DepositMismatch { expected: e.expected, provided: e.provided }
        }
        IEventRegistryErrors::EventFull(e) => {
            RuleViolation::EventFull { capacity: to_u64(e.capacity) }
        }
        IEventRegistryErrors::AlreadyRegistered(e) => RuleViolation::AlreadyRegistered(e.attendee),
        IEventRegistryErrors::Unauthorized(e) => RuleViolation::Unauthorized { caller: e.caller },
        IEventRegistryErrors::UnknownAttendee(e) => RuleViolation::UnknownAttendee(e.attendee),
        IEventRegistryErrors::TooEarly(e) => {
            RuleViolation::TooEarly { timestamp: to_u64(e.timestamp), now: to_u64(e.current) }
        }
        IEventRegistryErrors::AlreadyPaidOut(e) => RuleViolation::AlreadyPaidOut(e.eventId.into()),
    })
}

/// Revert payload the registry emits for `violation`.
pub fn encode_revert(violation: &RuleViolation) -> Bytes {
    let encoded = match violation {
        RuleViolation::UnknownEvent(id) => UnknownEvent { eventId: id.0 }.abi_encode(),
        RuleViolation::InvalidTiming { timestamp, now } => {
            InvalidTiming { timestamp: U256::from(*timestamp), current: U256::from(*now) }.abi_encode()
        }
        RuleViolation::InsufficientCapacity => InsufficientCapacity {}.abi_encode(),
        RuleViolation::DepositMismatch { expected, provided } => {
            DepositMismatch { expected: *expected, provided: *provided }.abi_encode()
        }
        RuleViolation::EventFull { capacity } => {
            EventFull { capacity: U256::from(*capacity) }.abi_encode()
        }
        RuleViolation::AlreadyRegistered(attendee) => {
            AlreadyRegistered { attendee: *attendee }.abi_encode()
        }
        RuleViolation::Unauthorized { caller } => Unauthorized { caller: *caller }.abi_encode(),
        RuleViolation::UnknownAttendee(attendee) => {
            UnknownAttendee { attendee: *attendee }.abi_encode()
        }
        RuleViolation::TooEarly { timestamp, now } => {
            TooEarly { timestamp: U256::from(*timestamp), current: U256::from(*now) }.abi_encode()
        }
        RuleViolation::AlreadyPaidOut(id) => AlreadyPaidOut { eventId: id.0 }.abi_encode(),
    };

    encoded.into()
}

/// Decodes `log` as an `E`, checking its signature topic.
pub fn decode_log<E: SolEvent>(log: &Log) -> Result<E, alloy_sol_types::Error> {
    E::decode_log_data(&log.data, true)
}

/// Turns a decoded event into the rust-side log the provider reports.
pub fn encode_log<E: SolEvent>(address: Address, event: &E) -> Log {
    Log { address, data: event.encode_log_data() }
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        Event {
            id: record.eventId.into(),
            owner: record.owner,
            name: record.name,
            description: record.description,
            timestamp: to_u64(record.timestamp),
            deposit: record.deposit,
            capacity: to_u64(record.capacity),
            image_ref: Some(record.imageRef).filter(|r| !r.is_empty()),
            paid_out: record.paidOut,
            rsvp_count: to_u64(record.rsvpCount),
            confirmed_count: to_u64(record.confirmedCount),
        }
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        EventRecord {
            eventId: event.id.0,
            owner: event.owner,
            name: event.name.clone(),
            description: event.description.clone(),
            timestamp: U256::from(event.timestamp),
            deposit: event.deposit,
            capacity: U256::from(event.capacity),
            imageRef: event.image_ref.clone().unwrap_or_default(),
            paidOut: event.paid_out,
            rsvpCount: U256::from(event.rsvp_count),
            confirmedCount: U256::from(event.confirmed_count),
        }
    }
}

impl AttendeeRecord {
    pub fn into_rsvp(self, event_id: EventId) -> Rsvp {
        Rsvp {
            event_id,
            attendee: self.attendee,
            deposit_paid: true,
            confirmed: self.confirmed,
            refunded: self.refunded,
        }
    }
}

impl From<&Rsvp> for AttendeeRecord {
    fn from(rsvp: &Rsvp) -> Self {
        AttendeeRecord { attendee: rsvp.attendee, confirmed: rsvp.confirmed, refunded: rsvp.refunded }
    }
}

fn to_u64(value: U256) -> u64 {
    value.saturating_to()
}
