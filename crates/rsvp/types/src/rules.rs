//! Lifecycle rules of events and RSVPs.
//!
//! The same checks run in two places: the contract gateway evaluates them against
//! authoritative reads before submitting anything, so a violation never costs a transaction,
//! and the ledger enforces them again when the transaction executes.

use alloy_primitives::Address;

use crate::event::{Event, NewEvent, Rsvp};
use crate::primitive::{EventId, Wei};

/// A domain rule the requested operation would break. Nothing was written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("event {0} does not exist")]
    UnknownEvent(EventId),
    #[error("event time {timestamp} is not after the current ledger time {now}")]
    InvalidTiming { timestamp: u64, now: u64 },
    #[error("event capacity must be at least 1")]
    InsufficientCapacity,
    #[error("deposit of {provided} wei does not match the required {expected} wei")]
    DepositMismatch { expected: Wei, provided: Wei },
    #[error("event is full ({capacity} seats taken)")]
    EventFull { capacity: u64 },
    #[error("{0} already holds an RSVP for this event")]
    AlreadyRegistered(Address),
    #[error("{caller} is not the owner of this event")]
    Unauthorized { caller: Address },
    #[error("{0} has no RSVP for this event")]
    UnknownAttendee(Address),
    #[error("event starts at {timestamp} but ledger time is {now}")]
    TooEarly { timestamp: u64, now: u64 },
    #[error("unclaimed deposits of event {0} were already paid out")]
    AlreadyPaidOut(EventId),
}

/// Outcome of a valid check-in request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInDecision {
    /// The attendee must be marked confirmed.
    Confirm,
    /// The attendee is already confirmed. Nothing to do.
    AlreadyConfirmed,
}

pub fn check_new_event(event: &NewEvent, now: u64) -> Result<(), RuleViolation> {
    if event.timestamp <= now {
        return Err(RuleViolation::InvalidTiming { timestamp: event.timestamp, now });
    }

    if event.capacity < 1 {
        return Err(RuleViolation::InsufficientCapacity);
    }

    Ok(())
}

/// Checks a registration of `caller` attaching `value`.
///
/// `in_flight` lists attendees whose registration was submitted but is not yet visible in
/// `attendees`; they count as taken seats.
pub fn check_rsvp(
    event: &Event,
    attendees: &[Rsvp],
    in_flight: &[Address],
    caller: Address,
    value: Wei,
) -> Result<(), RuleViolation> {
    if event.paid_out {
        return Err(RuleViolation::AlreadyPaidOut(event.id));
    }

    if attendees.iter().any(|r| r.attendee == caller) || in_flight.contains(&caller) {
        return Err(RuleViolation::AlreadyRegistered(caller));
    }

    if value != event.deposit {
        return Err(RuleViolation::DepositMismatch { expected: event.deposit, provided: value });
    }

    let taken = attendees.len() as u64 + in_flight.len() as u64;
    if taken >= event.capacity {
        return Err(RuleViolation::EventFull { capacity: event.capacity });
    }

    Ok(())
}

pub fn check_confirm(
    event: &Event,
    attendees: &[Rsvp],
    caller: Address,
    attendee: Address,
) -> Result<CheckInDecision, RuleViolation> {
    if caller != event.owner {
        return Err(RuleViolation::Unauthorized { caller });
    }

    let Some(rsvp) = attendees.iter().find(|r| r.attendee == attendee) else {
        return Err(RuleViolation::UnknownAttendee(attendee));
    };

    if rsvp.confirmed {
        return Ok(CheckInDecision::AlreadyConfirmed);
    }

    if event.paid_out {
        return Err(RuleViolation::AlreadyPaidOut(event.id));
    }

    Ok(CheckInDecision::Confirm)
}

pub fn check_payout(event: &Event, now: u64) -> Result<(), RuleViolation> {
    if event.paid_out {
        return Err(RuleViolation::AlreadyPaidOut(event.id));
    }

    if !event.has_started(now) {
        return Err(RuleViolation::TooEarly { timestamp: event.timestamp, now });
    }

    Ok(())
}
