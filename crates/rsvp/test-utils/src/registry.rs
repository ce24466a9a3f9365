//! The event registry contract, executed in memory.

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, U256};
use alloy_sol_types::SolValue;
use rsvp_contract::abigen::{self, IEventRegistry, IEventRegistryCalls};
use rsvp_types::rules::{self, CheckInDecision};
use rsvp_types::{Event, EventId, NewEvent, PayoutPlan, Rsvp, RuleViolation, Wei};
use rsvp_utils::Log;

/// Value transfers and logs of a successful call.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pub logs: Vec<Log>,
    /// Amounts the contract sends out.
    pub transfers: Vec<(Address, Wei)>,
    /// ABI encoded return data.
    pub output: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    address: Address,
    events: HashMap<EventId, (Event, Vec<Rsvp>)>,
    created: u64,
}

impl Registry {
    pub fn new(address: Address) -> Self {
        Self { address, ..Default::default() }
    }

    pub fn event(&self, id: EventId) -> Option<&(Event, Vec<Rsvp>)> {
        self.events.get(&id)
    }

    /// Runs `call` from `sender` carrying `value` at ledger time `now`.
    pub fn execute(
        &mut self,
        call: IEventRegistryCalls,
        sender: Address,
        value: Wei,
        now: u64,
    ) -> Result<Effects, RuleViolation> {
        match call {
            IEventRegistryCalls::createEvent(call) => {
                let new = NewEvent {
                    name: call.name,
                    description: call.description,
                    timestamp: call.timestamp.saturating_to(),
                    deposit: call.deposit,
                    capacity: call.capacity.saturating_to(),
                    image_ref: Some(call.imageRef).filter(|r| !r.is_empty()),
                };
                self.create_event(new, sender, now)
            }
            IEventRegistryCalls::rsvp(call) => self.rsvp(call.eventId.into(), sender, value),
            IEventRegistryCalls::confirmAttendee(call) => {
                self.confirm(call.eventId.into(), sender, call.attendee)
            }
            IEventRegistryCalls::payoutUnclaimed(call) => self.payout(call.eventId.into(), now),
            IEventRegistryCalls::getEvent(call) => {
                let (event, _) = self.lookup(call.eventId.into())?;
                let record = IEventRegistry::EventRecord::from(event);
                Ok(Effects { output: (record,).abi_encode_params(), ..Default::default() })
            }
            IEventRegistryCalls::getAttendees(call) => {
                let (_, attendees) = self.lookup(call.eventId.into())?;
                let records: Vec<IEventRegistry::AttendeeRecord> =
                    attendees.iter().map(Into::into).collect();
                Ok(Effects { output: (records,).abi_encode_params(), ..Default::default() })
            }
        }
    }

    fn lookup(&self, id: EventId) -> Result<&(Event, Vec<Rsvp>), RuleViolation> {
        self.events.get(&id).ok_or(RuleViolation::UnknownEvent(id))
    }

    fn lookup_mut(&mut self, id: EventId) -> Result<&mut (Event, Vec<Rsvp>), RuleViolation> {
        self.events.get_mut(&id).ok_or(RuleViolation::UnknownEvent(id))
    }

    fn create_event(
        &mut self,
        new: NewEvent,
        owner: Address,
        now: u64,
    ) -> Result<Effects, RuleViolation> {
        rules::check_new_event(&new, now)?;

        self.created += 1;
        let id = expected_event_id(owner, self.created);

        let event = Event {
            id,
            owner,
            name: new.name,
            description: new.description,
            timestamp: new.timestamp,
            deposit: new.deposit,
            capacity: new.capacity,
            image_ref: new.image_ref,
            paid_out: false,
            rsvp_count: 0,
            confirmed_count: 0,
        };

        let log = IEventRegistry::EventCreated {
            eventId: id.0,
            owner,
            timestamp: U256::from(event.timestamp),
            deposit: event.deposit,
            capacity: U256::from(event.capacity),
        };
        self.events.insert(id, (event, Vec::new()));

        Ok(Effects {
            logs: vec![abigen::encode_log(self.address, &log)],
            output: id.0.abi_encode(),
            ..Default::default()
        })
    }

    fn rsvp(&mut self, id: EventId, sender: Address, value: Wei) -> Result<Effects, RuleViolation> {
        let address = self.address;
        let (event, attendees) = self.lookup_mut(id)?;
        rules::check_rsvp(event, attendees, &[], sender, value)?;

        attendees.push(Rsvp::new(id, sender));
        event.rsvp_count += 1;

        let log = IEventRegistry::NewRsvp { eventId: id.0, attendee: sender };
        Ok(Effects { logs: vec![abigen::encode_log(address, &log)], ..Default::default() })
    }

    fn confirm(
        &mut self,
        id: EventId,
        sender: Address,
        attendee: Address,
    ) -> Result<Effects, RuleViolation> {
        let address = self.address;
        let (event, attendees) = self.lookup_mut(id)?;

        if rules::check_confirm(event, attendees, sender, attendee)? == CheckInDecision::AlreadyConfirmed {
            return Ok(Effects::default());
        }

        if let Some(rsvp) = attendees.iter_mut().find(|r| r.attendee == attendee) {
            rsvp.confirmed = true;
            rsvp.refunded = true;
        }
        event.confirmed_count += 1;

        let log = IEventRegistry::AttendeeConfirmed { eventId: id.0, attendee };
        Ok(Effects {
            logs: vec![abigen::encode_log(address, &log)],
            transfers: vec![(attendee, event.deposit)],
            ..Default::default()
        })
    }

    fn payout(&mut self, id: EventId, now: u64) -> Result<Effects, RuleViolation> {
        let address = self.address;
        let (event, attendees) = self.lookup_mut(id)?;
        rules::check_payout(event, now)?;

        let plan = PayoutPlan::compute(event, attendees);
        event.paid_out = true;

        let mut transfers: Vec<(Address, Wei)> =
            plan.recipients.iter().map(|r| (*r, plan.share)).collect();
        if !plan.remainder.is_zero() {
            transfers.push((plan.owner, plan.remainder));
        }

        let log = IEventRegistry::UnclaimedPaidOut {
            eventId: id.0,
            total: plan.total,
            share: plan.share,
            remainder: plan.remainder,
            recipients: U256::from(plan.recipients.len()),
        };
        Ok(Effects { logs: vec![abigen::encode_log(address, &log)], transfers, ..Default::default() })
    }
}

/// Event id the registry assigns to the `n`th event created by `owner`, counting from 1 across
/// all owners.
pub fn expected_event_id(owner: Address, n: u64) -> EventId {
    let mut seed = owner.to_vec();
    seed.extend_from_slice(&n.to_be_bytes());
    EventId::new(keccak256(seed))
}
