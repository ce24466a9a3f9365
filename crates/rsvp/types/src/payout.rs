use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::event::{Event, Rsvp};
use crate::primitive::Wei;

/// Distribution of the deposits left by attendees who were never checked in.
///
/// The unclaimed total is split evenly among confirmed attendees. Whatever cannot be split
/// evenly goes to the event owner, and so does the whole total when nobody was confirmed. The
/// distributed amount is therefore always the full unclaimed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlan {
    pub owner: Address,
    /// Sum of the deposits of every unconfirmed RSVP.
    pub total: Wei,
    /// Amount sent to each confirmed attendee.
    pub share: Wei,
    /// Amount sent to the owner.
    pub remainder: Wei,
    /// Confirmed attendees, in registration order.
    pub recipients: Vec<Address>,
}

impl PayoutPlan {
    pub fn compute(event: &Event, attendees: &[Rsvp]) -> Self {
        let recipients: Vec<Address> =
            attendees.iter().filter(|r| r.confirmed).map(|r| r.attendee).collect();
        let unclaimed = attendees.iter().filter(|r| !r.confirmed).count();

        let total = event.deposit * Wei::from(unclaimed);

        let (share, remainder) = if recipients.is_empty() {
            (Wei::ZERO, total)
        } else {
            let n = Wei::from(recipients.len());
            (total / n, total % n)
        };

        Self { owner: event.owner, total, share, remainder, recipients }
    }

    /// Total amount moved by the payout.
    pub fn distributed(&self) -> Wei {
        self.share * Wei::from(self.recipients.len()) + self.remainder
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, B256, U256};

    use super::*;
    use crate::primitive::EventId;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");

    fn attendee(n: u8, confirmed: bool) -> Rsvp {
        let mut rsvp = Rsvp::new(EventId::new(B256::ZERO), Address::repeat_byte(n));
        rsvp.confirmed = confirmed;
        rsvp.refunded = confirmed;
        rsvp
    }

    fn event(deposit: u64) -> Event {
        Event {
            id: EventId::new(B256::ZERO),
            owner: OWNER,
            name: String::new(),
            description: String::new(),
            timestamp: 0,
            deposit: U256::from(deposit),
            capacity: 10,
            image_ref: None,
            paid_out: false,
            rsvp_count: 0,
            confirmed_count: 0,
        }
    }

    #[test]
    fn single_no_show_goes_to_the_only_confirmed_attendee() {
        let plan = PayoutPlan::compute(&event(100), &[attendee(1, true), attendee(2, false)]);

        assert_eq!(plan.total, U256::from(100));
        assert_eq!(plan.share, U256::from(100));
        assert_eq!(plan.remainder, U256::ZERO);
        assert_eq!(plan.recipients, vec![Address::repeat_byte(1)]);
    }

    #[test]
    fn remainder_goes_to_owner() {
        let attendees = [attendee(1, true), attendee(2, true), attendee(3, true), attendee(4, false)];
        let plan = PayoutPlan::compute(&event(100), &attendees);

        assert_eq!(plan.share, U256::from(33));
        assert_eq!(plan.remainder, U256::from(1));
        assert_eq!(plan.distributed(), plan.total);
    }

    #[test]
    fn nobody_confirmed_returns_everything_to_owner() {
        let plan = PayoutPlan::compute(&event(70), &[attendee(1, false), attendee(2, false)]);

        assert!(plan.recipients.is_empty());
        assert_eq!(plan.share, U256::ZERO);
        assert_eq!(plan.remainder, U256::from(140));
        assert_eq!(plan.distributed(), plan.total);
    }

    #[test]
    fn conservation_holds_for_any_split() {
        for confirmed in 0..7u8 {
            for unconfirmed in 0..7u8 {
                let attendees: Vec<_> = (0..confirmed)
                    .map(|i| attendee(i, true))
                    .chain((0..unconfirmed).map(|i| attendee(100 + i, false)))
                    .collect();
                let plan = PayoutPlan::compute(&event(97), &attendees);
                assert_eq!(plan.total, U256::from(97u64 * unconfirmed as u64));
                assert_eq!(plan.distributed(), plan.total);
            }
        }
    }
}
