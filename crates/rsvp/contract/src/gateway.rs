use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, TxHash, U256};
use alloy_sol_types::{SolCall, SolEvent};
use parking_lot::Mutex;
use rsvp_types::rules::{self, CheckInDecision};
use rsvp_types::{ChainId, Event, EventId, NewEvent, PayoutPlan, Rsvp, Wei};
use rsvp_utils::{call_request, LedgerProvider, ProviderError, TransactionReceipt, TxnConfig};
use tracing::{debug, info, trace, warn};

use crate::abigen::{self, IEventRegistry};
use crate::error::{BindingError, GatewayError};
use crate::guard::VerifiedSession;
use crate::pending::PendingTransaction;

const LOG_TARGET: &str = "rsvp::contract::gateway";

/// Result of a check-in request.
#[derive(Debug, Clone)]
pub enum CheckIn {
    /// The attendee was confirmed before. Nothing was submitted.
    AlreadyConfirmed,
    Submitted(PendingTransaction<()>),
}

/// Distribution recorded by a mined payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub event_id: EventId,
    pub total: Wei,
    pub share: Wei,
    pub remainder: Wei,
    pub recipients: u64,
}

impl Payout {
    /// Amount moved by the payout. All of the unclaimed total, including the remainder sent to
    /// the owner.
    pub fn distributed(&self) -> Wei {
        self.share * Wei::from(self.recipients) + self.remainder
    }
}

/// Typed access to the registry contract, on behalf of one verified wallet.
///
/// Reads always go to the ledger through `eth_call` and are never served from a cache. Every
/// write is checked against fresh reads before it is submitted, so a rule violation is reported
/// without spending a transaction. Writes of one gateway are submitted one at a time, and only
/// while the wallet is still on the chain the gateway was bound on.
#[derive(Debug)]
pub struct ContractGateway {
    address: Address,
    sender: Address,
    chain_id: ChainId,
    wallet: Arc<dyn LedgerProvider>,
    txn_config: TxnConfig,
    /// Held from the pre-checks until the node accepted (or refused) the transaction.
    write_lock: tokio::sync::Mutex<()>,
    /// Registrations submitted by this gateway that may not be visible in reads yet.
    in_flight: Mutex<HashMap<(EventId, Address), TxHash>>,
}

impl ContractGateway {
    /// Binds the registry deployed at `address` for the wallet of `session`.
    ///
    /// The wallet is asked for its chain again: a wallet that moved since it was verified is
    /// refused, and so is an address without contract code.
    pub async fn bind(session: VerifiedSession<'_>, address: Address) -> Result<Self, BindingError> {
        let wallet = session.wallet().clone();

        let actual = wallet.chain_id().await?;
        if actual != session.chain_id() {
            return Err(BindingError::ChainChanged { expected: session.chain_id(), actual });
        }

        let code = wallet.code_at(address).await?;
        if code.is_empty() {
            return Err(BindingError::NoContractCode { address, chain_id: actual });
        }

        info!(target: LOG_TARGET, contract = %address, sender = %session.address(), chain_id = %actual, "Gateway bound.");

        Ok(Self {
            address,
            sender: session.address(),
            chain_id: actual,
            wallet,
            txn_config: TxnConfig::default(),
            write_lock: tokio::sync::Mutex::new(()),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_txn_config(mut self, config: TxnConfig) -> Self {
        self.txn_config = config;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Timestamp of the latest block. Event timing is always judged against it, never against
    /// the local clock.
    pub async fn ledger_time(&self) -> Result<u64, GatewayError> {
        Ok(self.wallet.block_timestamp().await?)
    }

    pub async fn get_event_state(&self, event_id: EventId) -> Result<Event, GatewayError> {
        let call = IEventRegistry::getEventCall { eventId: event_id.0 };
        let record = self.read(call).await?.record;

        // The registry answers with a zeroed record for ids it never assigned.
        if record.owner == Address::ZERO {
            return Err(rules::RuleViolation::UnknownEvent(event_id).into());
        }

        Ok(record.into())
    }

    /// Registrations of `event_id`, in the order they were recorded.
    pub async fn get_attendees(&self, event_id: EventId) -> Result<Vec<Rsvp>, GatewayError> {
        let call = IEventRegistry::getAttendeesCall { eventId: event_id.0 };
        let attendees = self.read(call).await?.attendees;
        Ok(attendees.into_iter().map(|a| a.into_rsvp(event_id)).collect())
    }

    /// Registers a new event owned by the sender. The pending transaction resolves to the id
    /// the ledger assigned.
    pub async fn create_event(
        &self,
        event: NewEvent,
    ) -> Result<PendingTransaction<EventId>, GatewayError> {
        let _write = self.write_lock.lock().await;

        let now = self.ledger_time().await?;
        rules::check_new_event(&event, now)?;

        let call = IEventRegistry::createEventCall {
            name: event.name,
            description: event.description,
            timestamp: U256::from(event.timestamp),
            deposit: event.deposit,
            capacity: U256::from(event.capacity),
            imageRef: event.image_ref.unwrap_or_default(),
        };
        let tx_hash = self.submit(call.abi_encode(), None).await?;

        let (address, owner) = (self.address, self.sender);
        Ok(self.pending(tx_hash, move |receipt| {
            let created: IEventRegistry::EventCreated = find_log(receipt, address)?;
            if created.owner != owner {
                return Err(missing_log::<IEventRegistry::EventCreated>(receipt));
            }
            Ok(created.eventId.into())
        }))
    }

    /// Registers the sender to `event_id`, attaching `deposit`.
    ///
    /// The deposit must equal the event's required deposit exactly. A registration already
    /// submitted by this gateway but not yet visible on the ledger counts as taken: a second
    /// call fails with `AlreadyRegistered` instead of racing the first one.
    pub async fn rsvp(
        &self,
        event_id: EventId,
        deposit: Wei,
    ) -> Result<PendingTransaction<Rsvp>, GatewayError> {
        let _write = self.write_lock.lock().await;

        let event = self.get_event_state(event_id).await?;
        let attendees = self.get_attendees(event_id).await?;
        let in_flight = self.in_flight_rsvps(event_id, &attendees).await?;
        rules::check_rsvp(&event, &attendees, &in_flight, self.sender, deposit)?;

        let call = IEventRegistry::rsvpCall { eventId: event_id.0 };
        let tx_hash = self.submit(call.abi_encode(), Some(deposit)).await?;
        self.in_flight.lock().insert((event_id, self.sender), tx_hash);

        let (address, attendee) = (self.address, self.sender);
        Ok(self.pending(tx_hash, move |receipt| {
            let rsvp = receipt
                .logs_matching(address, IEventRegistry::NewRsvp::SIGNATURE_HASH)
                .filter_map(|log| abigen::decode_log::<IEventRegistry::NewRsvp>(log).ok())
                .find(|log| log.eventId == event_id.0 && log.attendee == attendee)
                .ok_or_else(|| missing_log::<IEventRegistry::NewRsvp>(receipt))?;
            Ok(Rsvp::new(rsvp.eventId.into(), rsvp.attendee))
        }))
    }

    /// Checks `attendee` in. Only the event owner may do so; this refunds the attendee's
    /// deposit. Confirming an attendee twice is a no-op and submits nothing.
    pub async fn confirm_attendance(
        &self,
        event_id: EventId,
        attendee: Address,
    ) -> Result<CheckIn, GatewayError> {
        let _write = self.write_lock.lock().await;

        let event = self.get_event_state(event_id).await?;
        let attendees = self.get_attendees(event_id).await?;
        self.submit_confirm(&event, &attendees, attendee).await
    }

    /// Checks in every registered attendee who is not confirmed yet, one transaction each.
    pub async fn confirm_all(
        &self,
        event_id: EventId,
    ) -> Result<Vec<(Address, PendingTransaction<()>)>, GatewayError> {
        let _write = self.write_lock.lock().await;

        let event = self.get_event_state(event_id).await?;
        let attendees = self.get_attendees(event_id).await?;

        let mut submitted = Vec::new();
        for rsvp in attendees.iter().filter(|r| !r.confirmed) {
            if let CheckIn::Submitted(tx) = self.submit_confirm(&event, &attendees, rsvp.attendee).await? {
                submitted.push((rsvp.attendee, tx));
            }
        }

        info!(target: LOG_TARGET, event_id = %event_id, count = submitted.len(), "Submitted check-ins.");
        Ok(submitted)
    }

    /// How the unclaimed deposits of `event_id` would be split if they were paid out now.
    pub async fn preview_payout(&self, event_id: EventId) -> Result<PayoutPlan, GatewayError> {
        let event = self.get_event_state(event_id).await?;
        let attendees = self.get_attendees(event_id).await?;
        Ok(PayoutPlan::compute(&event, &attendees))
    }

    /// Distributes the deposits of attendees who were never checked in. Allowed once, after
    /// the event started (by ledger time), to anyone.
    pub async fn payout_unclaimed(
        &self,
        event_id: EventId,
    ) -> Result<PendingTransaction<Payout>, GatewayError> {
        let _write = self.write_lock.lock().await;

        let event = self.get_event_state(event_id).await?;
        let now = self.ledger_time().await?;
        rules::check_payout(&event, now)?;

        let call = IEventRegistry::payoutUnclaimedCall { eventId: event_id.0 };
        let tx_hash = self.submit(call.abi_encode(), None).await?;

        let address = self.address;
        Ok(self.pending(tx_hash, move |receipt| {
            let paid: IEventRegistry::UnclaimedPaidOut = find_log(receipt, address)?;
            Ok(Payout {
                event_id: paid.eventId.into(),
                total: paid.total,
                share: paid.share,
                remainder: paid.remainder,
                recipients: paid.recipients.saturating_to(),
            })
        }))
    }

    /// Registrations submitted by this gateway that were not seen settling yet.
    pub fn in_flight(&self) -> Vec<(EventId, Address)> {
        self.in_flight.lock().keys().copied().collect()
    }

    /// Handle on a transaction submitted earlier, known only by its hash.
    pub fn track(&self, tx_hash: TxHash) -> PendingTransaction<()> {
        self.pending(tx_hash, |_| Ok(()))
    }

    async fn submit_confirm(
        &self,
        event: &Event,
        attendees: &[Rsvp],
        attendee: Address,
    ) -> Result<CheckIn, GatewayError> {
        match rules::check_confirm(event, attendees, self.sender, attendee)? {
            CheckInDecision::AlreadyConfirmed => {
                debug!(target: LOG_TARGET, event_id = %event.id, %attendee, "Attendee already confirmed.");
                Ok(CheckIn::AlreadyConfirmed)
            }
            CheckInDecision::Confirm => {
                let call = IEventRegistry::confirmAttendeeCall { eventId: event.id.0, attendee };
                let tx_hash = self.submit(call.abi_encode(), None).await?;

                let address = self.address;
                Ok(CheckIn::Submitted(self.pending(tx_hash, move |receipt| {
                    let _: IEventRegistry::AttendeeConfirmed = find_log(receipt, address)?;
                    Ok(())
                })))
            }
        }
    }

    /// Attendees of `event_id` with a registration submitted by this gateway that reads do not
    /// show yet.
    ///
    /// Entries of every event are pruned on the way. A registration to another event is settled
    /// once its transaction is mined. One to `event_id` is settled once it shows in `attendees`
    /// or reverted, since `attendees` may predate its block.
    async fn in_flight_rsvps(
        &self,
        event_id: EventId,
        attendees: &[Rsvp],
    ) -> Result<Vec<Address>, GatewayError> {
        let candidates: Vec<((EventId, Address), TxHash)> =
            self.in_flight.lock().iter().map(|(key, tx_hash)| (*key, *tx_hash)).collect();

        let mut pending = Vec::new();
        for ((id, attendee), tx_hash) in candidates {
            let settled = if id == event_id {
                attendees.iter().any(|r| r.attendee == attendee)
                    || self
                        .wallet
                        .transaction_receipt(tx_hash)
                        .await?
                        .is_some_and(|receipt| !receipt.succeeded())
            } else {
                self.wallet.transaction_receipt(tx_hash).await?.is_some()
            };

            if settled {
                trace!(target: LOG_TARGET, event_id = %id, %attendee, %tx_hash, "Registration settled.");
                self.in_flight.lock().remove(&(id, attendee));
            } else if id == event_id {
                pending.push(attendee);
            }
        }

        Ok(pending)
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, GatewayError> {
        let request = call_request(self.sender, self.address, call.abi_encode());
        let output = self.wallet.call(&request).await.map_err(rule_or_provider)?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    /// Sends a transaction to the registry. Callers hold the write lock.
    async fn submit(&self, input: Vec<u8>, value: Option<Wei>) -> Result<TxHash, GatewayError> {
        let actual = self.wallet.chain_id().await?;
        if actual != self.chain_id {
            warn!(target: LOG_TARGET, expected = %self.chain_id, %actual, "Wallet left the bound chain.");
            return Err(GatewayError::ChainChanged { expected: self.chain_id, actual });
        }

        let mut request = call_request(self.sender, self.address, input);
        if let Some(value) = value {
            request = request.value(value);
        }

        match self.wallet.send_transaction(&request).await {
            Ok(tx_hash) => {
                info!(target: LOG_TARGET, %tx_hash, "Transaction submitted.");
                Ok(tx_hash)
            }
            Err(err) => match rule_or_provider(err) {
                GatewayError::Provider(err @ ProviderError::Rpc(_)) => {
                    Err(GatewayError::TransactionRejected(err))
                }
                other => Err(other),
            },
        }
    }

    fn pending<T, F>(&self, tx_hash: TxHash, decoder: F) -> PendingTransaction<T>
    where
        F: Fn(&TransactionReceipt) -> Result<T, GatewayError> + Send + Sync + 'static,
    {
        PendingTransaction::new(tx_hash, self.wallet.clone(), self.txn_config, decoder)
    }
}

/// Revert payloads of the registry are rule violations. Everything else is a provider failure.
fn rule_or_provider(err: ProviderError) -> GatewayError {
    match err.revert_data().and_then(|data| abigen::decode_revert(&data)) {
        Some(violation) => GatewayError::Rule(violation),
        None => GatewayError::Provider(err),
    }
}

fn find_log<E: SolEvent>(receipt: &TransactionReceipt, address: Address) -> Result<E, GatewayError> {
    let log = receipt
        .logs_matching(address, E::SIGNATURE_HASH)
        .next()
        .ok_or_else(|| missing_log::<E>(receipt))?;
    Ok(abigen::decode_log(log)?)
}

fn missing_log<E: SolEvent>(receipt: &TransactionReceipt) -> GatewayError {
    GatewayError::MissingLog { tx_hash: receipt.transaction_hash, event: E::SIGNATURE }
}
