use std::collections::HashMap;

use alloy_primitives::{address, keccak256, Address, Bytes, TxHash, TxKind, U256};
use alloy_sol_types::SolInterface;
use async_trait::async_trait;
use parking_lot::Mutex;
use rsvp_contract::abigen::{self, IEventRegistryCalls};
use rsvp_types::{ChainId, Event, EventId, Rsvp, Wei};
use rsvp_utils::{
    JsonRpcError, LedgerProvider, ProviderError, TransactionReceipt, TransactionRequest,
};
use tracing::trace;

use crate::registry::Registry;

const LOG_TARGET: &str = "rsvp::test_utils::ledger";

/// Where [`TestLedger`] deploys the registry.
pub const REGISTRY_ADDRESS: Address = address!("00000000000000000000000000000000000e7e47");

/// Ledger time a fresh [`TestLedger`] starts at.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Calldata is kept raw and decoded again when the block is mined.
#[derive(Debug)]
struct QueuedTransaction {
    hash: TxHash,
    from: Address,
    value: Wei,
    input: Bytes,
}

#[derive(Debug)]
struct State {
    chain_id: ChainId,
    timestamp: u64,
    block_number: u64,
    auto_mine: bool,
    offline: bool,
    registry: Registry,
    balances: HashMap<Address, Wei>,
    mempool: Vec<QueuedTransaction>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    nonce: u64,
}

/// A single-node ledger with the registry deployed at [`REGISTRY_ADDRESS`].
///
/// Transactions are simulated against the latest state when submitted, like a node estimating
/// gas would, and executed when mined. By default every submission is mined right away; with
/// [`set_auto_mine(false)`](Self::set_auto_mine) they wait in the mempool until
/// [`mine`](Self::mine) is called. Submissions are signed for whatever `from` they carry.
#[derive(Debug)]
pub struct TestLedger {
    state: Mutex<State>,
}

impl TestLedger {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            state: Mutex::new(State {
                chain_id,
                timestamp: GENESIS_TIMESTAMP,
                block_number: 0,
                auto_mine: true,
                offline: false,
                registry: Registry::new(REGISTRY_ADDRESS),
                balances: HashMap::new(),
                mempool: Vec::new(),
                receipts: HashMap::new(),
                nonce: 0,
            }),
        }
    }

    pub fn fund(&self, account: Address, amount: Wei) {
        *self.state.lock().balances.entry(account).or_default() += amount;
    }

    pub fn balance_of(&self, account: Address) -> Wei {
        self.state.lock().balances.get(&account).copied().unwrap_or_default()
    }

    pub fn now(&self) -> u64 {
        self.state.lock().timestamp
    }

    pub fn set_time(&self, timestamp: u64) {
        self.state.lock().timestamp = timestamp;
    }

    pub fn advance_time(&self, seconds: u64) {
        self.state.lock().timestamp += seconds;
    }

    /// Moves the node to another network, as a wallet switching chains would.
    pub fn switch_chain(&self, chain_id: ChainId) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn set_auto_mine(&self, auto_mine: bool) {
        self.state.lock().auto_mine = auto_mine;
    }

    /// While offline, every request fails with [`ProviderError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Mines the mempool into one block. Returns the hashes included.
    pub fn mine(&self) -> Vec<TxHash> {
        let mut state = self.state.lock();
        Self::mine_block(&mut state)
    }

    pub fn pending_transactions(&self) -> usize {
        self.state.lock().mempool.len()
    }

    pub fn event(&self, id: EventId) -> Option<(Event, Vec<Rsvp>)> {
        self.state.lock().registry.event(id).cloned()
    }

    fn mine_block(state: &mut State) -> Vec<TxHash> {
        state.block_number += 1;
        let block_number = state.block_number;
        let now = state.timestamp;

        let mut mined = Vec::new();
        for tx in std::mem::take(&mut state.mempool) {
            let (status, logs) = if !debit(&mut state.balances, tx.from, tx.value) {
                trace!(target: LOG_TARGET, tx_hash = %tx.hash, "Sender cannot cover the value.");
                (false, Vec::new())
            } else {
                let executed = match IEventRegistryCalls::abi_decode(&tx.input, true) {
                    Ok(call) => state
                        .registry
                        .execute(call, tx.from, tx.value, now)
                        .map_err(|violation| violation.to_string()),
                    Err(err) => Err(err.to_string()),
                };
                match executed {
                    Ok(effects) => {
                        *state.balances.entry(REGISTRY_ADDRESS).or_default() += tx.value;
                        for (to, amount) in effects.transfers {
                            debit(&mut state.balances, REGISTRY_ADDRESS, amount);
                            *state.balances.entry(to).or_default() += amount;
                        }
                        (true, effects.logs)
                    }
                    Err(reason) => {
                        trace!(target: LOG_TARGET, tx_hash = %tx.hash, %reason, "Transaction reverted.");
                        *state.balances.entry(tx.from).or_default() += tx.value;
                        (false, Vec::new())
                    }
                }
            };

            state.receipts.insert(
                tx.hash,
                TransactionReceipt {
                    transaction_hash: tx.hash,
                    block_number: Some(block_number),
                    status,
                    logs,
                },
            );
            mined.push(tx.hash);
        }

        mined
    }

    fn online(&self) -> Result<parking_lot::MutexGuard<'_, State>, ProviderError> {
        let state = self.state.lock();
        if state.offline {
            return Err(ProviderError::Unavailable("test ledger is offline".to_string()));
        }
        Ok(state)
    }
}

/// Takes `amount` from `account`. `false` when the balance is too low.
fn debit(balances: &mut HashMap<Address, Wei>, account: Address, amount: Wei) -> bool {
    let balance = balances.entry(account).or_default();
    match balance.checked_sub(amount) {
        Some(rest) => {
            *balance = rest;
            true
        }
        None => false,
    }
}

fn calldata(request: &TransactionRequest) -> Bytes {
    request.input.input().cloned().unwrap_or_default()
}

fn decode_call(request: &TransactionRequest) -> Result<IEventRegistryCalls, ProviderError> {
    if request.to != Some(TxKind::Call(REGISTRY_ADDRESS)) {
        return Err(ProviderError::Rpc(JsonRpcError {
            code: -32000,
            message: "no contract at target address".to_string(),
            data: None,
        }));
    }

    IEventRegistryCalls::abi_decode(&calldata(request), true)
        .map_err(|_| ProviderError::Rpc(JsonRpcError::reverted(Bytes::new())))
}

fn reverted(violation: &rsvp_types::RuleViolation) -> ProviderError {
    ProviderError::Rpc(JsonRpcError::reverted(abigen::encode_revert(violation)))
}

#[async_trait]
impl LedgerProvider for TestLedger {
    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Ok(self.online()?.chain_id)
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ProviderError> {
        self.online()?;
        if address == REGISTRY_ADDRESS {
            Ok(Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]))
        } else {
            Ok(Bytes::new())
        }
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, ProviderError> {
        let state = self.online()?;
        let call = decode_call(request)?;
        let from = request.from.unwrap_or_default();
        let value = request.value.unwrap_or_default();

        // Calls never change state: run them on a scratch copy.
        let mut registry = state.registry.clone();
        registry
            .execute(call, from, value, state.timestamp)
            .map(|effects| effects.output.into())
            .map_err(|violation| reverted(&violation))
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash, ProviderError> {
        let mut state = self.online()?;
        let call = decode_call(request)?;
        let from = request.from.ok_or_else(|| ProviderError::Rpc(JsonRpcError {
            code: -32000,
            message: "missing sender".to_string(),
            data: None,
        }))?;
        let value = request.value.unwrap_or_default();

        if state.balances.get(&from).copied().unwrap_or_default() < value {
            return Err(ProviderError::Rpc(JsonRpcError {
                code: -32000,
                message: "insufficient funds for transfer".to_string(),
                data: None,
            }));
        }

        let mut scratch = state.registry.clone();
        scratch.execute(call, from, value, state.timestamp).map_err(|v| reverted(&v))?;

        state.nonce += 1;
        let hash = keccak256(U256::from(state.nonce).to_be_bytes::<32>());
        trace!(target: LOG_TARGET, tx_hash = %hash, %from, "Transaction queued.");
        state.mempool.push(QueuedTransaction { hash, from, value, input: calldata(request) });

        if state.auto_mine {
            Self::mine_block(&mut state);
        }

        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        Ok(self.online()?.receipts.get(&hash).cloned())
    }

    async fn block_timestamp(&self) -> Result<u64, ProviderError> {
        Ok(self.online()?.timestamp)
    }
}
