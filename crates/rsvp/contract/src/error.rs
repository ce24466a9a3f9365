use alloy_primitives::{Address, TxHash};
use rsvp_types::{ChainId, RuleViolation};
use rsvp_utils::{ProviderError, TransactionWaitingError};

/// Why a session was refused by the network guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("no wallet connected")]
    NoWallet,
    #[error("wallet is on chain {actual}, expected chain {expected}")]
    NetworkMismatch { expected: ChainId, actual: ChainId },
}

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("no contract deployed at {address} on chain {chain_id}")]
    NoContractCode { address: Address, chain_id: ChainId },
    #[error("wallet switched from chain {expected} to chain {actual} after it was verified")]
    ChainChanged { expected: ChainId, actual: ChainId },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Caught before submission, or reported by the ledger when simulating the transaction.
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// The wallet left the network the gateway was bound on. Nothing was submitted.
    #[error("wallet switched from chain {expected} to chain {actual}, refusing to submit")]
    ChainChanged { expected: ChainId, actual: ChainId },

    /// The wallet or node refused the transaction (user rejection, nonce, funds...).
    #[error("transaction rejected: {0}")]
    TransactionRejected(#[source] ProviderError),

    /// The transaction was mined but its execution failed.
    #[error("transaction {0} reverted")]
    TransactionReverted(TxHash),

    /// Stopped waiting. The transaction may still be mined later.
    #[error("timed out waiting for transaction {0}")]
    ConfirmationTimeout(TxHash),

    #[error("transaction {tx_hash} emitted no {event} log")]
    MissingLog { tx_hash: TxHash, event: &'static str },

    #[error(transparent)]
    Abi(#[from] alloy_sol_types::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<TransactionWaitingError> for GatewayError {
    fn from(err: TransactionWaitingError) -> Self {
        match err {
            TransactionWaitingError::Timeout(tx_hash) => GatewayError::ConfirmationTimeout(tx_hash),
            TransactionWaitingError::Reverted(receipt) => {
                GatewayError::TransactionReverted(receipt.transaction_hash)
            }
            TransactionWaitingError::Provider(err) => GatewayError::Provider(err),
        }
    }
}

impl GatewayError {
    /// Whether the failure says nothing about the ledger state, only about reaching it.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, GatewayError::Provider(_))
    }
}
