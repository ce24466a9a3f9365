use std::fmt::Debug;

use alloy_primitives::{Address, Bytes, TxHash, B256};
pub use alloy_primitives::Log;
pub use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use rsvp_types::ChainId;

use crate::error::ProviderError;

/// The subset of the ledger RPC interface the registry client depends on.
///
/// Implemented over HTTP by [`JsonRpcClient`](crate::JsonRpcClient). A wallet is a provider
/// that also signs what it is asked to send for its own account.
#[async_trait]
pub trait LedgerProvider: Debug + Send + Sync {
    /// `eth_chainId`
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// `eth_getCode` at the latest block. Empty when no contract is deployed at `address`.
    async fn code_at(&self, address: Address) -> Result<Bytes, ProviderError>;

    /// `eth_call` at the latest block.
    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, ProviderError>;

    /// `eth_sendTransaction`. Returns as soon as the transaction is accepted into the pool.
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash, ProviderError>;

    /// `eth_getTransactionReceipt`. `None` while the transaction is not mined.
    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;

    /// Timestamp of the latest block, in seconds.
    async fn block_timestamp(&self) -> Result<u64, ProviderError>;
}

/// A call to `to` from `from` carrying `input`.
pub fn call_request(from: Address, to: Address, input: impl Into<Bytes>) -> TransactionRequest {
    TransactionRequest::default().from(from).to(to).input(TransactionInput::new(input.into()))
}

/// The parts of a mined transaction the registry client reads.
///
/// Nodes answer with [`alloy_rpc_types_eth::TransactionReceipt`]; in-process ledgers build this
/// directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// False when execution reverted.
    pub status: bool,
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status
    }

    pub fn block_height(&self) -> Option<u64> {
        self.block_number
    }

    /// Logs emitted by `address` whose first topic is `signature`.
    pub fn logs_matching(&self, address: Address, signature: B256) -> impl Iterator<Item = &Log> {
        self.logs
            .iter()
            .filter(move |log| log.address == address && log.topics().first() == Some(&signature))
    }
}

impl From<alloy_rpc_types_eth::TransactionReceipt> for TransactionReceipt {
    fn from(receipt: alloy_rpc_types_eth::TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            status: receipt.inner.status(),
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        }
    }
}
