use std::fmt;
use std::sync::Arc;

use alloy_primitives::TxHash;
use rsvp_utils::{LedgerProvider, TransactionReceipt, TransactionWaiter, TxnConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::GatewayError;

const LOG_TARGET: &str = "rsvp::contract::pending";

type ReceiptDecoder<T> = Arc<dyn Fn(&TransactionReceipt) -> Result<T, GatewayError> + Send + Sync>;

/// Outcome of a mined, successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed<T> {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub result: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus<T> {
    /// Accepted by the node, not mined yet.
    Submitted(TxHash),
    Confirmed(Confirmed<T>),
    Reverted(TxHash),
}

/// A transaction accepted by the node, whose outcome is not known yet.
///
/// Submission and confirmation are two separate steps: the hash is available right away,
/// [`confirm`](Self::confirm) waits for the receipt and decodes the result from it. Stopping
/// the wait (timeout or cancellation) does not revoke the transaction, which may still be
/// mined. The handle can be cloned and awaited again at any time.
pub struct PendingTransaction<T> {
    tx_hash: TxHash,
    provider: Arc<dyn LedgerProvider>,
    config: TxnConfig,
    decoder: ReceiptDecoder<T>,
}

impl<T> PendingTransaction<T> {
    pub(crate) fn new<F>(
        tx_hash: TxHash,
        provider: Arc<dyn LedgerProvider>,
        config: TxnConfig,
        decoder: F,
    ) -> Self
    where
        F: Fn(&TransactionReceipt) -> Result<T, GatewayError> + Send + Sync + 'static,
    {
        Self { tx_hash, provider, config, decoder: Arc::new(decoder) }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn with_config(mut self, config: TxnConfig) -> Self {
        self.config = config;
        self
    }

    /// Looks up the receipt once, without waiting.
    pub async fn status(&self) -> Result<TxStatus<T>, GatewayError> {
        match self.provider.transaction_receipt(self.tx_hash).await? {
            None => Ok(TxStatus::Submitted(self.tx_hash)),
            Some(receipt) if !receipt.succeeded() => Ok(TxStatus::Reverted(self.tx_hash)),
            Some(receipt) => self.decode(&receipt).map(TxStatus::Confirmed),
        }
    }

    /// Waits until the transaction is mined.
    ///
    /// Fails with [`GatewayError::TransactionReverted`] if it was mined but failed and with
    /// [`GatewayError::ConfirmationTimeout`] if it is still pending after the configured timeout.
    pub async fn confirm(&self) -> Result<Confirmed<T>, GatewayError> {
        trace!(target: LOG_TARGET, tx_hash = %self.tx_hash, "Waiting for confirmation.");
        let receipt =
            TransactionWaiter::with_config(self.tx_hash, self.provider.as_ref(), self.config).await?;
        self.decode(&receipt)
    }

    /// Like [`confirm`](Self::confirm), but gives up without error once `cancel` fires.
    pub async fn confirm_until(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Confirmed<T>>, GatewayError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(target: LOG_TARGET, tx_hash = %self.tx_hash, "Stopped waiting for confirmation.");
                Ok(None)
            }
            confirmed = self.confirm() => confirmed.map(Some),
        }
    }

    fn decode(&self, receipt: &TransactionReceipt) -> Result<Confirmed<T>, GatewayError> {
        let result = (self.decoder)(receipt)?;
        debug!(target: LOG_TARGET, tx_hash = %self.tx_hash, block = ?receipt.block_height(), "Transaction confirmed.");
        Ok(Confirmed { tx_hash: self.tx_hash, block_number: receipt.block_height(), result })
    }
}

impl<T> Clone for PendingTransaction<T> {
    fn clone(&self) -> Self {
        Self {
            tx_hash: self.tx_hash,
            provider: self.provider.clone(),
            config: self.config,
            decoder: self.decoder.clone(),
        }
    }
}

impl<T> fmt::Debug for PendingTransaction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx_hash", &self.tx_hash)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
