use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use alloy_primitives::TxHash;
use futures::FutureExt;
use tokio::time::{Instant, Interval, Sleep};

use super::TxnConfig;
use crate::error::ProviderError;
use crate::provider::{LedgerProvider, TransactionReceipt};

#[derive(Debug, thiserror::Error)]
pub enum TransactionWaitingError {
    #[error("timed out waiting for transaction {0}")]
    Timeout(TxHash),
    #[error("transaction {} reverted", .0.transaction_hash)]
    Reverted(Box<TransactionReceipt>),
    #[error(transparent)]
    Provider(ProviderError),
}

type ReceiptFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<TransactionReceipt>, ProviderError>> + Send + 'a>>;

/// A future that resolves once the transaction is mined. The receipt is polled every
/// `interval`. If the transaction is not mined within `timeout`, an error is returned, even while
/// a receipt request is still outstanding. An error is also returned if the mined transaction
/// reverted (i.e. its receipt status is `0x0`).
///
/// Dropping the waiter only stops the polling: a submitted transaction cannot be recalled.
///
/// # Arguments
///
/// * `tx_hash` - The hash of the transaction to wait for.
/// * `interval` - Poll the receipt every `interval`. Defaults to 250 milliseconds.
/// * `timeout` - The maximum amount of time to wait for the receipt. Defaults to 120 seconds.
/// * `provider` - The provider to use for polling the receipt.
///
/// # Examples
///
/// ```ignore
/// let provider = JsonRpcClient::new(Url::parse("http://localhost:8545")?);
/// let receipt = TransactionWaiter::with_config(tx_hash, &provider, TxnConfig::default()).await?;
/// ```
pub struct TransactionWaiter<'a, P>
where
    P: LedgerProvider + ?Sized,
{
    tx_hash: TxHash,
    interval: Interval,
    deadline: Pin<Box<Sleep>>,
    provider: &'a P,
    /// The in-flight receipt request.
    future: Option<ReceiptFuture<'a>>,
}

impl<'a, P> TransactionWaiter<'a, P>
where
    P: LedgerProvider + ?Sized,
{
    pub fn with_config(tx_hash: TxHash, provider: &'a P, config: TxnConfig) -> Self {
        let now = Instant::now();
        Self {
            tx_hash,
            provider,
            future: None,
            deadline: Box::pin(tokio::time::sleep_until(now + config.timeout)),
            interval: tokio::time::interval_at(now + config.poll_interval, config.poll_interval),
        }
    }
}

impl<'a, P> Future for TransactionWaiter<'a, P>
where
    P: LedgerProvider + ?Sized,
{
    type Output = Result<TransactionReceipt, TransactionWaitingError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        // Registers the deadline with the timer on every poll.
        if this.deadline.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Err(TransactionWaitingError::Timeout(this.tx_hash)));
        }

        loop {
            if let Some(mut flush) = this.future.take() {
                match flush.poll_unpin(cx) {
                    Poll::Ready(Ok(Some(receipt))) => {
                        if receipt.succeeded() {
                            return Poll::Ready(Ok(receipt));
                        }
                        return Poll::Ready(Err(TransactionWaitingError::Reverted(Box::new(
                            receipt,
                        ))));
                    }

                    // Not mined yet.
                    Poll::Ready(Ok(None)) => {}

                    Poll::Ready(Err(e)) => {
                        return Poll::Ready(Err(TransactionWaitingError::Provider(e)));
                    }

                    Poll::Pending => {
                        this.future = Some(flush);
                        return Poll::Pending;
                    }
                }
            }

            if this.interval.poll_tick(cx).is_ready() {
                this.future = Some(this.provider.transaction_receipt(this.tx_hash));
            } else {
                break;
            }
        }

        Poll::Pending
    }
}
