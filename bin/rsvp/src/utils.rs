use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::DateTime;
use rsvp_contract::{Confirmed, ContractGateway, NetworkGuard, PendingTransaction, Session};
use rsvp_types::{Event, Rsvp};
use rsvp_utils::LedgerProvider;
use rsvp_view::{EventView, EventViewModel, Freshness};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::commands::options::transaction::TransactionOptions;
use crate::commands::options::GlobalOptions;
use crate::commands::LOG_TARGET;

/// Connects the configured account and binds the registry after checking the network.
pub async fn gateway(
    options: &GlobalOptions,
    transaction: &TransactionOptions,
) -> Result<ContractGateway> {
    let url = options.ledger.url()?;
    let expected = options.ledger.chain_id()?;
    let address = options.ledger.contract_address()?;
    let account = options.account.address()?;

    let wallet: Arc<dyn LedgerProvider> = Arc::new(options.ledger.provider()?);
    let session = Session::connect(wallet, account)
        .await
        .with_context(|| format!("Failed to connect to {url}."))?;

    let guard = NetworkGuard::new(expected);
    let verified = guard.assert_network(&session)?;
    let gateway = ContractGateway::bind(verified, address)
        .await
        .with_context(|| format!("Failed to bind the registry at {address}."))?;

    trace!(target: LOG_TARGET, %account, %address, chain_id = %expected, "Gateway bound.");
    Ok(gateway.with_txn_config(transaction.txn_config()))
}

/// A view model over the configured index, reading the ledger too when it is configured.
///
/// Without a usable ledger connection the model serves index data only.
pub async fn view_model(options: &GlobalOptions) -> Result<EventViewModel> {
    let model = EventViewModel::new(options.index.client()?);

    if options.ledger.is_configured() && options.account.account_address.is_some() {
        match gateway(options, &TransactionOptions::default()).await {
            Ok(gateway) => model.attach_gateway(Arc::new(gateway)),
            Err(err) => warn!(target: LOG_TARGET, error = %format!("{err:#}"), "Ledger unavailable."),
        }
    }

    Ok(model)
}

/// Waits for `pending` unless told not to. Ctrl-C stops the wait, not the transaction.
pub async fn wait<T>(
    pending: &PendingTransaction<T>,
    transaction: &TransactionOptions,
) -> Result<Option<Confirmed<T>>> {
    println!("Transaction hash: {}", pending.tx_hash());
    if transaction.no_wait {
        return Ok(None);
    }

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let confirmed = pending.confirm_until(&cancel).await;
    interrupt.abort();

    match confirmed? {
        Some(confirmed) => Ok(Some(confirmed)),
        None => {
            println!(
                "Stopped waiting. Transaction {} is submitted and may still be mined.",
                pending.tx_hash()
            );
            Ok(None)
        }
    }
}

pub fn format_time(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn freshness(view: &EventView) -> String {
    match view.freshness {
        Freshness::Ledger { block_timestamp } => {
            format!("ledger, as of {}", format_time(block_timestamp))
        }
        Freshness::Index { block } => format!("index at block {block}, may be stale"),
    }
}

/// One line per event, for listings.
pub fn summary(event: &Event) -> String {
    let state = if event.paid_out {
        " (paid out)"
    } else if event.is_full() {
        " (full)"
    } else {
        ""
    };
    format!(
        "{}  {}  {}/{} going  {} wei  {}{state}",
        event.id,
        format_time(event.timestamp),
        event.rsvp_count,
        event.capacity,
        event.deposit,
        event.name,
    )
}

pub fn attendee_status(rsvp: &Rsvp) -> &'static str {
    match (rsvp.confirmed, rsvp.refunded) {
        (true, true) => "checked in, refunded",
        (true, false) => "checked in",
        (false, true) => "refunded",
        (false, false) => "registered",
    }
}
