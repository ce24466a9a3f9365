use std::time::Duration;

use clap::Args;
use rsvp_utils::TxnConfig;

#[derive(Debug, Clone, Args, Default)]
#[command(next_help_heading = "Transaction options")]
pub struct TransactionOptions {
    #[arg(long)]
    #[arg(help = "Print the transaction hash and return without waiting for the receipt.")]
    pub no_wait: bool,

    #[arg(long, value_name = "MILLISECONDS")]
    #[arg(help = "Interval between two receipt lookups while waiting.")]
    pub poll_interval: Option<u64>,

    #[arg(long, value_name = "SECONDS")]
    #[arg(help = "Give up waiting for the receipt after this long. The transaction may still be \
                  mined afterwards.")]
    pub wait_timeout: Option<u64>,
}

impl TransactionOptions {
    pub fn txn_config(&self) -> TxnConfig {
        let mut config = TxnConfig::default();
        if let Some(interval) = self.poll_interval {
            config = config.with_poll_interval(Duration::from_millis(interval));
        }
        if let Some(timeout) = self.wait_timeout {
            config = config.with_timeout(Duration::from_secs(timeout));
        }
        config
    }
}
