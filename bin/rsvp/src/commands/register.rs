use anyhow::Result;
use clap::Args;
use rsvp_types::{EventId, Wei};
use tracing::{debug, trace};

use super::options::transaction::TransactionOptions;
use super::options::GlobalOptions;
use super::LOG_TARGET;
use crate::utils;

#[derive(Debug, Args)]
#[command(about = "Register the account to an event, staking the event's deposit.")]
pub struct RegisterArgs {
    #[arg(help = "Id of the event, as 0x-prefixed hex.")]
    pub event_id: EventId,

    #[arg(long, value_name = "WEI")]
    #[arg(help = "Deposit to attach. Read from the ledger when omitted. It must match the \
                  event's deposit exactly.")]
    pub deposit: Option<Wei>,

    #[command(flatten)]
    pub transaction: TransactionOptions,
}

impl RegisterArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let gateway = utils::gateway(options, &self.transaction).await?;
        let deposit = match self.deposit {
            Some(deposit) => deposit,
            None => {
                let deposit = gateway.get_event_state(self.event_id).await?.deposit;
                debug!(target: LOG_TARGET, %deposit, "Using the deposit required by the event.");
                deposit
            }
        };

        let pending = gateway.rsvp(self.event_id, deposit).await?;
        if let Some(confirmed) = utils::wait(&pending, &self.transaction).await? {
            println!(
                "{} is registered to {} ({} wei staked).",
                confirmed.result.attendee, confirmed.result.event_id, deposit
            );
        }

        Ok(())
    }
}
