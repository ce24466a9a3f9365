use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use rsvp_types::EventId;
use rsvp_view::EventViewModel;
use tracing::trace;

use super::options::transaction::TransactionOptions;
use super::options::GlobalOptions;
use crate::utils;

#[derive(Debug, Args)]
#[command(about = "Pay the deposits of attendees who did not show up out to the ones who did. \
                   Any account can trigger it once the event has started.")]
pub struct PayoutArgs {
    #[arg(help = "Id of the event, as 0x-prefixed hex.")]
    pub event_id: EventId,

    #[arg(long)]
    #[arg(help = "Only print how the deposits would be distributed.")]
    pub preview: bool,

    #[command(flatten)]
    pub transaction: TransactionOptions,
}

impl PayoutArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let gateway = Arc::new(utils::gateway(options, &self.transaction).await?);
        let model = EventViewModel::new(options.index.client()?);
        model.attach_gateway(gateway.clone());

        let view = model.require_fresh(self.event_id).await?;
        if view.event.paid_out {
            bail!("The unclaimed deposits of {} were already paid out.", self.event_id);
        }

        let plan = gateway.preview_payout(self.event_id).await?;
        println!(
            "{} wei unclaimed: {} wei to each of {} attendees, {} wei to the owner {}.",
            plan.total,
            plan.share,
            plan.recipients.len(),
            plan.remainder,
            plan.owner
        );
        if self.preview {
            return Ok(());
        }

        let pending = gateway.payout_unclaimed(self.event_id).await?;
        if let Some(confirmed) = utils::wait(&pending, &self.transaction).await? {
            let payout = confirmed.result;
            println!(
                "Paid out {} wei: {} wei to each of {} attendees, {} wei to the owner.",
                payout.distributed(),
                payout.share,
                payout.recipients,
                payout.remainder
            );
        }

        Ok(())
    }
}
