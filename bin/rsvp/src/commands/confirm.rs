use alloy_primitives::Address;
use anyhow::Result;
use clap::Args;
use rsvp_contract::CheckIn;
use rsvp_types::EventId;
use tracing::trace;

use super::options::transaction::TransactionOptions;
use super::options::GlobalOptions;
use crate::utils;

#[derive(Debug, Args)]
#[command(about = "Check an attendee in. Only the event owner can do so.")]
pub struct ConfirmArgs {
    #[arg(help = "Id of the event, as 0x-prefixed hex.")]
    pub event_id: EventId,

    #[arg(help = "Address of the attendee.")]
    pub attendee: Address,

    #[command(flatten)]
    pub transaction: TransactionOptions,
}

impl ConfirmArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let gateway = utils::gateway(options, &self.transaction).await?;
        match gateway.confirm_attendance(self.event_id, self.attendee).await? {
            CheckIn::AlreadyConfirmed => println!("{} is already checked in.", self.attendee),
            CheckIn::Submitted(pending) => {
                if utils::wait(&pending, &self.transaction).await?.is_some() {
                    println!("{} is checked in.", self.attendee);
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Check in every attendee of an event who is not checked in yet.")]
pub struct ConfirmAllArgs {
    #[arg(help = "Id of the event, as 0x-prefixed hex.")]
    pub event_id: EventId,

    #[command(flatten)]
    pub transaction: TransactionOptions,
}

impl ConfirmAllArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let gateway = utils::gateway(options, &self.transaction).await?;
        let submitted = gateway.confirm_all(self.event_id).await?;
        if submitted.is_empty() {
            println!("Every attendee is already checked in.");
            return Ok(());
        }

        for (attendee, pending) in &submitted {
            println!("Checking in {attendee}.");
            if utils::wait(pending, &self.transaction).await?.is_some() {
                println!("{attendee} is checked in.");
            }
        }

        Ok(())
    }
}
