use alloy_primitives::Address;
use anyhow::Result;
use clap::Args;
use futures::TryStreamExt;
use rsvp_index::EventFilter;
use tracing::trace;

use super::list::now;
use super::options::GlobalOptions;
use crate::utils;

#[derive(Debug, Args)]
#[command(about = "List the events an account registered to, from the index.")]
pub struct MyRsvpsArgs {
    #[arg(value_name = "ADDRESS")]
    #[arg(help = "Account to look up. Defaults to the configured account.")]
    pub address: Option<Address>,

    #[arg(long, conflicts_with = "past")]
    #[arg(help = "Only events that have not started yet.")]
    pub upcoming: bool,

    #[arg(long)]
    #[arg(help = "Only events that already started.")]
    pub past: bool,
}

impl MyRsvpsArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let account = match self.address {
            Some(address) => address,
            None => options.account.address()?,
        };

        let mut filter = EventFilter::default();
        if self.upcoming {
            filter = filter.upcoming(now());
        }
        if self.past {
            filter = filter.past(now());
        }

        let client = options.index.client()?;
        let mut rows = client.list_my_rsvps(account, filter);
        let mut count = 0;
        while let Some(row) = rows.try_next().await? {
            println!(
                "{}  [{}]",
                utils::summary(&row.item.event),
                utils::attendee_status(&row.item.rsvp)
            );
            count += 1;
        }

        if count == 0 {
            println!("{account} has no registrations.");
        }
        Ok(())
    }
}
