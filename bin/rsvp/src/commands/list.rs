use alloy_primitives::Address;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use rsvp_index::EventFilter;
use rsvp_view::EventViewModel;
use tracing::trace;

use super::options::GlobalOptions;
use crate::utils;

#[derive(Debug, Args)]
#[command(about = "List events from the index. Listings may lag the ledger.")]
pub struct ListArgs {
    #[arg(long, value_name = "ADDRESS")]
    #[arg(help = "Only events created by this account.")]
    pub owner: Option<Address>,

    #[arg(long, conflicts_with = "past")]
    #[arg(help = "Only events that have not started yet.")]
    pub upcoming: bool,

    #[arg(long)]
    #[arg(help = "Only events that already started.")]
    pub past: bool,
}

impl ListArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let model = EventViewModel::new(options.index.client()?);
        let listing = model.list(self.filter(now())).await?;

        if listing.events.is_empty() {
            println!("No events.");
        }
        for view in &listing.events {
            println!("{}", utils::summary(&view.event));
        }
        println!("(index at block {}, {})", listing.block, listing.taken_at.to_rfc3339());

        Ok(())
    }

    fn filter(&self, now: u64) -> EventFilter {
        let mut filter = EventFilter::default();
        if let Some(owner) = self.owner {
            filter = filter.owned_by(owner);
        }
        if self.upcoming {
            filter = filter.upcoming(now);
        }
        if self.past {
            filter = filter.past(now);
        }
        filter
    }
}

/// Listings are for display only, so the local clock is good enough to split them.
pub(crate) fn now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(clap::Parser)]
    struct Command {
        #[command(flatten)]
        args: ListArgs,
    }

    #[test]
    fn default_lists_everything() {
        let cmd = Command::parse_from(["rsvp"]);
        assert_eq!(cmd.args.filter(100), EventFilter::default());
    }

    #[test]
    fn builds_the_organizer_dashboard_filter() {
        let owner = "0x0000000000000000000000000000000000000a11".parse::<Address>().unwrap();
        let cmd = Command::parse_from(["rsvp", "--owner", &owner.to_string(), "--upcoming"]);

        let filter = cmd.args.filter(100);
        assert_eq!(filter.owner, Some(owner));
        assert_eq!(filter.upcoming_after, Some(100));
        assert_eq!(filter.past_before, None);
    }

    #[test]
    fn upcoming_and_past_are_exclusive() {
        assert!(Command::try_parse_from(["rsvp", "--upcoming", "--past"]).is_err());
    }
}
