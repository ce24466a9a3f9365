use anyhow::{anyhow, Result};
use chrono::DateTime;
use clap::Args;
use rsvp_types::{NewEvent, Wei};
use tracing::trace;

use super::options::transaction::TransactionOptions;
use super::options::GlobalOptions;
use crate::utils;

#[derive(Debug, Args)]
#[command(about = "Create an event. The account becomes its owner.")]
pub struct CreateArgs {
    #[arg(long)]
    #[arg(help = "Name of the event.")]
    pub name: String,

    #[arg(long, default_value = "")]
    #[arg(help = "Free-form description.")]
    pub description: String,

    #[arg(long, value_parser = parse_timestamp)]
    #[arg(value_name = "TIME")]
    #[arg(help = "Start time, as unix seconds or RFC 3339 (e.g. 2024-05-01T18:00:00Z). Must be in \
                  the future.")]
    pub timestamp: u64,

    #[arg(long, value_name = "WEI")]
    #[arg(help = "Deposit every attendee stakes when registering, in wei.")]
    pub deposit: Wei,

    #[arg(long)]
    #[arg(help = "Maximum number of registrations.")]
    pub capacity: u64,

    #[arg(long, value_name = "REF")]
    #[arg(help = "Reference to an image stored off-chain, e.g. an IPFS CID.")]
    pub image: Option<String>,

    #[command(flatten)]
    pub transaction: TransactionOptions,
}

impl CreateArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let gateway = utils::gateway(options, &self.transaction).await?;
        let event = NewEvent {
            name: self.name,
            description: self.description,
            timestamp: self.timestamp,
            deposit: self.deposit,
            capacity: self.capacity,
            image_ref: self.image.filter(|image| !image.is_empty()),
        };

        let pending = gateway.create_event(event).await?;
        if let Some(confirmed) = utils::wait(&pending, &self.transaction).await? {
            println!("Event created: {}", confirmed.result);
        }

        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<u64> {
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(secs);
    }

    let time = DateTime::parse_from_rfc3339(value)
        .map_err(|_| anyhow!("expected unix seconds or an RFC 3339 date, got '{value}'"))?;
    u64::try_from(time.timestamp()).map_err(|_| anyhow!("'{value}' is before 1970"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1700000000", 1_700_000_000)]
    #[case("2023-11-14T22:13:20Z", 1_700_000_000)]
    #[case("2023-11-15T00:13:20+02:00", 1_700_000_000)]
    fn timestamps_are_parsed(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(parse_timestamp(input).unwrap(), expected);
    }

    #[rstest]
    #[case("tomorrow")]
    #[case("-5")]
    #[case("1960-01-01T00:00:00Z")]
    fn bad_timestamps_are_refused(#[case] input: &str) {
        assert!(parse_timestamp(input).is_err());
    }

    #[derive(clap::Parser)]
    struct Command {
        #[command(flatten)]
        args: CreateArgs,
    }

    #[test]
    fn parses_an_event() {
        let cmd = Command::parse_from([
            "rsvp",
            "--name",
            "Rust meetup",
            "--timestamp",
            "2030-01-01T19:00:00Z",
            "--deposit",
            "1000000000000000000",
            "--capacity",
            "40",
            "--no-wait",
        ]);

        assert_eq!(cmd.args.description, "");
        assert_eq!(cmd.args.deposit, Wei::from(10u64).pow(Wei::from(18u64)));
        assert_eq!(cmd.args.capacity, 40);
        assert!(cmd.args.image.is_none());
        assert!(cmd.args.transaction.no_wait);
    }
}
