use core::fmt;

use anyhow::Result;
use clap::Subcommand;
use tracing::{info_span, Instrument};

pub(crate) mod confirm;
pub(crate) mod create;
pub(crate) mod list;
pub(crate) mod my_rsvps;
pub(crate) mod options;
pub(crate) mod payout;
pub(crate) mod register;
pub(crate) mod show;

use confirm::{ConfirmAllArgs, ConfirmArgs};
use create::CreateArgs;
use list::ListArgs;
use my_rsvps::MyRsvpsArgs;
use options::GlobalOptions;
use payout::PayoutArgs;
use register::RegisterArgs;
use show::ShowArgs;

pub(crate) const LOG_TARGET: &str = "rsvp::cli";

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create an event owned by the account")]
    Create(Box<CreateArgs>),
    #[command(about = "Register the account to an event, staking its deposit")]
    Rsvp(Box<RegisterArgs>),
    #[command(about = "Check an attendee in, refunding their deposit")]
    Confirm(Box<ConfirmArgs>),
    #[command(about = "Check in every registered attendee not checked in yet")]
    ConfirmAll(Box<ConfirmAllArgs>),
    #[command(about = "Pay the deposits of absent attendees out to the ones who came")]
    Payout(Box<PayoutArgs>),
    #[command(about = "List events from the index")]
    List(Box<ListArgs>),
    #[command(about = "Show an event and its attendees")]
    Show(Box<ShowArgs>),
    #[command(about = "List the registrations of an account")]
    MyRsvps(Box<MyRsvpsArgs>),
}

impl fmt::Display for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commands::Create(_) => write!(f, "Create"),
            Commands::Rsvp(_) => write!(f, "Rsvp"),
            Commands::Confirm(_) => write!(f, "Confirm"),
            Commands::ConfirmAll(_) => write!(f, "ConfirmAll"),
            Commands::Payout(_) => write!(f, "Payout"),
            Commands::List(_) => write!(f, "List"),
            Commands::Show(_) => write!(f, "Show"),
            Commands::MyRsvps(_) => write!(f, "MyRsvps"),
        }
    }
}

pub async fn run(command: Commands, options: &GlobalOptions) -> Result<()> {
    let name = command.to_string();
    let span = info_span!("Subcommand", name);

    let run = async move {
        match command {
            Commands::Create(args) => args.run(options).await,
            Commands::Rsvp(args) => args.run(options).await,
            Commands::Confirm(args) => args.run(options).await,
            Commands::ConfirmAll(args) => args.run(options).await,
            Commands::Payout(args) => args.run(options).await,
            Commands::List(args) => args.run(options).await,
            Commands::Show(args) => args.run(options).await,
            Commands::MyRsvps(args) => args.run(options).await,
        }
    };

    run.instrument(span).await
}
