use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_log::{AsTrace, LogTracer};
use tracing_subscriber::FmtSubscriber;

use crate::commands::options::GlobalOptions;
use crate::commands::Commands;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct RsvpArgs {
    #[clap(help = "Logging verbosity.")]
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

impl RsvpArgs {
    pub fn init_logging(
        &self,
        clap_verbosity: &clap_verbosity_flag::Verbosity,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let verbose = clap_verbosity.log_level_filter().as_trace() >= LevelFilter::DEBUG;

        let default_log_filter: &str = if verbose {
            "none,hyper=off,rsvp=trace,rsvp_contract=trace,rsvp_index=trace,rsvp_utils=trace,\
             rsvp_view=trace"
        } else {
            "none,hyper=off,rsvp=info,rsvp_contract=info,rsvp_view=warn"
        };

        LogTracer::init()?;

        let subscriber = FmtSubscriber::builder()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_filter)),
            )
            .finish();

        Ok(tracing::subscriber::set_global_default(subscriber)?)
    }
}
