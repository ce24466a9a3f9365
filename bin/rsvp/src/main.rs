#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use std::process::exit;

use anyhow::Result;
use args::RsvpArgs;
use clap::Parser;
use tracing::trace;

mod args;
mod commands;
mod utils;

#[tokio::main]
async fn main() {
    let args = RsvpArgs::parse();
    let _ = args.init_logging(&args.verbose);

    if let Err(err) = cli_main(args).await {
        eprintln!("error: {err:?}");
        exit(1);
    }
}

async fn cli_main(args: RsvpArgs) -> Result<()> {
    trace!(command = %args.command, "Configuration parsed.");
    commands::run(args.command, &args.options).await
}
