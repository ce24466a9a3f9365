use alloy_primitives::Address;
use anyhow::Result;
use clap::Args;
use rsvp_utils::env::RSVP_ACCOUNT_ENV_VAR;

use super::required;

#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Account options")]
pub struct AccountOptions {
    #[arg(long = "account", env = RSVP_ACCOUNT_ENV_VAR)]
    #[arg(value_name = "ADDRESS")]
    #[arg(help = "Account sending the transactions. The RPC node must be able to sign for it.")]
    #[arg(global = true)]
    pub account_address: Option<Address>,
}

impl AccountOptions {
    pub fn address(&self) -> Result<Address> {
        required(self.account_address, "account", RSVP_ACCOUNT_ENV_VAR)
    }
}
