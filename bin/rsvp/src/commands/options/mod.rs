use anyhow::{anyhow, Result};
use clap::Args;

pub mod account;
pub mod index;
pub mod ledger;
pub mod transaction;

use account::AccountOptions;
use index::IndexOptions;
use ledger::LedgerOptions;

/// Connection settings shared by every command.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalOptions {
    #[command(flatten)]
    pub ledger: LedgerOptions,

    #[command(flatten)]
    pub index: IndexOptions,

    #[command(flatten)]
    pub account: AccountOptions,
}

/// Unwraps a setting that has no default, naming both ways of providing it.
pub(crate) fn required<T>(value: Option<T>, flag: &str, env_var: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("Missing `--{flag}`. Pass it or set the `{env_var}` environment variable."))
}
