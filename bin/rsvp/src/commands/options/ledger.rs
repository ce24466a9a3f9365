use alloy_primitives::Address;
use anyhow::Result;
use clap::Args;
use rsvp_types::ChainId;
use rsvp_utils::env::{RSVP_CHAIN_ID_ENV_VAR, RSVP_CONTRACT_ADDRESS_ENV_VAR, RSVP_RPC_URL_ENV_VAR};
use rsvp_utils::JsonRpcClient;
use tracing::trace;
use url::Url;

use super::required;

#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Ledger options")]
pub struct LedgerOptions {
    #[arg(long, env = RSVP_RPC_URL_ENV_VAR)]
    #[arg(value_name = "URL")]
    #[arg(help = "JSON-RPC endpoint of the wallet node. It signs transactions for the account.")]
    #[arg(global = true)]
    pub rpc_url: Option<Url>,

    #[arg(long, env = RSVP_CHAIN_ID_ENV_VAR)]
    #[arg(value_name = "CHAIN_ID")]
    #[arg(help = "Chain the registry is deployed on, in decimal or 0x-prefixed hex.")]
    #[arg(global = true)]
    pub chain_id: Option<ChainId>,

    #[arg(long, env = RSVP_CONTRACT_ADDRESS_ENV_VAR)]
    #[arg(value_name = "ADDRESS")]
    #[arg(help = "Address of the event registry contract.")]
    #[arg(global = true)]
    pub contract_address: Option<Address>,
}

impl LedgerOptions {
    pub fn url(&self) -> Result<Url> {
        required(self.rpc_url.clone(), "rpc-url", RSVP_RPC_URL_ENV_VAR)
    }

    pub fn provider(&self) -> Result<JsonRpcClient> {
        let url = self.url()?;
        trace!(%url, "Creating JsonRpcClient with given RPC URL.");
        Ok(JsonRpcClient::new(url))
    }

    pub fn chain_id(&self) -> Result<ChainId> {
        required(self.chain_id, "chain-id", RSVP_CHAIN_ID_ENV_VAR)
    }

    pub fn contract_address(&self) -> Result<Address> {
        required(self.contract_address, "contract-address", RSVP_CONTRACT_ADDRESS_ENV_VAR)
    }

    /// True when every ledger setting was provided.
    pub fn is_configured(&self) -> bool {
        self.rpc_url.is_some() && self.chain_id.is_some() && self.contract_address.is_some()
    }
}
