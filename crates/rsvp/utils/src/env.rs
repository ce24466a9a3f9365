pub const RSVP_RPC_URL_ENV_VAR: &str = "RSVP_RPC_URL";
pub const RSVP_CHAIN_ID_ENV_VAR: &str = "RSVP_CHAIN_ID";
pub const RSVP_CONTRACT_ADDRESS_ENV_VAR: &str = "RSVP_CONTRACT_ADDRESS";
pub const RSVP_INDEX_URL_ENV_VAR: &str = "RSVP_INDEX_URL";
pub const RSVP_ACCOUNT_ENV_VAR: &str = "RSVP_ACCOUNT";
