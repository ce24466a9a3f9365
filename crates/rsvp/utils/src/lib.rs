#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod tx;

pub mod env;
pub mod error;
pub mod jsonrpc;
pub mod provider;

pub use error::{JsonRpcError, ProviderError};
pub use jsonrpc::JsonRpcClient;
pub use provider::{
    call_request, LedgerProvider, Log, TransactionInput, TransactionReceipt, TransactionRequest,
};
pub use tx::waiter::*;
pub use tx::*;
