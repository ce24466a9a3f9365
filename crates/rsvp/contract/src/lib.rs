#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[allow(clippy::too_many_arguments)]
pub mod abigen;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod pending;
pub mod session;

pub use error::{BindingError, GatewayError, GuardError};
pub use gateway::{CheckIn, ContractGateway, Payout};
pub use guard::{assert_network, NetworkGuard, VerifiedSession};
pub use pending::{Confirmed, PendingTransaction, TxStatus};
pub use session::{Session, SessionEvent, SessionHandle, WalletSession};
