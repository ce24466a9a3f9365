use std::ops::Deref;

use rsvp_types::ChainId;
use tracing::warn;

use crate::error::GuardError;
use crate::session::{Session, WalletSession};

const LOG_TARGET: &str = "rsvp::contract::guard";

/// A connected session whose chain matched the expected one when it was checked.
///
/// Only [`NetworkGuard`] creates these, and a gateway can only be bound to one.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedSession<'a> {
    wallet: &'a WalletSession,
}

impl Deref for VerifiedSession<'_> {
    type Target = WalletSession;

    fn deref(&self) -> &Self::Target {
        self.wallet
    }
}

/// Refuses sessions connected to a chain other than `expected`.
///
/// The expected chain comes from configuration. Deployments on several networks use one guard
/// per network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkGuard {
    expected: ChainId,
}

impl NetworkGuard {
    pub fn new(expected: ChainId) -> Self {
        Self { expected }
    }

    pub fn expected(&self) -> ChainId {
        self.expected
    }

    pub fn assert_network<'a>(&self, session: &'a Session) -> Result<VerifiedSession<'a>, GuardError> {
        assert_network(session, self.expected)
    }
}

/// Checks that `session` has a wallet and that it is on `expected`.
pub fn assert_network(session: &Session, expected: ChainId) -> Result<VerifiedSession<'_>, GuardError> {
    let wallet = session.wallet().ok_or(GuardError::NoWallet)?;

    if wallet.chain_id() != expected {
        warn!(target: LOG_TARGET, %expected, actual = %wallet.chain_id(), "Wallet on unexpected network.");
        return Err(GuardError::NetworkMismatch { expected, actual: wallet.chain_id() });
    }

    Ok(VerifiedSession { wallet })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::address;
    use assert_matches::assert_matches;
    use rsvp_test_utils::TestLedger;
    use rsvp_utils::LedgerProvider;

    use super::*;

    #[tokio::test]
    async fn matching_chain_is_verified() {
        let ledger: Arc<dyn LedgerProvider> = Arc::new(TestLedger::new(ChainId::ALFAJORES));
        let owner = address!("00000000000000000000000000000000000000aa");
        let session = Session::connect(ledger, owner).await.unwrap();

        let verified = NetworkGuard::new(ChainId::ALFAJORES).assert_network(&session).unwrap();
        assert_eq!(verified.address(), owner);
    }

    #[tokio::test]
    async fn other_chain_is_a_mismatch() {
        let ledger: Arc<dyn LedgerProvider> = Arc::new(TestLedger::new(ChainId::MUMBAI));
        let session = Session::connect(ledger, Default::default()).await.unwrap();

        assert_matches!(
            assert_network(&session, ChainId::ALFAJORES),
            Err(GuardError::NetworkMismatch { expected, actual })
                if expected == ChainId::ALFAJORES && actual == ChainId::MUMBAI
        );
    }

    #[test]
    fn disconnected_session_has_no_wallet() {
        assert_matches!(
            assert_network(&Session::Disconnected, ChainId::ALFAJORES),
            Err(GuardError::NoWallet)
        );
    }
}
