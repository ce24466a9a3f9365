//! The wallet connection of the current user.

use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::RwLock;
use rsvp_types::ChainId;
use rsvp_utils::{LedgerProvider, ProviderError};
use tokio::sync::watch;
use tracing::info;

const LOG_TARGET: &str = "rsvp::contract::session";

/// A wallet that signs as `address` and reported `chain_id` when it was connected.
#[derive(Debug, Clone)]
pub struct WalletSession {
    address: Address,
    chain_id: ChainId,
    wallet: Arc<dyn LedgerProvider>,
}

impl WalletSession {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn wallet(&self) -> &Arc<dyn LedgerProvider> {
        &self.wallet
    }
}

#[derive(Debug, Clone, Default)]
pub enum Session {
    Connected(WalletSession),
    #[default]
    Disconnected,
}

impl Session {
    /// Connects `wallet` for `address`, recording the chain it is currently on.
    pub async fn connect(
        wallet: Arc<dyn LedgerProvider>,
        address: Address,
    ) -> Result<Self, ProviderError> {
        let chain_id = wallet.chain_id().await?;
        Ok(Session::Connected(WalletSession { address, chain_id, wallet }))
    }

    pub fn wallet(&self) -> Option<&WalletSession> {
        match self {
            Session::Connected(wallet) => Some(wallet),
            Session::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Session::Connected(_))
    }
}

/// What subscribers of a [`SessionHandle`] observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected { address: Address, chain_id: ChainId },
    Disconnected,
}

impl From<&Session> for SessionEvent {
    fn from(session: &Session) -> Self {
        match session {
            Session::Connected(w) => {
                SessionEvent::Connected { address: w.address, chain_id: w.chain_id }
            }
            Session::Disconnected => SessionEvent::Disconnected,
        }
    }
}

/// Holds the current session and tells subscribers when it changes, so that anything built
/// on a previous session (a bound gateway) can be dropped.
#[derive(Debug)]
pub struct SessionHandle {
    session: RwLock<Session>,
    events: watch::Sender<SessionEvent>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (events, _) = watch::channel(SessionEvent::Disconnected);
        Self { session: RwLock::new(Session::Disconnected), events }
    }

    pub async fn connect(
        &self,
        wallet: Arc<dyn LedgerProvider>,
        address: Address,
    ) -> Result<Session, ProviderError> {
        let session = Session::connect(wallet, address).await?;
        self.replace(session.clone());
        Ok(session)
    }

    /// The wallet switched accounts or networks. Its new state replaces the current session.
    pub async fn refresh(&self) -> Result<Session, ProviderError> {
        let Some(current) = self.current().wallet().cloned() else {
            return Ok(Session::Disconnected);
        };

        let session = Session::connect(current.wallet, current.address).await?;
        if session.wallet().map(|w| w.chain_id) != Some(current.chain_id) {
            self.replace(session.clone());
        }
        Ok(session)
    }

    pub fn disconnect(&self) {
        self.replace(Session::Disconnected);
    }

    pub fn current(&self) -> Session {
        self.session.read().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn replace(&self, session: Session) {
        let event = SessionEvent::from(&session);
        *self.session.write() = session;
        info!(target: LOG_TARGET, ?event, "Session changed.");
        self.events.send_replace(event);
    }
}
