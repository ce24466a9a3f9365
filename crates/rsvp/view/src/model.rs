use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rsvp_contract::{ContractGateway, GatewayError, SessionEvent};
use rsvp_index::{EventFilter, IndexClient, IndexSnapshot};
use rsvp_types::{EventId, RuleViolation};
use tracing::{debug, warn};

use crate::error::ViewError;
use crate::view::{EventView, Freshness, Listing};

const LOG_TARGET: &str = "rsvp::view";

/// Merges cheap index listings with authoritative ledger reads.
///
/// Listings always come from the index. A single focused event is read from the ledger when a
/// gateway is attached, and from the index otherwise; every view says which one it came from.
/// Refreshing is left to the caller.
#[derive(Debug)]
pub struct EventViewModel {
    index: IndexClient,
    gateway: RwLock<Option<Arc<ContractGateway>>>,
    listings: RwLock<HashMap<EventFilter, IndexSnapshot>>,
}

impl EventViewModel {
    pub fn new(index: IndexClient) -> Self {
        Self { index, gateway: RwLock::new(None), listings: RwLock::new(HashMap::new()) }
    }

    pub fn index(&self) -> &IndexClient {
        &self.index
    }

    pub fn attach_gateway(&self, gateway: Arc<ContractGateway>) {
        debug!(target: LOG_TARGET, sender = %gateway.sender(), "Gateway attached.");
        *self.gateway.write() = Some(gateway);
    }

    pub fn detach_gateway(&self) -> Option<Arc<ContractGateway>> {
        debug!(target: LOG_TARGET, "Gateway detached.");
        self.gateway.write().take()
    }

    pub fn gateway(&self) -> Option<Arc<ContractGateway>> {
        self.gateway.read().clone()
    }

    /// Drops the attached gateway when the session it was bound for is gone.
    pub fn observe(&self, event: SessionEvent) {
        let Some(gateway) = self.gateway() else {
            return;
        };

        let still_valid = match event {
            SessionEvent::Connected { address, chain_id } => {
                address == gateway.sender() && chain_id == gateway.chain_id()
            }
            SessionEvent::Disconnected => false,
        };

        if !still_valid {
            self.detach_gateway();
        }
    }

    /// Events matching `filter`, from the index.
    ///
    /// When the index cannot be reached, the last listing it served for the same filter is
    /// returned instead, marked as degraded.
    pub async fn list(&self, filter: EventFilter) -> Result<Listing, ViewError> {
        match self.index.snapshot(filter.clone()).await {
            Ok(snapshot) => {
                let listing = Listing::from_snapshot(&snapshot, false);
                self.listings.write().insert(filter, snapshot);
                Ok(listing)
            }
            Err(err) => {
                warn!(target: LOG_TARGET, %err, "Index unavailable.");
                match self.listings.read().get(&filter) {
                    Some(snapshot) => Ok(Listing::from_snapshot(snapshot, true)),
                    None => Err(ViewError::Index(err)),
                }
            }
        }
    }

    /// The event with the freshest data available, falling back to the index when the ledger
    /// cannot be read.
    pub async fn focus(&self, id: EventId) -> Result<EventView, ViewError> {
        let ledger = match self.gateway() {
            None => None,
            Some(gateway) => match read_ledger(&gateway, id).await {
                Ok(view) => return Ok(view),
                Err(GatewayError::Rule(RuleViolation::UnknownEvent(_))) => {
                    return Err(ViewError::NotFound(id));
                }
                Err(err) => {
                    warn!(target: LOG_TARGET, event_id = %id, %err, "Ledger read failed, falling back to the index.");
                    Some(err)
                }
            },
        };

        match self.index.event(id).await {
            Ok(Some(row)) => Ok(EventView::from_index(row)),
            Ok(None) if ledger.is_none() => Err(ViewError::NotFound(id)),
            Ok(None) => Err(ViewError::Unavailable { event_id: id, ledger, index: None }),
            Err(index) => Err(ViewError::Unavailable { event_id: id, ledger, index: Some(index) }),
        }
    }

    /// The event as the ledger has it now. Never served from the index.
    pub async fn require_fresh(&self, id: EventId) -> Result<EventView, ViewError> {
        let gateway = self.gateway().ok_or(ViewError::Disconnected)?;

        read_ledger(&gateway, id).await.map_err(|err| match err {
            GatewayError::Rule(RuleViolation::UnknownEvent(_)) => ViewError::NotFound(id),
            err => ViewError::Ledger(err),
        })
    }
}

async fn read_ledger(gateway: &ContractGateway, id: EventId) -> Result<EventView, GatewayError> {
    let (event, attendees, block_timestamp) = futures::try_join!(
        gateway.get_event_state(id),
        gateway.get_attendees(id),
        gateway.ledger_time(),
    )?;

    Ok(EventView {
        event,
        attendees: Some(attendees),
        freshness: Freshness::Ledger { block_timestamp },
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy_primitives::{address, Address, B256, U256};
    use assert_matches::assert_matches;
    use rsvp_contract::{assert_network, Session};
    use rsvp_test_utils::{TestLedger, GENESIS_TIMESTAMP, REGISTRY_ADDRESS};
    use rsvp_types::{ChainId, NewEvent};
    use rsvp_utils::{LedgerProvider, TxnConfig};
    use serde_json::{json, Value};
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");

    async fn gateway(ledger: &Arc<TestLedger>) -> Arc<ContractGateway> {
        let wallet: Arc<dyn LedgerProvider> = ledger.clone();
        let session = Session::connect(wallet, OWNER).await.unwrap();
        let verified = assert_network(&session, ChainId::ALFAJORES).unwrap();
        let config = TxnConfig::default().with_poll_interval(Duration::from_millis(5));
        Arc::new(ContractGateway::bind(verified, REGISTRY_ADDRESS).await.unwrap().with_txn_config(config))
    }

    async fn create_event(gateway: &ContractGateway) -> EventId {
        let event = NewEvent {
            name: "on chain name".into(),
            description: String::new(),
            timestamp: GENESIS_TIMESTAMP + 60,
            deposit: U256::from(100),
            capacity: 10,
            image_ref: None,
        };
        gateway.create_event(event).await.unwrap().confirm().await.unwrap().result
    }

    fn indexed_event(id: EventId) -> Value {
        json!({
            "id": id.0,
            "eventOwner": "0x00000000000000000000000000000000000000aa",
            "name": "indexed name",
            "description": "",
            "imageURL": null,
            "eventTimestamp": (GENESIS_TIMESTAMP + 60).to_string(),
            "deposit": "100",
            "maxCapacity": "10",
            "paidOut": false,
            "totalRSVPs": "0",
            "totalConfirmedAttendees": "0",
            "rsvps": []
        })
    }

    async fn index_serving(data: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(&server)
            .await;
        server
    }

    async fn index_down() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).mount(&server).await;
        server
    }

    fn model(server: &MockServer) -> EventViewModel {
        EventViewModel::new(IndexClient::new(Url::parse(&server.uri()).unwrap()))
    }

    fn meta(block: u64) -> Value {
        json!({ "block": { "number": block } })
    }

    #[tokio::test]
    async fn focus_prefers_the_ledger() {
        let ledger = Arc::new(TestLedger::new(ChainId::ALFAJORES));
        let gateway = gateway(&ledger).await;
        let id = create_event(&gateway).await;

        let index = index_serving(json!({ "event": indexed_event(id), "_meta": meta(8) })).await;
        let model = model(&index);
        model.attach_gateway(gateway);

        let view = model.focus(id).await.unwrap();
        assert!(!view.stale());
        assert_eq!(view.event.name, "on chain name");
        assert_eq!(view.freshness, Freshness::Ledger { block_timestamp: GENESIS_TIMESTAMP });
        assert_eq!(view.attendees, Some(vec![]));
    }

    #[tokio::test]
    async fn failed_ledger_read_falls_back_to_stale_index_data() {
        let ledger = Arc::new(TestLedger::new(ChainId::ALFAJORES));
        let gateway = gateway(&ledger).await;
        let id = create_event(&gateway).await;

        let index = index_serving(json!({ "event": indexed_event(id), "_meta": meta(8) })).await;
        let model = model(&index);
        model.attach_gateway(gateway);
        ledger.set_offline(true);

        let view = model.focus(id).await.unwrap();
        assert!(view.stale());
        assert_eq!(view.event.name, "indexed name");
        assert_eq!(view.freshness, Freshness::Index { block: 8 });

        assert_matches!(model.require_fresh(id).await, Err(ViewError::Ledger(err)) if err.is_unavailable());
    }

    #[tokio::test]
    async fn without_a_gateway_everything_is_stale() {
        let id = EventId::new(B256::repeat_byte(3));
        let index = index_serving(json!({ "event": indexed_event(id), "_meta": meta(2) })).await;
        let model = model(&index);

        assert!(model.focus(id).await.unwrap().stale());
        assert_matches!(model.require_fresh(id).await, Err(ViewError::Disconnected));
    }

    #[tokio::test]
    async fn both_sources_failing_reports_both_causes() {
        let ledger = Arc::new(TestLedger::new(ChainId::ALFAJORES));
        let gateway = gateway(&ledger).await;
        let id = create_event(&gateway).await;

        let index = index_down().await;
        let model = model(&index);
        model.attach_gateway(gateway);
        ledger.set_offline(true);

        assert_matches!(
            model.focus(id).await,
            Err(ViewError::Unavailable { ledger: Some(_), index: Some(_), event_id }) if event_id == id
        );
    }

    #[tokio::test]
    async fn ledger_is_authoritative_about_missing_events() {
        let ledger = Arc::new(TestLedger::new(ChainId::ALFAJORES));
        let gateway = gateway(&ledger).await;
        let id = EventId::new(B256::repeat_byte(9));

        let index = index_serving(json!({ "event": indexed_event(id), "_meta": meta(8) })).await;
        let model = model(&index);
        model.attach_gateway(gateway);

        assert_matches!(model.focus(id).await, Err(ViewError::NotFound(e)) if e == id);
    }

    #[tokio::test]
    async fn listing_degrades_to_the_last_snapshot() {
        let id = EventId::new(B256::repeat_byte(4));
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "events": [indexed_event(id)], "_meta": meta(12) }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

        let model = model(&server);
        let fresh = model.list(EventFilter::default()).await.unwrap();
        assert!(!fresh.degraded);
        assert_eq!(fresh.block, 12);
        assert!(fresh.events.iter().all(EventView::stale));

        let degraded = model.list(EventFilter::default()).await.unwrap();
        assert!(degraded.degraded);
        assert_eq!(degraded.events, fresh.events);

        // Nothing cached for another filter.
        assert_matches!(
            model.list(EventFilter::default().owned_by(OWNER)).await,
            Err(ViewError::Index(_))
        );
    }

    #[tokio::test]
    async fn session_changes_detach_the_gateway() {
        let ledger = Arc::new(TestLedger::new(ChainId::ALFAJORES));
        let index = index_down().await;
        let model = model(&index);
        model.attach_gateway(gateway(&ledger).await);

        model.observe(SessionEvent::Connected { address: OWNER, chain_id: ChainId::ALFAJORES });
        assert!(model.gateway().is_some());

        model.observe(SessionEvent::Connected { address: OWNER, chain_id: ChainId::CELO });
        assert!(model.gateway().is_none());

        model.attach_gateway(gateway(&ledger).await);
        model.observe(SessionEvent::Disconnected);
        assert!(model.gateway().is_none());
    }
}
