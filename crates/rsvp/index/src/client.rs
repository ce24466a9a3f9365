use alloy_primitives::Address;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use rsvp_types::EventId;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};
use url::Url;

use crate::query;
use crate::types::{
    AccountEntity, AccountRsvp, EventEntity, EventFilter, IndexSnapshot, Indexed, IndexedEvent, Meta,
};

const LOG_TARGET: &str = "rsvp::index::client";

/// The index could not serve the query. An empty result is never an error.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error("index responded with HTTP status {0}")]
    Status(StatusCode),

    #[error("malformed index response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("index query failed: {}", .0.join("; "))]
    Query(Vec<String>),

    #[error("index response carried no data")]
    NoData,
}

/// Client of the GraphQL subgraph indexing the registry.
///
/// It never writes and needs no wallet. Listings are lazy streams: a page is requested only
/// when the previous one has been consumed, and calling the method again restarts from the
/// first page.
#[derive(Debug, Clone)]
pub struct IndexClient {
    url: Url,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct EventsData {
    events: Vec<EventEntity>,
    #[serde(rename = "_meta")]
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct EventData {
    event: Option<EventEntity>,
    #[serde(rename = "_meta")]
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    account: Option<AccountEntity>,
    #[serde(rename = "_meta")]
    meta: Meta,
}

struct Page<T> {
    block: u64,
    items: Vec<T>,
}

impl IndexClient {
    pub fn new(url: Url) -> Self {
        Self { url, http_client: Client::new() }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Events matching `filter`, by start time.
    pub fn list_events(
        &self,
        filter: EventFilter,
    ) -> BoxStream<'static, Result<Indexed<IndexedEvent>, IndexError>> {
        let client = self.clone();
        paginate(filter.effective_page_size(), move |skip| {
            let client = client.clone();
            let filter = filter.clone();
            async move { client.events_page(&filter, skip).await }
        })
    }

    /// Registrations held by `account`, restricted to the events matching `filter`.
    pub fn list_my_rsvps(
        &self,
        account: Address,
        filter: EventFilter,
    ) -> BoxStream<'static, Result<Indexed<AccountRsvp>, IndexError>> {
        let client = self.clone();
        paginate(filter.effective_page_size(), move |skip| {
            let client = client.clone();
            let filter = filter.clone();
            async move { client.account_page(account, &filter, skip).await }
        })
    }

    /// Lists every event matching `filter` at once.
    pub async fn snapshot(&self, filter: EventFilter) -> Result<IndexSnapshot, IndexError> {
        let page_size = filter.effective_page_size();
        let mut block = u64::MAX;
        let mut events = Vec::new();
        let mut skip = 0;

        loop {
            let page = self.events_page(&filter, skip).await?;
            block = block.min(page.block);
            let fetched = page.items.len();
            events.extend(page.items.into_iter().map(|row| row.item));

            if fetched < page_size as usize {
                break;
            }
            skip += page_size;
        }

        debug!(target: LOG_TARGET, block, events = events.len(), "Took index snapshot.");
        Ok(IndexSnapshot { block, taken_at: Utc::now(), events })
    }

    pub async fn event(&self, id: EventId) -> Result<Option<Indexed<IndexedEvent>>, IndexError> {
        let data: EventData = self.query(&query::event(), json!({ "id": id.to_string() })).await?;
        let block = data.meta.block.number;
        Ok(data.event.map(|entity| Indexed { block, item: entity.into() }))
    }

    async fn events_page(
        &self,
        filter: &EventFilter,
        skip: u32,
    ) -> Result<Page<Indexed<IndexedEvent>>, IndexError> {
        let variables = json!({
            "first": filter.effective_page_size(),
            "skip": skip,
            "where": query::event_where(filter),
        });
        let data: EventsData = self.query(&query::events(), variables).await?;

        let block = data.meta.block.number;
        let items = data.events.into_iter().map(|e| Indexed { block, item: e.into() }).collect();
        Ok(Page { block, items })
    }

    async fn account_page(
        &self,
        account: Address,
        filter: &EventFilter,
        skip: u32,
    ) -> Result<Page<Indexed<AccountRsvp>>, IndexError> {
        let variables = json!({
            "account": query::entity_id(account),
            "first": filter.effective_page_size(),
            "skip": skip,
            "where": query::rsvp_where(filter),
        });
        let data: AccountData = self.query(&query::account_rsvps(), variables).await?;

        let block = data.meta.block.number;
        let items = data
            .account
            .map(|a| a.rsvps)
            .unwrap_or_default()
            .into_iter()
            .map(|r| Indexed { block, item: r.into_account_rsvp(account) })
            .collect();
        Ok(Page { block, items })
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, IndexError> {
        trace!(target: LOG_TARGET, %variables, "Querying index.");

        let body = json!({ "query": query, "variables": variables });
        let response = self.http_client.post(self.url.clone()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Status(status));
        }

        let bytes = response.bytes().await?;
        let response: GraphQlResponse<T> = serde_json::from_slice(&bytes)?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            return Err(IndexError::Query(errors.into_iter().map(|e| e.message).collect()));
        }

        response.data.ok_or(IndexError::NoData)
    }
}

/// Streams the items of consecutive pages of `page_size` rows. A short page is the last one.
fn paginate<T, F, Fut>(page_size: u32, fetch: F) -> BoxStream<'static, Result<T, IndexError>>
where
    T: Send + 'static,
    F: FnMut(u32) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<Page<T>, IndexError>> + Send + 'static,
{
    let pages = stream::try_unfold((Some(0u32), fetch), move |(skip, mut fetch)| async move {
        let Some(skip) = skip else {
            return Ok::<_, IndexError>(None);
        };

        let page = fetch(skip).await?;
        let next = (page.items.len() == page_size as usize).then(|| skip + page_size);
        let rows = stream::iter(page.items.into_iter().map(Ok::<T, IndexError>));
        Ok(Some((rows, (next, fetch))))
    });

    pages.try_flatten().boxed()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, B256, U256};
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");
    const ALICE: Address = address!("0000000000000000000000000000000000000a11");

    fn event_json(n: u8, timestamp: u64) -> Value {
        json!({
            "id": B256::repeat_byte(n),
            "eventOwner": "0x00000000000000000000000000000000000000aa",
            "name": format!("event {n}"),
            "description": null,
            "imageURL": "",
            "eventTimestamp": timestamp.to_string(),
            "deposit": "100000000000000000",
            "maxCapacity": "20",
            "paidOut": false,
            "totalRSVPs": "1",
            "totalConfirmedAttendees": "0",
            "rsvps": [{
                "attendee": { "id": "0x0000000000000000000000000000000000000a11" },
                "confirmed": false,
                "refunded": false
            }]
        })
    }

    fn events_response(block: u64, events: Vec<Value>) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "data": { "events": events, "_meta": { "block": { "number": block } } }
        }))
    }

    async fn mount_page(server: &MockServer, skip: u32, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "skip": skip } })))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> IndexClient {
        IndexClient::new(Url::parse(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn entities_are_decoded() {
        let server = MockServer::start().await;
        mount_page(&server, 0, events_response(42, vec![event_json(1, 1_700_000_000)])).await;

        let rows: Vec<_> = client(&server).list_events(EventFilter::default()).try_collect().await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.block, 42);
        assert_eq!(row.item.event.owner, OWNER);
        assert_eq!(row.item.event.deposit, U256::from(100_000_000_000_000_000u64));
        assert_eq!(row.item.event.capacity, 20);
        assert_eq!(row.item.event.timestamp, 1_700_000_000);
        assert_eq!(row.item.event.image_ref, None);
        assert_eq!(row.item.event.description, "");
        assert_eq!(row.item.attendees[0].attendee, ALICE);
        assert_eq!(row.item.attendees[0].event_id, row.item.event.id);
    }

    #[tokio::test]
    async fn pages_are_fetched_on_demand() {
        let server = MockServer::start().await;
        mount_page(&server, 0, events_response(10, vec![event_json(1, 1), event_json(2, 2)])).await;
        mount_page(&server, 2, events_response(11, vec![event_json(3, 3)])).await;

        let client = client(&server);
        let filter = EventFilter::default().with_page_size(2);

        let mut stream = client.list_events(filter.clone());
        assert!(stream.next().await.is_some());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);

        let all: Vec<_> = client.list_events(filter).try_collect().await.unwrap();
        let blocks: Vec<u64> = all.iter().map(|r| r.block).collect();
        assert_eq!(blocks, vec![10, 10, 11]);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn no_results_is_an_empty_listing() {
        let server = MockServer::start().await;
        mount_page(&server, 0, events_response(5, vec![])).await;

        let rows: Vec<_> = client(&server).list_events(EventFilter::default()).try_collect().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn filters_are_sent_as_where_conditions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": {
                    "first": 100,
                    "where": {
                        "eventOwner": "0x00000000000000000000000000000000000000aa",
                        "eventTimestamp_gt": "1700000000"
                    }
                }
            })))
            .respond_with(events_response(1, vec![]))
            .expect(1)
            .mount(&server)
            .await;

        let filter = EventFilter::default().owned_by(OWNER).upcoming(1_700_000_000);
        let rows: Vec<_> = client(&server).list_events(filter).try_collect().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn snapshot_reports_the_oldest_block() {
        let server = MockServer::start().await;
        mount_page(&server, 0, events_response(30, vec![event_json(1, 1)])).await;
        mount_page(&server, 1, events_response(29, vec![])).await;

        let snapshot = client(&server)
            .snapshot(EventFilter::default().with_page_size(1))
            .await
            .unwrap();

        assert_eq!(snapshot.block, 29);
        assert_eq!(snapshot.events.len(), 1);
    }

    #[tokio::test]
    async fn graphql_errors_make_the_index_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "indexing_error" }]
            })))
            .mount(&server)
            .await;

        let err = client(&server).snapshot(EventFilter::default()).await.unwrap_err();
        assert_matches!(err, IndexError::Query(messages) if messages == vec!["indexing_error".to_string()]);
    }

    #[tokio::test]
    async fn transport_failures_make_the_index_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let err = client(&server).event(EventId::new(B256::ZERO)).await.unwrap_err();
        assert_matches!(err, IndexError::Status(status) if status == StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn successful_response_without_graphql_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>upstream error</html>"))
            .mount(&server)
            .await;
        let err = client(&server).event(EventId::new(B256::ZERO)).await.unwrap_err();
        assert_matches!(err, IndexError::Malformed(_));

        let wrong_shape = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "events": "not a list", "_meta": { "block": { "number": 1 } } }
            })))
            .mount(&wrong_shape)
            .await;
        let err = client(&wrong_shape).snapshot(EventFilter::default()).await.unwrap_err();
        assert_matches!(err, IndexError::Malformed(_));
    }

    #[tokio::test]
    async fn unknown_event_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "event": null, "_meta": { "block": { "number": 7 } } }
            })))
            .mount(&server)
            .await;

        assert!(client(&server).event(EventId::new(B256::ZERO)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rsvps_of_an_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": {
                    "account": "0x0000000000000000000000000000000000000a11",
                    "where": { "event_": { "eventTimestamp_lt": "50" } }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "account": {
                        "rsvps": [{ "confirmed": true, "refunded": true, "event": event_json(4, 10) }]
                    },
                    "_meta": { "block": { "number": 3 } }
                }
            })))
            .mount(&server)
            .await;

        let rows: Vec<_> = client(&server)
            .list_my_rsvps(ALICE, EventFilter::default().past(50))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0].item;
        assert_eq!(row.event_id(), EventId::new(B256::repeat_byte(4)));
        assert_eq!(row.rsvp.attendee, ALICE);
        assert!(row.rsvp.confirmed && row.rsvp.refunded);
    }

    #[tokio::test]
    async fn account_without_rsvps_is_an_empty_listing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "account": null, "_meta": { "block": { "number": 3 } } }
            })))
            .mount(&server)
            .await;

        let rows: Vec<_> =
            client(&server).list_my_rsvps(ALICE, EventFilter::default()).try_collect().await.unwrap();
        assert!(rows.is_empty());
    }
}
