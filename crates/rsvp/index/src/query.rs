use alloy_primitives::Address;
use serde_json::{json, Map, Value};

use crate::types::EventFilter;

const EVENT_FIELDS: &str = r#"
fragment EventFields on Event {
  id
  eventOwner
  name
  description
  imageURL
  eventTimestamp
  deposit
  maxCapacity
  paidOut
  totalRSVPs
  totalConfirmedAttendees
  rsvps { attendee { id } confirmed refunded }
}
"#;

pub(crate) fn events() -> String {
    format!(
        r#"query Events($first: Int!, $skip: Int!, $where: Event_filter!) {{
  events(first: $first, skip: $skip, where: $where, orderBy: eventTimestamp, orderDirection: asc) {{
    ...EventFields
  }}
  _meta {{ block {{ number }} }}
}}
{EVENT_FIELDS}"#
    )
}

pub(crate) fn event() -> String {
    format!(
        r#"query Event($id: ID!) {{
  event(id: $id) {{
    ...EventFields
  }}
  _meta {{ block {{ number }} }}
}}
{EVENT_FIELDS}"#
    )
}

pub(crate) fn account_rsvps() -> String {
    format!(
        r#"query AccountRsvps($account: ID!, $first: Int!, $skip: Int!, $where: RSVP_filter!) {{
  account(id: $account) {{
    rsvps(first: $first, skip: $skip, where: $where) {{
      confirmed
      refunded
      event {{ ...EventFields }}
    }}
  }}
  _meta {{ block {{ number }} }}
}}
{EVENT_FIELDS}"#
    )
}

/// The subgraph stores addresses lowercased and uses them as ids.
pub(crate) fn entity_id(address: Address) -> String {
    address.to_string().to_lowercase()
}

pub(crate) fn event_where(filter: &EventFilter) -> Value {
    let mut conditions = Map::new();

    if let Some(owner) = filter.owner {
        conditions.insert("eventOwner".into(), json!(entity_id(owner)));
    }
    if let Some(after) = filter.upcoming_after {
        conditions.insert("eventTimestamp_gt".into(), json!(after.to_string()));
    }
    if let Some(before) = filter.past_before {
        conditions.insert("eventTimestamp_lt".into(), json!(before.to_string()));
    }

    Value::Object(conditions)
}

pub(crate) fn rsvp_where(filter: &EventFilter) -> Value {
    match event_where(filter) {
        Value::Object(conditions) if conditions.is_empty() => json!({}),
        conditions => json!({ "event_": conditions }),
    }
}
