use std::str::FromStr;

use alloy_primitives::Bytes;
use alloy_transport::{RpcError, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request never produced a JSON-RPC answer: connection failure, HTTP error status, and
    /// the like.
    #[error(transparent)]
    Transport(TransportError),

    #[error(transparent)]
    Rpc(JsonRpcError),

    #[error("malformed response: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => ProviderError::Rpc(JsonRpcError {
                code: payload.code,
                message: payload.message.to_string(),
                data: payload.data.and_then(|raw| serde_json::from_str(raw.get()).ok()),
            }),
            RpcError::DeserError { err, .. } => ProviderError::Malformed(err),
            other => ProviderError::Transport(other),
        }
    }
}

impl ProviderError {
    /// Revert payload of a failed call or transaction, if the node reported one.
    pub fn revert_data(&self) -> Option<Bytes> {
        match self {
            ProviderError::Rpc(err) => err.revert_data(),
            _ => None,
        }
    }
}

/// Error object of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Code used by nodes for `execution reverted` errors.
    pub const EXECUTION_REVERTED: i64 = 3;

    pub fn reverted(data: Bytes) -> Self {
        Self {
            code: Self::EXECUTION_REVERTED,
            message: "execution reverted".to_string(),
            data: Some(Value::String(data.to_string())),
        }
    }

    /// Nodes either put the revert payload directly in `data` or nest it as `data.data`.
    pub fn revert_data(&self) -> Option<Bytes> {
        let raw = match self.data.as_ref()? {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map.get("data")?.as_str()?,
            _ => return None,
        };

        Bytes::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn revert_data_is_read_from_flat_and_nested_payloads() {
        let flat = JsonRpcError {
            code: 3,
            message: "execution reverted".into(),
            data: Some(json!("0xdeadbeef")),
        };
        assert_eq!(flat.revert_data().unwrap().as_ref(), &[0xde, 0xad, 0xbe, 0xef]);

        let nested = JsonRpcError {
            code: -32000,
            message: "execution reverted".into(),
            data: Some(json!({ "data": "0x01" })),
        };
        assert_eq!(nested.revert_data().unwrap().as_ref(), &[0x01]);

        let none = JsonRpcError { code: -32000, message: "nonce too low".into(), data: None };
        assert!(none.revert_data().is_none());
    }

    #[test]
    fn reverted_error_round_trips_its_payload() {
        let payload = Bytes::from_static(&[1, 2, 3]);
        assert_eq!(JsonRpcError::reverted(payload.clone()).revert_data(), Some(payload));
    }
}
