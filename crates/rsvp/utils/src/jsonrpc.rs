use std::fmt;

use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::{Provider, ProviderBuilder, ReqwestProvider};
use alloy_rpc_types_eth::{Block, BlockNumberOrTag};
use async_trait::async_trait;
use rsvp_types::ChainId;
use tracing::trace;
use url::Url;

use crate::error::ProviderError;
use crate::provider::{LedgerProvider, TransactionReceipt, TransactionRequest};

const LOG_TARGET: &str = "rsvp::utils::jsonrpc";

/// Ledger provider speaking JSON-RPC over HTTP(S).
#[derive(Clone)]
pub struct JsonRpcClient {
    url: Url,
    provider: ReqwestProvider,
}

impl fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcClient").field("url", &self.url.as_str()).finish()
    }
}

impl JsonRpcClient {
    pub fn new(url: Url) -> Self {
        let provider = ProviderBuilder::new().on_http(url.clone());
        Self { url, provider }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl LedgerProvider for JsonRpcClient {
    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        trace!(target: LOG_TARGET, "Requesting chain id.");
        Ok(ChainId::new(self.provider.get_chain_id().await?))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ProviderError> {
        trace!(target: LOG_TARGET, %address, "Requesting code.");
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, ProviderError> {
        Ok(self.provider.call(request).await?)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash, ProviderError> {
        let pending = self.provider.send_transaction(request.clone()).await?;
        trace!(target: LOG_TARGET, tx_hash = %pending.tx_hash(), "Transaction accepted.");
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(Into::into))
    }

    async fn block_timestamp(&self) -> Result<u64, ProviderError> {
        let block: Option<Block> = self
            .provider
            .raw_request("eth_getBlockByNumber".into(), (BlockNumberOrTag::Latest, false))
            .await?;
        let block = block.ok_or_else(|| {
            ProviderError::Unavailable("node returned no latest block".to_string())
        })?;
        Ok(block.header.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, B256, U256};
    use assert_matches::assert_matches;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;
    use crate::provider::call_request;

    /// Answers with `body` under the id of the incoming request.
    struct Reply(Value);

    impl Respond for Reply {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let id = serde_json::from_slice::<Value>(&request.body)
                .ok()
                .and_then(|body| body.get("id").cloned())
                .unwrap_or(Value::Null);

            let mut body = self.0.clone();
            body["jsonrpc"] = json!("2.0");
            body["id"] = id;
            ResponseTemplate::new(200).set_body_json(body)
        }
    }

    fn result(value: Value) -> Reply {
        Reply(json!({ "result": value }))
    }

    fn client_for(server: &MockServer) -> JsonRpcClient {
        JsonRpcClient::new(Url::parse(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn chain_id_is_parsed_from_hex_quantity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_chainId" })))
            .respond_with(result(json!("0xaef3")))
            .mount(&server)
            .await;

        let chain_id = client_for(&server).chain_id().await.unwrap();
        assert_eq!(chain_id, ChainId::ALFAJORES);
    }

    #[tokio::test]
    async fn unmined_receipt_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_getTransactionReceipt" })))
            .respond_with(result(Value::Null))
            .mount(&server)
            .await;

        let receipt = client_for(&server).transaction_receipt(B256::ZERO).await.unwrap();
        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn receipt_fields_are_decoded() {
        let server = MockServer::start().await;
        let hash = B256::repeat_byte(7);
        let emitter = address!("00000000000000000000000000000000000000aa");
        Mock::given(method("POST"))
            .respond_with(result(json!({
                "type": "0x2",
                "status": "0x0",
                "cumulativeGasUsed": "0x5208",
                "logsBloom": format!("0x{}", "00".repeat(256)),
                "logs": [{
                    "address": emitter,
                    "topics": [B256::repeat_byte(1)],
                    "data": "0x",
                    "removed": false
                }],
                "transactionHash": hash,
                "transactionIndex": "0x0",
                "blockHash": B256::repeat_byte(8),
                "blockNumber": "0x10",
                "gasUsed": "0x5208",
                "effectiveGasPrice": "0x1",
                "from": "0x0000000000000000000000000000000000000011",
                "to": "0x0000000000000000000000000000000000000022",
                "contractAddress": null
            })))
            .mount(&server)
            .await;

        let receipt = client_for(&server).transaction_receipt(hash).await.unwrap().unwrap();
        assert_eq!(receipt.transaction_hash, hash);
        assert_eq!(receipt.block_height(), Some(16));
        assert!(!receipt.succeeded());
        assert_eq!(receipt.logs_matching(emitter, B256::repeat_byte(1)).count(), 1);
    }

    #[tokio::test]
    async fn rpc_errors_keep_revert_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(Reply(json!({
                "error": { "code": 3, "message": "execution reverted", "data": "0x1234" }
            })))
            .mount(&server)
            .await;

        let request = call_request(
            address!("0000000000000000000000000000000000000011"),
            address!("0000000000000000000000000000000000000022"),
            Bytes::new(),
        );
        let err = client_for(&server).call(&request).await.unwrap_err();
        assert_matches!(&err, ProviderError::Rpc(e) if e.code == 3);
        assert_eq!(err.revert_data().unwrap().as_ref(), &[0x12, 0x34]);
    }

    #[tokio::test]
    async fn non_json_error_status_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).block_timestamp().await.unwrap_err();
        assert_matches!(err, ProviderError::Transport(_));
    }

    #[tokio::test]
    async fn send_transaction_serializes_value_and_input() {
        let server = MockServer::start().await;
        let hash = B256::repeat_byte(9);
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "eth_sendTransaction",
                "params": [{
                    "from": "0x0000000000000000000000000000000000000011",
                    "to": "0x0000000000000000000000000000000000000022",
                    "value": "0x64",
                    "input": "0xabcd"
                }]
            })))
            .respond_with(result(json!(hash)))
            .mount(&server)
            .await;

        let request = call_request(
            address!("0000000000000000000000000000000000000011"),
            address!("0000000000000000000000000000000000000022"),
            Bytes::from_static(&[0xab, 0xcd]),
        )
        .value(U256::from(100));

        let sent = client_for(&server).send_transaction(&request).await.unwrap();
        assert_eq!(sent, hash);
    }
}
