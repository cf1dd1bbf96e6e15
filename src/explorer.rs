use crate::chain::ChainId;
use crate::config::{Config, ExplorerEndpoint};
use crate::error::UpstreamError;
use alloy_primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

// Numeric fields stay strings; the explorer serializes everything as
// strings and values can exceed 64 bits.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub contract_address: String,
    pub time_stamp: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationRecord {
    pub contract_address: String,
    pub contract_creator: String,
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

impl Envelope {
    /// Non-"1" statuses cover both a genuinely empty answer (array result)
    /// and API-level failures like rate limiting, where `result` is an
    /// error string under a "NOTOK" message.
    fn is_empty_answer(&self) -> bool {
        self.status != "1" && self.result.is_array()
    }

    fn api_error(&self) -> UpstreamError {
        let detail = self.result.as_str().unwrap_or_default();
        UpstreamError::Unavailable(format!("explorer error: {} {detail}", self.message))
    }
}

/// Block-explorer lookups needed by the pipeline. Production code talks to
/// the etherscan-family REST API; tests substitute fakes.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// The contract-creation record for an address. `NotFound` when the
    /// explorer answers but has no record.
    async fn contract_creation(
        &self,
        address: Address,
        chain: ChainId,
    ) -> Result<CreationRecord, UpstreamError>;

    /// The account's transaction list. An explorer "no transactions found"
    /// answer is an empty list, not an error.
    async fn transactions(
        &self,
        address: Address,
        chain: ChainId,
        order: SortOrder,
    ) -> Result<Vec<TxRecord>, UpstreamError>;
}

pub struct ExplorerClient {
    client: reqwest::Client,
    endpoints: HashMap<ChainId, ExplorerEndpoint>,
}

impl ExplorerClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.explorer_timeout)
            .build()?;

        let endpoints = config
            .chains
            .iter()
            .filter_map(|(chain, cc)| cc.explorer.clone().map(|e| (*chain, e)))
            .collect();

        Ok(ExplorerClient { client, endpoints })
    }

    async fn call(
        &self,
        chain: ChainId,
        params: &[(&str, String)],
    ) -> Result<Envelope, UpstreamError> {
        let Some(endpoint) = self.endpoints.get(&chain) else {
            return Err(UpstreamError::Unavailable(format!(
                "no explorer configured for chain {chain}"
            )));
        };

        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("apikey", endpoint.api_key.clone()));

        let response = self
            .client
            .get(&endpoint.api_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "explorer returned HTTP {}",
                response.status()
            )));
        }

        response
            .json::<Envelope>()
            .await
            .map_err(|e| UpstreamError::Unavailable(format!("malformed explorer payload: {e}")))
    }
}

#[async_trait]
impl ExplorerApi for ExplorerClient {
    async fn contract_creation(
        &self,
        address: Address,
        chain: ChainId,
    ) -> Result<CreationRecord, UpstreamError> {
        let envelope = self
            .call(
                chain,
                &[
                    ("module", "contract".to_string()),
                    ("action", "getcontractcreation".to_string()),
                    ("contractaddresses", format!("{address:#x}")),
                ],
            )
            .await?;

        if envelope.status != "1" {
            if envelope.is_empty_answer() {
                debug!("no creation record for {address} on {chain}");
                return Err(UpstreamError::NotFound);
            }
            return Err(envelope.api_error());
        }

        let records: Vec<CreationRecord> = serde_json::from_value(envelope.result)
            .map_err(|e| UpstreamError::Unavailable(format!("malformed creation record: {e}")))?;
        records.into_iter().next().ok_or(UpstreamError::NotFound)
    }

    async fn transactions(
        &self,
        address: Address,
        chain: ChainId,
        order: SortOrder,
    ) -> Result<Vec<TxRecord>, UpstreamError> {
        let envelope = self
            .call(
                chain,
                &[
                    ("module", "account".to_string()),
                    ("action", "txlist".to_string()),
                    ("address", format!("{address:#x}")),
                    ("sort", order.as_str().to_string()),
                ],
            )
            .await?;

        // Status "0" with an empty array is how the explorer reports an
        // account with no transactions; a string result is an API failure
        // and must degrade the stage, not masquerade as emptiness.
        if envelope.status != "1" {
            if envelope.is_empty_answer() {
                debug!("empty transaction list for {address} on {chain}");
                return Ok(Vec::new());
            }
            return Err(envelope.api_error());
        }

        serde_json::from_value(envelope.result)
            .map_err(|e| UpstreamError::Unavailable(format!("malformed transaction list: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_transaction_records() {
        let payload = json!([{
            "hash": "0xaaa",
            "from": "0x1111111111111111111111111111111111111111",
            "to": "",
            "value": "0",
            "contractAddress": "0x2222222222222222222222222222222222222222",
            "timeStamp": "1700000000",
            "blockNumber": "123",
            "gasUsed": "21000"
        }]);
        let records: Vec<TxRecord> = serde_json::from_value(payload).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].to.is_empty());
        assert_eq!(
            records[0].contract_address,
            "0x2222222222222222222222222222222222222222"
        );
        assert_eq!(records[0].time_stamp, "1700000000");
    }

    #[test]
    fn missing_contract_address_defaults_to_empty() {
        let payload = json!([{
            "hash": "0xbbb",
            "from": "0x1111111111111111111111111111111111111111",
            "to": "0x3333333333333333333333333333333333333333",
            "value": "1000",
            "timeStamp": "1700000001"
        }]);
        let records: Vec<TxRecord> = serde_json::from_value(payload).unwrap();
        assert!(records[0].contract_address.is_empty());
    }

    #[test]
    fn parses_creation_record() {
        let payload = json!([{
            "contractAddress": "0x2222222222222222222222222222222222222222",
            "contractCreator": "0x4444444444444444444444444444444444444444",
            "txHash": "0xccc"
        }]);
        let records: Vec<CreationRecord> = serde_json::from_value(payload).unwrap();
        assert_eq!(
            records[0].contract_creator,
            "0x4444444444444444444444444444444444444444"
        );
        assert_eq!(records[0].tx_hash, "0xccc");
    }

    #[test]
    fn no_transactions_answer_is_empty_not_an_error() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": "0",
            "message": "No transactions found",
            "result": []
        }))
        .unwrap();
        assert!(envelope.is_empty_answer());
    }

    #[test]
    fn rate_limit_answer_is_an_api_error() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }))
        .unwrap();
        assert!(!envelope.is_empty_answer());
        let error = envelope.api_error();
        assert!(matches!(&error, UpstreamError::Unavailable(msg)
            if msg.contains("NOTOK") && msg.contains("Max rate limit reached")));
    }

    /// Serves one request with a fixed 200 JSON response and returns a
    /// config whose Base explorer points at it.
    async fn explorer_config(body: &'static str) -> crate::config::Config {
        use crate::config::{ChainConfig, Config, ExplorerEndpoint};
        use crate::platforms::DetectionPolicy;
        use std::time::Duration;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        Config {
            chains: HashMap::from([(
                ChainId::Base,
                ChainConfig {
                    rpc_url: "http://127.0.0.1:1".to_string(),
                    explorer: Some(ExplorerEndpoint {
                        api_url: format!("http://{addr}/api"),
                        api_key: String::new(),
                    }),
                },
            )]),
            platforms: Vec::new(),
            detection_policy: DetectionPolicy::Exhaustive,
            rpc_timeout: Duration::from_secs(2),
            explorer_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(2),
            probe_concurrency: 2,
            history_limit: 5,
            min_probe_body_bytes: 2,
        }
    }

    #[tokio::test]
    async fn rate_limited_transaction_list_degrades_instead_of_emptying() {
        let config = explorer_config(
            r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#,
        )
        .await;
        let client = ExplorerClient::new(&config).unwrap();
        let address = Address::from([0xDD; 20]);

        let result = client
            .transactions(address, ChainId::Base, SortOrder::Ascending)
            .await;
        assert!(matches!(result, Err(UpstreamError::Unavailable(_))));
    }

    #[tokio::test]
    async fn empty_transaction_list_still_comes_back_ok() {
        let config = explorer_config(
            r#"{"status":"0","message":"No transactions found","result":[]}"#,
        )
        .await;
        let client = ExplorerClient::new(&config).unwrap();
        let address = Address::from([0xDD; 20]);

        let txs = client
            .transactions(address, ChainId::Base, SortOrder::Ascending)
            .await
            .unwrap();
        assert!(txs.is_empty());
    }
}
