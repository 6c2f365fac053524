//! Ledger node HTTP client.
//!
//! # Responsibilities
//! - Talk to a node's JSON command API
//! - Query node info for readiness checks
//! - Run the transfer pipeline: tips → remote proof of work → store → broadcast

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::schema::LedgerConfig;
use crate::ledger::bundle::{self, TransactionTrytes};
use crate::ledger::types::{LedgerError, LedgerResult, NodeInfo, SentTransaction, Transfer};

/// Header every node command must carry.
pub const API_VERSION_HEADER: &str = "X-IOTA-API-Version";

/// Operations the bridge needs from a ledger network.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Lightweight reachability query.
    async fn node_info(&self) -> LedgerResult<NodeInfo>;

    /// Prepare, attach, store and broadcast `transfers` as one bundle.
    ///
    /// Returned transactions are ordered tail first.
    async fn send_transfer(
        &self,
        seed: &str,
        depth: u32,
        min_weight_magnitude: u32,
        transfers: &[Transfer],
    ) -> LedgerResult<Vec<SentTransaction>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TipsResponse {
    trunk_transaction: String,
    branch_transaction: String,
}

#[derive(Debug, Deserialize)]
struct TrytesResponse {
    trytes: Vec<String>,
}

/// HTTP client for a single ledger node.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl NodeClient {
    /// Create a client for the node at `config.host:config.port`.
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        let mut endpoint = url::Url::parse(&config.host).map_err(|e| LedgerError::InvalidUrl {
            url: config.host.clone(),
            reason: e.to_string(),
        })?;
        endpoint
            .set_port(Some(config.port))
            .map_err(|_| LedgerError::InvalidUrl {
                url: config.host.clone(),
                reason: "cannot carry a port".to_string(),
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        tracing::debug!(endpoint = %endpoint, "Ledger node client initialized");
        Ok(Self { http, endpoint })
    }

    /// The node URL commands are posted to.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    async fn command<T: DeserializeOwned>(&self, body: Value) -> LedgerResult<T> {
        let command = body["command"].as_str().unwrap_or("unknown").to_string();
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(API_VERSION_HEADER, "1")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text);
            tracing::debug!(command = %command, status = status.as_u16(), error = %message, "Node command rejected");
            return Err(LedgerError::Node {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("{}: {}", command, e)))
    }

    async fn transactions_to_approve(&self, depth: u32) -> LedgerResult<TipsResponse> {
        self.command(json!({ "command": "getTransactionsToApprove", "depth": depth }))
            .await
    }

    async fn attach_to_tangle(
        &self,
        tips: &TipsResponse,
        min_weight_magnitude: u32,
        trytes: Vec<String>,
    ) -> LedgerResult<Vec<String>> {
        let response: TrytesResponse = self
            .command(json!({
                "command": "attachToTangle",
                "trunkTransaction": tips.trunk_transaction,
                "branchTransaction": tips.branch_transaction,
                "minWeightMagnitude": min_weight_magnitude,
                "trytes": trytes,
            }))
            .await?;
        Ok(response.trytes)
    }

    async fn store_transactions(&self, trytes: &[String]) -> LedgerResult<()> {
        self.command::<Value>(json!({ "command": "storeTransactions", "trytes": trytes }))
            .await
            .map(|_| ())
    }

    async fn broadcast_transactions(&self, trytes: &[String]) -> LedgerResult<()> {
        self.command::<Value>(json!({ "command": "broadcastTransactions", "trytes": trytes }))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl LedgerApi for NodeClient {
    async fn node_info(&self) -> LedgerResult<NodeInfo> {
        self.command(json!({ "command": "getNodeInfo" })).await
    }

    async fn send_transfer(
        &self,
        _seed: &str,
        depth: u32,
        min_weight_magnitude: u32,
        transfers: &[Transfer],
    ) -> LedgerResult<Vec<SentTransaction>> {
        // Zero-value bundles spend no inputs, so the seed signs nothing.
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let prepared = bundle::prepare_transfers(transfers, timestamp)?;

        let tips = self.transactions_to_approve(depth).await?;
        let attached = self
            .attach_to_tangle(&tips, min_weight_magnitude, prepared)
            .await?;
        if attached.is_empty() {
            return Err(LedgerError::EmptyAttachment);
        }

        self.store_transactions(&attached).await?;
        self.broadcast_transactions(&attached).await?;

        sent_transactions(attached)
    }
}

/// The `error` or `exception` field of a JSON error body, else the raw text.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|payload| {
        payload
            .get("error")
            .or_else(|| payload.get("exception"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "no error message".to_string(),
        None => body.trim().to_string(),
    }
}

/// Hash attached trytes and order them tail first.
pub fn sent_transactions(attached: Vec<String>) -> LedgerResult<Vec<SentTransaction>> {
    let mut sent = attached
        .into_iter()
        .map(|trytes| {
            let view = TransactionTrytes::parse(&trytes)?;
            Ok(SentTransaction {
                hash: view.hash(),
                current_index: view.current_index(),
                trytes: trytes.clone(),
            })
        })
        .collect::<LedgerResult<Vec<_>>>()?;
    sent.sort_by_key(|tx| tx.current_index);
    Ok(sent)
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}
