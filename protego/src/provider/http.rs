use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::Address;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::events::ProviderEvent;
use super::{ProviderError, WalletProvider, METHOD_NOT_FOUND};
use crate::utils::{parse_quantity, quantity_to_u64};

/// Error code used for transport failures (connection refused, bad body).
pub const TRANSPORT_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderError>,
}

/// Wallet provider speaking JSON-RPC 2.0 over HTTP.
///
/// Intended for a node that holds unlocked accounts (a local devnet or a
/// signer proxy). Since HTTP has no push channel, events are derived from
/// responses: a successful chain switch emits `ChainChanged` and a change in
/// the reported account list emits `AccountsChanged`.
#[derive(Debug)]
pub struct HttpProvider {
    client: Client,
    url: String,
    next_id: AtomicU64,
    events_tx: broadcast::Sender<ProviderEvent>,
    last_accounts: Mutex<Option<Vec<Address>>>,
}

impl HttpProvider {
    pub fn new(url: &str) -> Self {
        let (events_tx, _) = broadcast::channel(64);
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            next_id: AtomicU64::new(1),
            events_tx,
            last_accounts: Mutex::new(None),
        }
    }

    /// Number of live event subscriptions.
    pub fn listener_count(&self) -> usize {
        self.events_tx.receiver_count()
    }

    /// POST one JSON-RPC call.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(TRANSPORT_ERROR, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                TRANSPORT_ERROR,
                format!("HTTP {status}: {text}"),
            ));
        }

        let parsed: RpcResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::new(TRANSPORT_ERROR, format!("invalid response: {e}")))?;

        match (parsed.result, parsed.error) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }

    fn note_accounts(&self, value: &Value) {
        let Ok(accounts) = serde_json::from_value::<Vec<Address>>(value.clone()) else {
            return;
        };
        let Ok(mut last) = self.last_accounts.lock() else {
            return;
        };
        let changed = last.as_ref().is_some_and(|prev| *prev != accounts);
        *last = Some(accounts.clone());
        drop(last);
        if changed {
            debug!(count = accounts.len(), "account list changed");
            let _ = self.events_tx.send(ProviderEvent::AccountsChanged(accounts));
        }
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            "eth_requestAccounts" => {
                let value = match self.call(method, params.clone()).await {
                    Err(e) if e.code == METHOD_NOT_FOUND => {
                        debug!("node lacks eth_requestAccounts, using eth_accounts");
                        self.call("eth_accounts", params).await?
                    }
                    other => other?,
                };
                self.note_accounts(&value);
                Ok(value)
            }
            "eth_accounts" => {
                let value = self.call(method, params).await?;
                self.note_accounts(&value);
                Ok(value)
            }
            "wallet_switchEthereumChain" => {
                let value = self.call(method, params.clone()).await?;
                let chain_id = params
                    .get(0)
                    .and_then(|p| p.get("chainId"))
                    .and_then(|v| parse_quantity(v).and_then(quantity_to_u64).ok());
                if let Some(chain_id) = chain_id {
                    info!(chain_id, "chain switched");
                    let _ = self.events_tx.send(ProviderEvent::ChainChanged(chain_id));
                }
                Ok(value)
            }
            _ => self.call(method, params).await,
        }
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events_tx.subscribe()
    }
}
