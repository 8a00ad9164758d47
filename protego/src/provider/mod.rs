pub mod events;
pub mod http;
pub mod subscriber;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::ChainConfig;
use crate::error::{ProtegoError, Result};
use crate::utils::{decode_hex, parse_quantity, quantity_to_u64};

use events::{EventKind, ProviderEvent};
use subscriber::EventSubscription;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// EIP-3326: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC: method does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Error object returned by a wallet provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN
    }

    pub fn is_insufficient_funds(&self) -> bool {
        self.message.to_lowercase().contains("insufficient funds")
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ProviderError {}

/// An injected wallet: request/response plus event notifications.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Send one request (`eth_requestAccounts`, `eth_call`, ...).
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError>;

    /// Receive every event the wallet emits from now on.
    fn events(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Transaction receipt fields the orchestrator cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    /// `false` when the transaction reverted.
    pub success: bool,
}

/// Transaction handed to the wallet for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub gas: u64,
}

/// Typed access to a [`WalletProvider`].
#[derive(Clone)]
pub struct ProviderGateway {
    provider: Arc<dyn WalletProvider>,
}

impl fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderGateway").finish_non_exhaustive()
    }
}

impl ProviderGateway {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    async fn raw(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        debug!(method, %params, "provider request");
        let result = self.provider.request(method, params).await;
        match &result {
            Ok(value) => debug!(method, %value, "provider response"),
            Err(e) => debug!(method, code = e.code, message = %e.message, "provider error"),
        }
        result
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value> {
        self.raw(method, params).await.map_err(ProtegoError::from)
    }

    /// `eth_requestAccounts`. An empty list counts as a rejection.
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        let value = self.send("eth_requestAccounts", json!([])).await?;
        let accounts: Vec<Address> = serde_json::from_value(value)?;
        if accounts.is_empty() {
            return Err(ProtegoError::UserRejected("wallet returned no accounts".into()));
        }
        Ok(accounts)
    }

    /// `eth_chainId`.
    pub async fn chain_id(&self) -> Result<u64> {
        let value = self.send("eth_chainId", json!([])).await?;
        parse_quantity(&value).and_then(quantity_to_u64)
    }

    /// `eth_getBalance` for the native currency, in wei.
    pub async fn native_balance(&self, address: Address) -> Result<U256> {
        let value = self
            .send("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity(&value)
    }

    /// `eth_getCode`; empty when nothing is deployed at `address`.
    pub async fn get_code(&self, address: Address) -> Result<Bytes> {
        let value = self.send("eth_getCode", json!([address, "latest"])).await?;
        hex_bytes(&value)
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let value = self
            .send(
                "eth_call",
                json!([{ "to": to, "data": format!("0x{}", hex::encode(&data)) }, "latest"]),
            )
            .await?;
        hex_bytes(&value)
    }

    /// `eth_sendTransaction`; the wallet signs and broadcasts.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<H256> {
        let value = self
            .send(
                "eth_sendTransaction",
                json!([{
                    "from": tx.from,
                    "to": tx.to,
                    "data": format!("0x{}", hex::encode(&tx.data)),
                    "gas": format!("0x{:x}", tx.gas),
                }]),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    pub async fn transaction_receipt(&self, hash: H256) -> Result<Option<Receipt>> {
        let value = self.send("eth_getTransactionReceipt", json!([hash])).await?;
        if value.is_null() {
            return Ok(None);
        }
        let status = value
            .get("status")
            .filter(|v| !v.is_null())
            .map(parse_quantity)
            .transpose()?
            .unwrap_or_else(U256::one);
        let block_number = value
            .get("blockNumber")
            .filter(|v| !v.is_null())
            .map(|v| parse_quantity(v).and_then(quantity_to_u64))
            .transpose()?;
        let gas_used = value
            .get("gasUsed")
            .filter(|v| !v.is_null())
            .map(parse_quantity)
            .transpose()?;
        Ok(Some(Receipt {
            transaction_hash: hash,
            block_number,
            gas_used,
            success: !status.is_zero(),
        }))
    }

    /// `wallet_switchEthereumChain`. Errors are returned unmapped so the
    /// caller can tell an unknown chain apart from other failures.
    pub async fn switch_chain(&self, chain_id: u64) -> std::result::Result<(), ProviderError> {
        self.raw(
            "wallet_switchEthereumChain",
            json!([{ "chainId": format!("0x{chain_id:x}") }]),
        )
        .await
        .map(|_| ())
    }

    /// `wallet_addEthereumChain` with the chain's display metadata.
    pub async fn add_chain(&self, chain: &ChainConfig) -> Result<()> {
        self.send(
            "wallet_addEthereumChain",
            json!([{
                "chainId": chain.hex_chain_id(),
                "chainName": chain.name,
                "nativeCurrency": {
                    "name": chain.native_currency.name,
                    "symbol": chain.native_currency.symbol,
                    "decimals": chain.native_currency.decimals,
                },
                "rpcUrls": [chain.rpc_url],
                "blockExplorerUrls": [chain.block_explorer],
            }]),
        )
        .await
        .map(|_| ())
    }

    /// Subscribe to the given event kinds. Dropping the handle unsubscribes.
    pub fn subscribe(&self, kinds: &[EventKind]) -> EventSubscription {
        EventSubscription::new(self.provider.events(), kinds)
    }
}

fn hex_bytes(value: &Value) -> Result<Bytes> {
    let s = value.as_str().ok_or_else(|| ProtegoError::Rpc {
        code: None,
        message: format!("expected hex string, got {value}"),
    })?;
    Ok(Bytes::from(decode_hex(s)?))
}
