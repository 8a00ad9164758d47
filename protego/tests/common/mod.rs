//! In-memory wallet used by the controller tests.
//!
//! Answers the EIP-1193 methods the controller uses from a scripted chain
//! state, records every request, and can hold selected requests open until
//! the test releases them.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use serde_json::{json, Value};
use tokio::sync::{broadcast, Notify};

use protego::abi::{self, TokenCall, VaultCall};
use protego::config::{testnet_config, ProtegoConfig};
use protego::provider::{ProviderError, WalletProvider};
use protego::ProviderEvent;

pub const TOKEN_DECIMALS: u8 = 6;

/// A request held open until `release` is notified.
#[derive(Clone)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[derive(Default)]
struct MockState {
    accounts: Vec<Address>,
    chain_id: u64,
    known_chains: HashSet<u64>,
    code: HashMap<Address, Bytes>,
    token: Address,
    vault: Address,
    decimals: u8,
    vault_decimals: u8,
    token_balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    vault_shares: HashMap<Address, U256>,
    native_balances: HashMap<Address, U256>,
    rejected: HashSet<String>,
    switch_error: Option<ProviderError>,
    revert_transactions: bool,
    pending_polls: u32,
    next_tx: u64,
    sent: Vec<Value>,
    added_chains: Vec<Value>,
    gates: HashMap<String, Gate>,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    log: Mutex<Vec<(String, Value)>>,
    events_tx: broadcast::Sender<ProviderEvent>,
}

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Testnet config with a fast receipt poll.
pub fn test_config() -> ProtegoConfig {
    let mut config = testnet_config().unwrap();
    config.receipt_poll_interval = Duration::from_millis(1);
    config
}

impl MockWallet {
    /// Wallet on `chain_id` holding `accounts`, with the token and vault of
    /// [`test_config`] deployed. Only `chain_id` is known to the wallet.
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Arc<Self> {
        let config = test_config();
        let (events_tx, _) = broadcast::channel(16);
        let mut state = MockState {
            accounts,
            chain_id,
            token: config.token_address,
            vault: config.vault_address,
            decimals: TOKEN_DECIMALS,
            vault_decimals: TOKEN_DECIMALS,
            ..MockState::default()
        };
        state.known_chains.insert(chain_id);
        state
            .code
            .insert(config.token_address, Bytes::from(vec![0x60, 0x80, 0x60, 0x40]));
        state
            .code
            .insert(config.vault_address, Bytes::from(vec![0x60, 0x80, 0x60, 0x40]));
        Arc::new(Self {
            state: Mutex::new(state),
            log: Mutex::new(Vec::new()),
            events_tx,
        })
    }

    /// Single account already on Sei Testnet.
    pub fn ready(address: Address) -> Arc<Self> {
        Self::new(vec![address], 1328)
    }

    // --- scripting ---

    pub fn set_token_balance(&self, owner: Address, amount: U256) {
        self.state.lock().unwrap().token_balances.insert(owner, amount);
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.state.lock().unwrap().native_balances.insert(owner, amount);
    }

    pub fn set_vault_shares(&self, owner: Address, shares: U256) {
        self.state.lock().unwrap().vault_shares.insert(owner, shares);
    }

    pub fn set_decimals(&self, decimals: u8) {
        self.state.lock().unwrap().decimals = decimals;
    }

    pub fn set_vault_decimals(&self, decimals: u8) {
        self.state.lock().unwrap().vault_decimals = decimals;
    }

    pub fn remove_code(&self, address: Address) {
        self.state.lock().unwrap().code.remove(&address);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn reject(&self, method: &str) {
        self.state.lock().unwrap().rejected.insert(method.to_string());
    }

    pub fn accept(&self, method: &str) {
        self.state.lock().unwrap().rejected.remove(method);
    }

    pub fn fail_switch_with(&self, error: ProviderError) {
        self.state.lock().unwrap().switch_error = Some(error);
    }

    pub fn revert_transactions(&self) {
        self.state.lock().unwrap().revert_transactions = true;
    }

    /// Report each receipt as pending for `polls` polls first.
    pub fn delay_receipts(&self, polls: u32) {
        self.state.lock().unwrap().pending_polls = polls;
    }

    /// Hold the next request matching `key` open. Keys are method names, or
    /// `balanceOf:<address>` for a token balance read.
    pub fn gate(&self, key: &str) -> Gate {
        let gate = Gate::new();
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(key.to_string(), gate.clone());
        gate
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events_tx.send(event);
    }

    // --- inspection ---

    pub fn chain_id(&self) -> u64 {
        self.state.lock().unwrap().chain_id
    }

    pub fn count(&self, method: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|(m, _)| m == method).count()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn methods(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn sent_transactions(&self) -> Vec<Value> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn added_chains(&self) -> Vec<Value> {
        self.state.lock().unwrap().added_chains.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.events_tx.receiver_count()
    }

    // --- request handling ---

    fn gate_key(method: &str, params: &Value) -> String {
        if method == "eth_call" {
            if let Some(data) = params[0]["data"].as_str().and_then(|d| decode(d).ok()) {
                if let Ok(TokenCall::BalanceOf(owner)) = TokenCall::decode(&data) {
                    return format!("balanceOf:{owner:#x}");
                }
            }
        }
        method.to_string()
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let mut s = self.state.lock().unwrap();
        if s.rejected.contains(method) {
            return Err(ProviderError::new(4001, "User rejected the request."));
        }
        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(s.accounts)),
            "eth_chainId" => Ok(json!(format!("0x{:x}", s.chain_id))),
            "eth_getBalance" => {
                let owner = param_address(&params[0])?;
                let balance = s.native_balances.get(&owner).copied().unwrap_or_default();
                Ok(json!(format!("0x{balance:x}")))
            }
            "eth_getCode" => {
                let address = param_address(&params[0])?;
                let code = s.code.get(&address).cloned().unwrap_or_default();
                Ok(json!(format!("0x{}", hex::encode(&code))))
            }
            "eth_call" => {
                let to = param_address(&params[0]["to"])?;
                let data = decode(params[0]["data"].as_str().unwrap_or("0x"))?;
                let out = if to == s.token {
                    match TokenCall::decode(&data).map_err(invalid)? {
                        TokenCall::Decimals => abi::encode_uint(U256::from(s.decimals)),
                        TokenCall::Symbol => abi::encode_string("USDC"),
                        TokenCall::Name => abi::encode_string("Mock USDC"),
                        TokenCall::TotalSupply => abi::encode_uint(U256::exp10(15)),
                        TokenCall::BalanceOf(owner) => abi::encode_uint(
                            s.token_balances.get(&owner).copied().unwrap_or_default(),
                        ),
                        TokenCall::Allowance { owner, spender } => abi::encode_uint(
                            s.allowances.get(&(owner, spender)).copied().unwrap_or_default(),
                        ),
                        TokenCall::Approve { .. } => abi::encode_uint(U256::one()),
                    }
                } else if to == s.vault {
                    match VaultCall::decode(&data).map_err(invalid)? {
                        VaultCall::Decimals => abi::encode_uint(U256::from(s.vault_decimals)),
                        VaultCall::BalanceOf(owner) => abi::encode_uint(
                            s.vault_shares.get(&owner).copied().unwrap_or_default(),
                        ),
                        _ => return Err(ProviderError::new(-32000, "execution reverted")),
                    }
                } else {
                    Bytes::default()
                };
                Ok(json!(format!("0x{}", hex::encode(&out))))
            }
            "eth_sendTransaction" => {
                s.next_tx += 1;
                let hash = H256::from_low_u64_be(s.next_tx);
                let tx = params[0].clone();
                // Apply approvals so later allowance reads see them.
                let to = param_address(&tx["to"])?;
                let from = param_address(&tx["from"])?;
                let data = decode(tx["data"].as_str().unwrap_or("0x"))?;
                if to == s.token {
                    if let Ok(TokenCall::Approve { spender, amount }) = TokenCall::decode(&data) {
                        s.allowances.insert((from, spender), amount);
                    }
                }
                s.sent.push(tx);
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                if s.pending_polls > 0 {
                    s.pending_polls -= 1;
                    return Ok(Value::Null);
                }
                let status = if s.revert_transactions { "0x0" } else { "0x1" };
                Ok(json!({
                    "transactionHash": params[0],
                    "blockNumber": "0x10",
                    "gasUsed": "0x5208",
                    "status": status,
                }))
            }
            "wallet_switchEthereumChain" => {
                if let Some(error) = s.switch_error.clone() {
                    return Err(error);
                }
                let chain_id = param_chain_id(&params[0]["chainId"])?;
                if !s.known_chains.contains(&chain_id) {
                    return Err(ProviderError::new(
                        4902,
                        format!("Unrecognized chain ID \"0x{chain_id:x}\"."),
                    ));
                }
                s.chain_id = chain_id;
                drop(s);
                self.emit(ProviderEvent::ChainChanged(chain_id));
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let chain_id = param_chain_id(&params[0]["chainId"])?;
                s.known_chains.insert(chain_id);
                s.added_chains.push(params[0].clone());
                Ok(Value::Null)
            }
            other => Err(ProviderError::new(-32601, format!("method {other} not supported"))),
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.log
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        let key = Self::gate_key(method, &params);
        let gate = self.state.lock().unwrap().gates.remove(&key);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.answer(method, &params)
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events_tx.subscribe()
    }
}

fn invalid(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::new(-32602, format!("invalid params: {e}"))
}

fn decode(data: &str) -> Result<Vec<u8>, ProviderError> {
    hex::decode(data.trim_start_matches("0x")).map_err(invalid)
}

fn param_address(value: &Value) -> Result<Address, ProviderError> {
    serde_json::from_value(value.clone()).map_err(invalid)
}

fn param_chain_id(value: &Value) -> Result<u64, ProviderError> {
    let s = value.as_str().ok_or_else(|| invalid("chainId must be a string"))?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(invalid)
}
