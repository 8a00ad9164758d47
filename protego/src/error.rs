use ethers::types::{Address, H256};
use thiserror::Error;

use crate::provider::ProviderError;
use crate::tx::OperationKind;

#[derive(Error, Debug)]
pub enum ProtegoError {
    #[error("no injected wallet provider detected")]
    ProviderUnavailable,

    #[error("user rejected the request: {0}")]
    UserRejected(String),

    #[error("wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("manual switch to chain {chain_id} required: {reason}")]
    ManualSwitchRequired { chain_id: u64, reason: String },

    #[error("no contract deployed at address {0:#x}")]
    NoContractAtAddress(Address),

    #[error("RPC error: {message}")]
    Rpc { code: Option<i64>, message: String },

    #[error("transaction {0:#x} reverted")]
    TransactionReverted(H256),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("wallet not connected")]
    NotConnected,

    #[error("token contract not verified")]
    ContractNotVerified,

    #[error("{0} already in flight")]
    OperationInFlight(OperationKind),

    #[error("connection already in progress")]
    ConnectionInProgress,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProtegoError>;

impl ProtegoError {
    /// Short human-readable status line for `Session::last_message`.
    pub fn user_message(&self) -> String {
        match self {
            ProtegoError::ProviderUnavailable => {
                "MetaMask or compatible wallet not detected.".into()
            }
            ProtegoError::UserRejected(_) => "Request was rejected in the wallet.".into(),
            ProtegoError::WrongNetwork { expected, actual } => {
                format!("Wrong network detected (Chain ID: {actual}). Expected chain {expected}.")
            }
            ProtegoError::ManualSwitchRequired { chain_id, .. } => {
                format!("Please manually switch networks (Chain ID: {chain_id}).")
            }
            ProtegoError::NoContractAtAddress(addr) => {
                format!("No contract deployed at address {addr:#x}. Check contract addresses.")
            }
            ProtegoError::Rpc { message, .. } => format!("RPC error: {message}"),
            ProtegoError::TransactionReverted(hash) => {
                format!("Transaction {hash:#x} reverted on-chain.")
            }
            ProtegoError::InsufficientFunds(_) => "Insufficient funds for this transaction.".into(),
            ProtegoError::NotConnected => "Please connect your wallet first.".into(),
            ProtegoError::ContractNotVerified => {
                "Contract not verified. Please reconnect wallet.".into()
            }
            ProtegoError::OperationInFlight(kind) => {
                format!("{kind} already in progress. Please wait.")
            }
            ProtegoError::ConnectionInProgress => "Connection already in progress.".into(),
            ProtegoError::Validation(reason) => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the user may retry the same action without fixing configuration.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ProtegoError::ProviderUnavailable | ProtegoError::NoContractAtAddress(_)
        )
    }
}

impl From<ProviderError> for ProtegoError {
    fn from(e: ProviderError) -> Self {
        if e.is_user_rejection() {
            ProtegoError::UserRejected(e.message)
        } else if e.is_insufficient_funds() {
            ProtegoError::InsufficientFunds(e.message)
        } else {
            ProtegoError::Rpc {
                code: Some(e.code),
                message: e.message,
            }
        }
    }
}

impl From<ethers::abi::Error> for ProtegoError {
    fn from(e: ethers::abi::Error) -> Self {
        ProtegoError::Abi(e.to_string())
    }
}
