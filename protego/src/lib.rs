pub mod abi;
pub mod actions;
pub mod balance;
pub mod config;
pub mod controller;
pub mod error;
pub mod network;
pub mod provider;
pub mod rest;
pub mod session;
pub mod token;
pub mod tx;
pub mod types;
pub mod utils;

// ---- Top-level re-exports for ergonomic usage ----

// Controller + config
pub use config::{BackendConfig, ChainConfig, NativeCurrency, ProtegoConfig};
pub use controller::WalletController;
pub use error::{ProtegoError, Result};

// Wallet provider
pub use provider::events::{EventKind, ProviderEvent};
pub use provider::http::HttpProvider;
pub use provider::subscriber::EventSubscription;
pub use provider::{ProviderError, ProviderGateway, Receipt, TransactionRequest, WalletProvider};

// Session, balances, operations
pub use balance::BalanceState;
pub use network::ChainSwitch;
pub use session::{ConnectionStatus, Session};
pub use token::ContractDescriptor;
pub use tx::{OperationKind, OperationStatus, PendingOperation};

// Dashboard hooks
pub use actions::{DashboardAction, Strategy};

// Backend client
pub use rest::ApiClient;
pub use types::{ChatSession, MonitorRequest, Platform, Severity, SocialAlert, Threat};
