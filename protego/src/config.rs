use std::time::Duration;

use ethers::types::Address;
use url::Url;

use crate::error::{ProtegoError, Result};

/// Deployed MockUSDC token on Sei Testnet.
pub const TESTNET_TOKEN_ADDRESS: &str = "0xa4b3Cd6AF5faA2800df38c64e1C24BEBb5291fD6";
/// Deployed yield vault core on Sei Testnet.
pub const TESTNET_VAULT_ADDRESS: &str = "0xf575eE8F71ac2A1A55B2C0B5e5D7d15d73626242";
/// Default analysis backend when `SEI_MCP_SERVER_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Native currency metadata sent with a chain-registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything the wallet needs to know to switch to (or register) a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// Display name shown by the wallet (e.g. `Sei Testnet`).
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    pub block_explorer: String,
}

impl ChainConfig {
    /// Chain id in the `0x`-prefixed hex form wallets expect.
    pub fn hex_chain_id(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// Check that the RPC and explorer URLs parse.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [("rpc url", &self.rpc_url), ("block explorer", &self.block_explorer)] {
            Url::parse(value)
                .map_err(|e| ProtegoError::Validation(format!("invalid {label} {value:?}: {e}")))?;
        }
        Ok(())
    }
}

/// Sei Testnet (chain 1328).
pub fn sei_testnet() -> ChainConfig {
    ChainConfig {
        chain_id: 1328,
        name: "Sei Testnet".into(),
        native_currency: NativeCurrency {
            name: "SEI".into(),
            symbol: "SEI".into(),
            decimals: 18,
        },
        rpc_url: "https://evm-rpc-testnet.sei-apis.com".into(),
        block_explorer: "https://seitrace.com".into(),
    }
}

/// Configuration for the wallet session controller.
#[derive(Debug, Clone)]
pub struct ProtegoConfig {
    /// Chain the session must be on before any contract call.
    pub chain: ChainConfig,
    /// ERC-20 token deposited into the vault.
    pub token_address: Address,
    /// Vault contract receiving deposits.
    pub vault_address: Address,
    /// Delay between `eth_getTransactionReceipt` polls.
    pub receipt_poll_interval: Duration,
}

/// Configuration for the deployed Sei Testnet contracts.
pub fn testnet_config() -> Result<ProtegoConfig> {
    Ok(ProtegoConfig {
        chain: sei_testnet(),
        token_address: parse_address(TESTNET_TOKEN_ADDRESS)?,
        vault_address: parse_address(TESTNET_VAULT_ADDRESS)?,
        receipt_poll_interval: Duration::from_secs(1),
    })
}

/// Configuration for an HTTP backend (analysis server or chat API).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub server_url: String,
    /// Sent as `Authorization: Bearer <key>` when present.
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_BACKEND_URL.into(),
            api_key: None,
        }
    }
}

/// Parse a `0x`-prefixed hex address.
pub fn parse_address(value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| ProtegoError::Validation(format!("invalid address {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sei_testnet_hex_chain_id() {
        assert_eq!(sei_testnet().hex_chain_id(), "0x530");
    }

    #[test]
    fn test_sei_testnet_urls_validate() {
        assert!(sei_testnet().validate().is_ok());
    }

    #[test]
    fn test_invalid_rpc_url_rejected() {
        let mut chain = sei_testnet();
        chain.rpc_url = "not a url".into();
        assert!(matches!(chain.validate(), Err(ProtegoError::Validation(_))));
    }

    #[test]
    fn test_testnet_config_addresses() {
        let config = testnet_config().unwrap();
        assert_eq!(
            format!("{:#x}", config.token_address),
            TESTNET_TOKEN_ADDRESS.to_lowercase()
        );
        assert_eq!(config.chain.chain_id, 1328);
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("hello").is_err());
    }
}
