use protego::config::{parse_address, testnet_config};
use protego::{BackendConfig, ProtegoConfig};
use url::Url;

use crate::error::CliError;

/// Everything the binary needs, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// JSON-RPC endpoint acting as the wallet.
    pub rpc_url: String,
    pub wallet: ProtegoConfig,
    /// Analysis server (threats, social alerts, contract analysis).
    pub analysis: BackendConfig,
    /// Chat API; shares the analysis server unless `PROTEGO_CHAT_URL` is set.
    pub chat: BackendConfig,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, CliError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`; unset or blank keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut wallet = testnet_config()?;
        if let Some(addr) = get("PROTEGO_TOKEN_ADDRESS") {
            wallet.token_address = parse_address(&addr)?;
        }
        if let Some(addr) = get("PROTEGO_VAULT_ADDRESS") {
            wallet.vault_address = parse_address(&addr)?;
        }
        let rpc_url = match get("PROTEGO_RPC_URL") {
            Some(url) => check_url("PROTEGO_RPC_URL", url)?,
            None => wallet.chain.rpc_url.clone(),
        };

        let mut analysis = BackendConfig::default();
        if let Some(url) = get("SEI_MCP_SERVER_URL") {
            analysis.server_url = check_url("SEI_MCP_SERVER_URL", url)?;
        }
        analysis.api_key = get("SEI_MCP_API_KEY");

        let chat = match get("PROTEGO_CHAT_URL") {
            Some(url) => BackendConfig {
                server_url: check_url("PROTEGO_CHAT_URL", url)?,
                api_key: None,
            },
            None => analysis.clone(),
        };

        Ok(Self {
            rpc_url,
            wallet,
            analysis,
            chat,
        })
    }
}

fn check_url(name: &'static str, value: String) -> Result<String, CliError> {
    Url::parse(&value).map_err(|e| CliError::Config {
        name,
        reason: format!("{value:?}: {e}"),
    })?;
    Ok(value)
}
