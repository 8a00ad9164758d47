use tracing::{info, warn};

use crate::config::ChainConfig;
use crate::error::{ProtegoError, Result};
use crate::provider::ProviderGateway;

/// How `ensure_chain` reached the required chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSwitch {
    /// Already on the chain; no request was sent.
    AlreadyActive,
    /// A single switch request succeeded.
    Switched,
    /// The wallet did not know the chain; it was registered, then switched.
    Registered,
}

/// Make sure the wallet is on `chain`.
///
/// A failed switch other than "unrecognized chain" is not retried and
/// surfaces as `ManualSwitchRequired`. After `Switched` or `Registered` the
/// caller should treat any cached network state as stale.
pub async fn ensure_chain(gateway: &ProviderGateway, chain: &ChainConfig) -> Result<ChainSwitch> {
    let current = gateway.chain_id().await?;
    if current == chain.chain_id {
        return Ok(ChainSwitch::AlreadyActive);
    }
    info!(current, required = chain.chain_id, "switching chain");

    let outcome = match gateway.switch_chain(chain.chain_id).await {
        Ok(()) => ChainSwitch::Switched,
        Err(e) if e.is_unrecognized_chain() => {
            info!(chain_id = chain.chain_id, name = %chain.name, "chain unknown to wallet, registering");
            gateway
                .add_chain(chain)
                .await
                .map_err(|e| manual_switch(chain, e.to_string()))?;
            gateway
                .switch_chain(chain.chain_id)
                .await
                .map_err(|e| manual_switch(chain, e.to_string()))?;
            ChainSwitch::Registered
        }
        Err(e) if e.is_user_rejection() => {
            return Err(manual_switch(chain, format!("switch rejected: {}", e.message)));
        }
        Err(e) => return Err(manual_switch(chain, e.to_string())),
    };

    let actual = gateway.chain_id().await?;
    if actual != chain.chain_id {
        return Err(ProtegoError::WrongNetwork {
            expected: chain.chain_id,
            actual,
        });
    }
    Ok(outcome)
}

fn manual_switch(chain: &ChainConfig, reason: String) -> ProtegoError {
    warn!(chain_id = chain.chain_id, %reason, "automatic chain switch failed");
    ProtegoError::ManualSwitchRequired {
        chain_id: chain.chain_id,
        reason,
    }
}
