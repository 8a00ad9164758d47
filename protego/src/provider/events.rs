use ethers::types::Address;
use serde_json::Value;

use crate::error::{ProtegoError, Result};
use crate::utils::{parse_quantity, quantity_to_u64};

/// Event kinds a session listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AccountsChanged,
    ChainChanged,
}

impl EventKind {
    /// EIP-1193 event name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::AccountsChanged => "accountsChanged",
            EventKind::ChainChanged => "chainChanged",
        }
    }
}

/// Notification emitted by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The exposed accounts changed. Empty means the wallet locked or
    /// revoked access.
    AccountsChanged(Vec<Address>),
    /// The active chain changed.
    ChainChanged(u64),
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProviderEvent::AccountsChanged(_) => EventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => EventKind::ChainChanged,
        }
    }

    /// Build an event from its EIP-1193 name and JSON payload.
    ///
    /// Returns `Ok(None)` for events the session does not track
    /// (`connect`, `disconnect`, `message`).
    pub fn from_eip1193(name: &str, payload: &Value) -> Result<Option<Self>> {
        match name {
            "accountsChanged" => {
                let accounts: Vec<Address> = serde_json::from_value(payload.clone())?;
                Ok(Some(ProviderEvent::AccountsChanged(accounts)))
            }
            "chainChanged" => {
                let chain_id = parse_quantity(payload).and_then(quantity_to_u64)?;
                Ok(Some(ProviderEvent::ChainChanged(chain_id)))
            }
            "connect" | "disconnect" | "message" => Ok(None),
            other => Err(ProtegoError::Validation(format!("unknown provider event {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chain_changed_from_hex() {
        let event = ProviderEvent::from_eip1193("chainChanged", &json!("0x530")).unwrap();
        assert_eq!(event, Some(ProviderEvent::ChainChanged(1328)));
    }

    #[test]
    fn test_accounts_changed_empty() {
        let event = ProviderEvent::from_eip1193("accountsChanged", &json!([])).unwrap();
        assert_eq!(event, Some(ProviderEvent::AccountsChanged(vec![])));
    }

    #[test]
    fn test_untracked_events_ignored() {
        assert_eq!(ProviderEvent::from_eip1193("disconnect", &json!({})).unwrap(), None);
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(ProviderEvent::from_eip1193("bogus", &json!(null)).is_err());
    }
}
