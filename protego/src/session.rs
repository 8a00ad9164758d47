use ethers::types::Address;
use serde::Serialize;

use crate::balance::BalanceState;
use crate::utils::short_address;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Snapshot of the wallet session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    /// Token balance, formatted with the token's decimals.
    pub balance: BalanceState,
    /// Native balance, formatted with the native currency's decimals.
    pub native_balance: BalanceState,
    pub last_message: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.address.is_some()
    }

    pub fn connecting(&mut self) {
        self.status = ConnectionStatus::Connecting;
        self.last_message = "Connecting to wallet...".into();
    }

    pub fn connected(&mut self, address: Address, chain_id: u64, chain_name: &str) {
        self.status = ConnectionStatus::Connected;
        self.address = Some(address);
        self.chain_id = Some(chain_id);
        self.last_message = format!("Connected to {chain_name} | {}", short_address(&address));
    }

    pub fn failed(&mut self, message: impl Into<String>) {
        self.status = ConnectionStatus::Error;
        self.last_message = message.into();
    }

    /// Forget the account. `message` becomes the status line.
    pub fn clear(&mut self, message: impl Into<String>) {
        *self = Session {
            last_message: message.into(),
            ..Session::default()
        };
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.last_message = message.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_disconnected() {
        let s = Session::new();
        assert_eq!(s.status, ConnectionStatus::Disconnected);
        assert!(!s.is_connected());
        assert_eq!(s.balance, BalanceState::Unknown);
    }

    #[test]
    fn test_connected_message_shortens_address() {
        let mut s = Session::new();
        let addr: Address = "0xabcd00000000000000000000000000000000a234".parse().unwrap();
        s.connecting();
        assert_eq!(s.status, ConnectionStatus::Connecting);
        s.connected(addr, 1328, "Sei Testnet");
        assert!(s.is_connected());
        assert_eq!(s.last_message, "Connected to Sei Testnet | 0xabcd...a234");
    }

    #[test]
    fn test_clear_resets_everything_but_message() {
        let mut s = Session::new();
        s.connected(Address::repeat_byte(1), 1328, "Sei Testnet");
        s.balance = BalanceState::Value("1.0".into());
        s.clear("Wallet disconnected");
        assert_eq!(s.status, ConnectionStatus::Disconnected);
        assert_eq!(s.address, None);
        assert_eq!(s.chain_id, None);
        assert_eq!(s.balance, BalanceState::Unknown);
        assert_eq!(s.last_message, "Wallet disconnected");
    }

    #[test]
    fn test_failed_sets_error_status() {
        let mut s = Session::new();
        s.failed("boom");
        assert_eq!(s.status, ConnectionStatus::Error);
        assert_eq!(s.last_message, "boom");
    }

    #[test]
    fn test_serialize_camel_case() {
        let json = serde_json::to_value(Session::new()).unwrap();
        assert_eq!(json["status"], "disconnected");
        assert!(json.get("lastMessage").is_some());
        assert!(json.get("nativeBalance").is_some());
    }
}
