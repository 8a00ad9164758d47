use std::fmt;

use ethers::types::Address;
use serde::Serialize;
use tracing::debug;

use crate::abi::{self, TokenCall};
use crate::config::NativeCurrency;
use crate::error::Result;
use crate::provider::ProviderGateway;
use crate::token::ContractDescriptor;
use crate::utils::format_base_units;

/// Last known balance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BalanceState {
    #[default]
    Unknown,
    /// Decimal string produced by a successful refresh.
    Value(String),
    /// The last refresh failed; the previous value is no longer shown.
    Error,
}

impl BalanceState {
    pub fn value(&self) -> Option<&str> {
        match self {
            BalanceState::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for BalanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceState::Unknown => f.write_str("-"),
            BalanceState::Value(v) => f.write_str(v),
            BalanceState::Error => f.write_str("Error"),
        }
    }
}

impl Serialize for BalanceState {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BalanceState::Unknown => s.serialize_none(),
            other => s.serialize_str(&other.to_string()),
        }
    }
}

/// Identifies which account a refresh was issued for.
///
/// The epoch increments on every account change, so a result tagged with
/// an older epoch belongs to an account that is no longer active even if
/// the same address comes back later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTag {
    pub address: Address,
    pub epoch: u64,
}

/// `balanceOf(owner)` formatted with the descriptor's decimals.
pub async fn fetch_token_balance(
    gateway: &ProviderGateway,
    owner: Address,
    descriptor: &ContractDescriptor,
) -> Result<String> {
    let data = gateway
        .call(descriptor.address, TokenCall::BalanceOf(owner).encode())
        .await?;
    let raw = abi::decode_uint(&data)?;
    debug!(owner = %format!("{owner:#x}"), %raw, symbol = %descriptor.symbol, "token balance");
    descriptor.format_amount(raw)
}

/// Native balance formatted with the native currency's decimals.
pub async fn fetch_native_balance(
    gateway: &ProviderGateway,
    owner: Address,
    currency: &NativeCurrency,
) -> Result<String> {
    let raw = gateway.native_balance(owner).await?;
    format_base_units(raw, currency.decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_renders_as_error() {
        assert_eq!(BalanceState::Error.to_string(), "Error");
        assert_eq!(BalanceState::Value("1.000000".into()).to_string(), "1.000000");
    }

    #[test]
    fn test_value_accessor() {
        assert_eq!(BalanceState::Value("2.5".into()).value(), Some("2.5"));
        assert_eq!(BalanceState::Error.value(), None);
        assert_eq!(BalanceState::Unknown.value(), None);
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_value(BalanceState::Unknown).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(BalanceState::Error).unwrap(), "Error");
    }
}
