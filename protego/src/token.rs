use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::abi::{self, TokenCall};
use crate::error::{ProtegoError, Result};
use crate::provider::ProviderGateway;
use crate::utils::{format_base_units, to_base_units};

/// Token metadata read from chain during verification.
///
/// Every amount conversion for the token goes through this value so the
/// decimals in use are always the ones the contract reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDescriptor {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(serialize_with = "serialize_u256")]
    pub total_supply: U256,
}

impl ContractDescriptor {
    /// Base units to a decimal string with `decimals` fractional digits.
    pub fn format_amount(&self, amount: U256) -> Result<String> {
        format_base_units(amount, self.decimals)
    }

    /// Decimal amount to base units.
    pub fn parse_amount(&self, amount: Decimal) -> Result<U256> {
        to_base_units(amount, self.decimals)
    }
}

fn serialize_u256<S: serde::Serializer>(value: &U256, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

/// Confirm a token contract exists at `address` and read its metadata.
///
/// # Errors
///
/// `NoContractAtAddress` when the account has no code, `Rpc`/`Abi` when any
/// metadata read fails.
pub async fn verify(gateway: &ProviderGateway, address: Address) -> Result<ContractDescriptor> {
    let code = gateway.get_code(address).await?;
    if code.is_empty() {
        return Err(ProtegoError::NoContractAtAddress(address));
    }
    debug!(address = %format!("{address:#x}"), code_len = code.len(), "contract code found");

    // Decimals first: nothing below may format an amount without it.
    let decimals = abi::decode_u8(&gateway.call(address, TokenCall::Decimals.encode()).await?)?;
    let symbol = abi::decode_string(&gateway.call(address, TokenCall::Symbol.encode()).await?)?;
    let name = abi::decode_string(&gateway.call(address, TokenCall::Name.encode()).await?)?;
    let total_supply =
        abi::decode_uint(&gateway.call(address, TokenCall::TotalSupply.encode()).await?)?;

    let descriptor = ContractDescriptor {
        address,
        name,
        symbol,
        decimals,
        total_supply,
    };
    info!(
        symbol = %descriptor.symbol,
        decimals = descriptor.decimals,
        total_supply = %descriptor.format_amount(total_supply)?,
        "token contract verified"
    );
    Ok(descriptor)
}

/// `allowance(owner, spender)` in base units.
pub async fn allowance(
    gateway: &ProviderGateway,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    let data = gateway
        .call(token, TokenCall::Allowance { owner, spender }.encode())
        .await?;
    abi::decode_uint(&data)
}
