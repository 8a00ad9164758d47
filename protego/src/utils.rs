use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{ProtegoError, Result};

/// Convert a Decimal to integer base units of a token with `decimals` places.
///
/// # Errors
///
/// Returns `ProtegoError::Validation` for negative amounts, amounts with more
/// fractional digits than the token supports, or `decimals` above 77.
pub fn to_base_units(x: Decimal, decimals: u8) -> Result<U256> {
    if x.is_sign_negative() {
        return Err(ProtegoError::Validation(format!("amount must not be negative: {x}")));
    }
    if decimals > 77 {
        return Err(ProtegoError::Validation(format!("unsupported decimals: {decimals}")));
    }
    let x = x.normalize();
    let scale = x.scale();
    if scale > u32::from(decimals) {
        return Err(ProtegoError::Validation(format!(
            "{x} has more than {decimals} decimal places"
        )));
    }
    let mantissa = u128::try_from(x.mantissa())
        .map_err(|_| ProtegoError::Validation(format!("amount out of range: {x}")))?;
    let factor = U256::exp10((u32::from(decimals) - scale) as usize);
    U256::from(mantissa)
        .checked_mul(factor)
        .ok_or_else(|| ProtegoError::Validation(format!("amount out of range: {x}")))
}

/// Format integer base units as a decimal string with exactly `decimals`
/// fractional digits.
///
/// Zero decimals yields a plain integer.
///
/// # Errors
///
/// Returns `ProtegoError::Validation` for `decimals` above 77.
pub fn format_base_units(amount: U256, decimals: u8) -> Result<String> {
    if decimals > 77 {
        return Err(ProtegoError::Validation(format!("unsupported decimals: {decimals}")));
    }
    if decimals == 0 {
        return Ok(amount.to_string());
    }
    let width = usize::from(decimals);
    let factor = U256::exp10(width);
    let integer = amount / factor;
    let fraction = (amount % factor).to_string();
    Ok(format!("{integer}.{fraction:0>width$}"))
}

/// Parse a JSON-RPC quantity: a `0x` hex string or a plain JSON number.
pub fn parse_quantity(value: &Value) -> Result<U256> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            if digits.is_empty() {
                return Ok(U256::zero());
            }
            U256::from_str_radix(digits, 16).map_err(|e| ProtegoError::Rpc {
                code: None,
                message: format!("invalid quantity {s:?}: {e}"),
            })
        }
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(|| ProtegoError::Rpc {
            code: None,
            message: format!("invalid quantity {n}"),
        }),
        other => Err(ProtegoError::Rpc {
            code: None,
            message: format!("expected quantity, got {other}"),
        }),
    }
}

/// Narrow a quantity to `u64` (chain ids, block numbers).
pub fn quantity_to_u64(q: U256) -> Result<u64> {
    if q > U256::from(u64::MAX) {
        return Err(ProtegoError::Rpc {
            code: None,
            message: format!("quantity {q} does not fit in u64"),
        });
    }
    Ok(q.low_u64())
}

/// Decode a hex string (with optional `0x` prefix) to bytes.
///
/// # Errors
///
/// Returns `ProtegoError::Validation` if the hex string is invalid.
pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped).map_err(|e| ProtegoError::Validation(format!("invalid hex string: {e}")))
}

/// `0x1234...abcd` form used in status lines.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:#x}");
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
