//! Calldata for the token and vault contracts.
//!
//! Calls are encoded as a 4-byte selector followed by ABI-encoded arguments.

use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Bytes, U256};

use crate::error::{ProtegoError, Result};

/// Calls made against the ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCall {
    Decimals,
    Symbol,
    Name,
    TotalSupply,
    BalanceOf(Address),
    Allowance { owner: Address, spender: Address },
    Approve { spender: Address, amount: U256 },
}

impl TokenCall {
    pub fn signature(&self) -> &'static str {
        match self {
            TokenCall::Decimals => "decimals()",
            TokenCall::Symbol => "symbol()",
            TokenCall::Name => "name()",
            TokenCall::TotalSupply => "totalSupply()",
            TokenCall::BalanceOf(_) => "balanceOf(address)",
            TokenCall::Allowance { .. } => "allowance(address,address)",
            TokenCall::Approve { .. } => "approve(address,uint256)",
        }
    }

    fn args(&self) -> Vec<Token> {
        match self {
            TokenCall::Decimals | TokenCall::Symbol | TokenCall::Name | TokenCall::TotalSupply => {
                vec![]
            }
            TokenCall::BalanceOf(account) => vec![Token::Address(*account)],
            TokenCall::Allowance { owner, spender } => {
                vec![Token::Address(*owner), Token::Address(*spender)]
            }
            TokenCall::Approve { spender, amount } => {
                vec![Token::Address(*spender), Token::Uint(*amount)]
            }
        }
    }

    pub fn encode(&self) -> Bytes {
        encode_call(self.signature(), &self.args())
    }

    /// Recognise token calldata by selector.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (selector, rest) = split_selector(data)?;
        let call = if selector == ethers::utils::id("decimals()") {
            TokenCall::Decimals
        } else if selector == ethers::utils::id("symbol()") {
            TokenCall::Symbol
        } else if selector == ethers::utils::id("name()") {
            TokenCall::Name
        } else if selector == ethers::utils::id("totalSupply()") {
            TokenCall::TotalSupply
        } else if selector == ethers::utils::id("balanceOf(address)") {
            let t = abi::decode(&[ParamType::Address], rest)?;
            TokenCall::BalanceOf(address_at(&t, 0)?)
        } else if selector == ethers::utils::id("allowance(address,address)") {
            let t = abi::decode(&[ParamType::Address, ParamType::Address], rest)?;
            TokenCall::Allowance {
                owner: address_at(&t, 0)?,
                spender: address_at(&t, 1)?,
            }
        } else if selector == ethers::utils::id("approve(address,uint256)") {
            let t = abi::decode(&[ParamType::Address, ParamType::Uint(256)], rest)?;
            TokenCall::Approve {
                spender: address_at(&t, 0)?,
                amount: uint_at(&t, 1)?,
            }
        } else {
            return Err(ProtegoError::Abi(format!(
                "unknown token selector 0x{}",
                hex::encode(selector)
            )));
        };
        Ok(call)
    }
}

/// Calls made against the ERC-4626 style vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCall {
    Decimals,
    Deposit { assets: U256, receiver: Address },
    Withdraw { shares: U256, receiver: Address, owner: Address },
    BalanceOf(Address),
}

impl VaultCall {
    pub fn signature(&self) -> &'static str {
        match self {
            VaultCall::Decimals => "decimals()",
            VaultCall::Deposit { .. } => "deposit(uint256,address)",
            VaultCall::Withdraw { .. } => "withdraw(uint256,address,address)",
            VaultCall::BalanceOf(_) => "balanceOf(address)",
        }
    }

    fn args(&self) -> Vec<Token> {
        match self {
            VaultCall::Decimals => vec![],
            VaultCall::Deposit { assets, receiver } => {
                vec![Token::Uint(*assets), Token::Address(*receiver)]
            }
            VaultCall::Withdraw {
                shares,
                receiver,
                owner,
            } => vec![
                Token::Uint(*shares),
                Token::Address(*receiver),
                Token::Address(*owner),
            ],
            VaultCall::BalanceOf(account) => vec![Token::Address(*account)],
        }
    }

    pub fn encode(&self) -> Bytes {
        encode_call(self.signature(), &self.args())
    }

    /// Recognise vault calldata by selector.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (selector, rest) = split_selector(data)?;
        if selector == ethers::utils::id("decimals()") {
            Ok(VaultCall::Decimals)
        } else if selector == ethers::utils::id("deposit(uint256,address)") {
            let t = abi::decode(&[ParamType::Uint(256), ParamType::Address], rest)?;
            Ok(VaultCall::Deposit {
                assets: uint_at(&t, 0)?,
                receiver: address_at(&t, 1)?,
            })
        } else if selector == ethers::utils::id("withdraw(uint256,address,address)") {
            let t = abi::decode(
                &[ParamType::Uint(256), ParamType::Address, ParamType::Address],
                rest,
            )?;
            Ok(VaultCall::Withdraw {
                shares: uint_at(&t, 0)?,
                receiver: address_at(&t, 1)?,
                owner: address_at(&t, 2)?,
            })
        } else if selector == ethers::utils::id("balanceOf(address)") {
            let t = abi::decode(&[ParamType::Address], rest)?;
            Ok(VaultCall::BalanceOf(address_at(&t, 0)?))
        } else {
            Err(ProtegoError::Abi(format!(
                "unknown vault selector 0x{}",
                hex::encode(selector)
            )))
        }
    }
}

fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = ethers::utils::id(signature).to_vec();
    data.extend(abi::encode(args));
    Bytes::from(data)
}

fn split_selector(data: &[u8]) -> Result<([u8; 4], &[u8])> {
    if data.len() < 4 {
        return Err(ProtegoError::Abi(format!(
            "calldata too short: {} bytes",
            data.len()
        )));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    Ok((selector, &data[4..]))
}

fn address_at(tokens: &[Token], i: usize) -> Result<Address> {
    tokens
        .get(i)
        .cloned()
        .and_then(Token::into_address)
        .ok_or_else(|| ProtegoError::Abi(format!("expected address at position {i}")))
}

fn uint_at(tokens: &[Token], i: usize) -> Result<U256> {
    tokens
        .get(i)
        .cloned()
        .and_then(Token::into_uint)
        .ok_or_else(|| ProtegoError::Abi(format!("expected uint at position {i}")))
}

// ---- return data ----

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Result<U256> {
    let tokens = abi::decode(&[ParamType::Uint(256)], data)?;
    uint_at(&tokens, 0)
}

/// Decode a single `uint8` return value.
pub fn decode_u8(data: &[u8]) -> Result<u8> {
    let tokens = abi::decode(&[ParamType::Uint(8)], data)?;
    let value = uint_at(&tokens, 0)?;
    if value > U256::from(u8::MAX) {
        return Err(ProtegoError::Abi(format!("uint8 out of range: {value}")));
    }
    Ok(value.low_u32() as u8)
}

/// Decode a single `string` return value.
pub fn decode_string(data: &[u8]) -> Result<String> {
    let tokens = abi::decode(&[ParamType::String], data)?;
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_string)
        .ok_or_else(|| ProtegoError::Abi("expected string".into()))
}

/// Encode a `uint256` return value.
pub fn encode_uint(value: U256) -> Bytes {
    Bytes::from(abi::encode(&[Token::Uint(value)]))
}

/// Encode a `string` return value.
pub fn encode_string(value: &str) -> Bytes {
    Bytes::from(abi::encode(&[Token::String(value.to_string())]))
}
