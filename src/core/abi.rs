//! Method names and calldata for the SimpleBank contract and the EIP-1193 API.
//!
//! Centralized registry for every string that crosses the wallet boundary.

use alloy_primitives::{keccak256, Address, U256};

/// Wallet JSON-RPC methods
pub mod rpc {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const CALL: &str = "eth_call";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const GET_RECEIPT: &str = "eth_getTransactionReceipt";
}

/// Wallet event names
pub mod events {
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
    pub const CHAIN_CHANGED: &str = "chainChanged";
}

/// Contract function signatures
pub mod bank {
    pub const GET_BALANCE: &str = "getBalance()";
    pub const DEPOSIT: &str = "deposit()";
    pub const WITHDRAW: &str = "withdraw(uint256)";
    pub const TRANSFER: &str = "transfer(address,uint256)";
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn word_u256(v: U256) -> [u8; 32] {
    v.to_be_bytes::<32>()
}

fn word_address(a: Address) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[12..].copy_from_slice(a.as_slice());
    w
}

/// ABI-encode a call: 4-byte selector followed by static 32-byte words.
fn encode(signature: &str, words: &[[u8; 32]]) -> String {
    let mut out = Vec::with_capacity(4 + 32 * words.len());
    out.extend_from_slice(&selector(signature));
    for w in words {
        out.extend_from_slice(w);
    }
    format!("0x{}", hex::encode(out))
}

pub fn get_balance() -> String {
    encode(bank::GET_BALANCE, &[])
}

pub fn deposit() -> String {
    encode(bank::DEPOSIT, &[])
}

pub fn withdraw(amount: U256) -> String {
    encode(bank::WITHDRAW, &[word_u256(amount)])
}

pub fn transfer(to: Address, amount: U256) -> String {
    encode(bank::TRANSFER, &[word_address(to), word_u256(amount)])
}

/// Decode a single `uint256` return value from `eth_call` output.
pub fn decode_u256(data: &str) -> Result<U256, String> {
    let raw = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(raw).map_err(|e| format!("bad return data: {}", e))?;
    if bytes.len() < 32 {
        return Err(format!("short return data ({} bytes)", bytes.len()));
    }
    Ok(U256::from_be_slice(&bytes[..32]))
}

/// `0x`-prefixed hex quantity, as JSON-RPC expects for `value`.
pub fn quantity(v: U256) -> String {
    format!("0x{:x}", v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn known_selectors() {
        // transfer(address,uint256) is the ERC-20 selector everyone knows
        assert_eq!(hex::encode(selector(bank::TRANSFER)), "a9059cbb");
        assert_eq!(hex::encode(selector(bank::DEPOSIT)), "d0e30db0");
        assert_eq!(hex::encode(selector(bank::WITHDRAW)), "2e1a7d4d");
        assert_eq!(hex::encode(selector(bank::GET_BALANCE)), "12065fe0");
    }

    #[test]
    fn encodes_static_arguments() {
        let to = Address::from_str("0x00000000000000000000000000000000000000aa").unwrap();
        let data = transfer(to, U256::from(1u64));
        assert_eq!(data.len(), 2 + 2 * (4 + 64));
        assert!(data.starts_with("0xa9059cbb"));
        assert!(data.ends_with(&format!("{:0>64}", "1")));
        assert_eq!(&data[10..74], &format!("{:0>64}", "aa"));
    }

    #[test]
    fn decodes_return_word() {
        let word = format!("0x{:0>64}", "14d1120d7b160000");
        assert_eq!(decode_u256(&word).unwrap(), U256::from(1_500_000_000_000_000_000u64));
        assert!(decode_u256("0x").is_err());
        assert_eq!(quantity(U256::from(255u64)), "0xff");
    }
}
