//! Account address validation and display.

use crate::error::BankError;
use alloy_primitives::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address regex"));

/// Parse an account address.
///
/// Single-case hex is taken as-is. Mixed case must carry a valid EIP-55
/// checksum, which catches most single-character typos.
pub fn parse_address(input: &str) -> Result<Address, BankError> {
    let s = input.trim();
    let invalid = || BankError::InvalidAddress(input.to_string());
    if !ADDRESS.is_match(s) {
        return Err(invalid());
    }
    let digits = &s[2..];
    let single_case = digits == digits.to_ascii_lowercase() || digits == digits.to_ascii_uppercase();
    if single_case {
        Address::from_str(s).map_err(|_| invalid())
    } else {
        Address::parse_checksummed(s, None).map_err(|_| invalid())
    }
}

pub fn is_address(input: &str) -> bool {
    parse_address(input).is_ok()
}

/// `0xABCD...1234`: first six and last four characters.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x28Dc9A85C0f80D1f2e941ABb5ba97237efbB1503";

    #[test]
    fn accepts_single_case_and_checksummed() {
        assert!(is_address("0x28dc9a85c0f80d1f2e941abb5ba97237efbb1503"));
        assert!(is_address("0xABCD000000000000000000000000000000001234"));
        assert!(is_address(CHECKSUMMED));
        assert_eq!(
            parse_address(CHECKSUMMED).unwrap(),
            parse_address(&CHECKSUMMED.to_lowercase()).unwrap()
        );
    }

    #[test]
    fn rejects_bad_syntax_and_checksum() {
        for bad in [
            "",
            "0x",
            "28dc9a85c0f80d1f2e941abb5ba97237efbb1503",
            "0x28dc9a85c0f80d1f2e941abb5ba97237efbb150",
            "0x28dc9a85c0f80d1f2e941abb5ba97237efbb15033",
            "0xzzdc9a85c0f80d1f2e941abb5ba97237efbb1503",
            "vitalik.eth",
        ] {
            assert!(matches!(parse_address(bad), Err(BankError::InvalidAddress(_))), "{bad:?}");
        }
        // one flipped letter case breaks the checksum
        let typo = CHECKSUMMED.replacen("Dc9A", "dc9A", 1);
        assert!(!is_address(&typo));
    }

    #[test]
    fn shortens_for_display() {
        assert_eq!(short_address("0xABCD000000000000000000000000000000001234"), "0xABCD...1234");
        assert_eq!(short_address("0x1234"), "0x1234");
    }
}
