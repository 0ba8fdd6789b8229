//! Ether amounts: decimal display strings <-> 18-decimal smallest-unit integers.
//!
//! Conversion is exact. No floating point is involved anywhere.

use alloy_primitives::U256;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

pub const DECIMALS: usize = 18;

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:([0-9]+)(?:\.([0-9]*))?|\.([0-9]+))$").expect("decimal regex"));

fn wei_per_ether() -> U256 {
    U256::from(10u64).pow(U256::from(DECIMALS))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("not a decimal number: {0:?}")]
    Syntax(String),
    #[error("more than 18 fractional digits: {0:?}")]
    Precision(String),
    #[error("amount out of range: {0:?}")]
    Overflow(String),
}

/// Parse a decimal ether string into wei.
pub fn parse_ether(input: &str) -> Result<U256, UnitsError> {
    let s = input.trim();
    let caps = DECIMAL
        .captures(s)
        .ok_or_else(|| UnitsError::Syntax(input.to_string()))?;
    let whole = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let frac = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
        .unwrap_or("");
    if frac.len() > DECIMALS {
        return Err(UnitsError::Precision(input.to_string()));
    }

    let overflow = || UnitsError::Overflow(input.to_string());
    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| overflow())?
    };
    let padded = format!("{:0<width$}", frac, width = DECIMALS);
    let frac = U256::from_str_radix(&padded, 10).map_err(|_| overflow())?;

    whole
        .checked_mul(wei_per_ether())
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(overflow)
}

/// Render wei as a decimal ether string (`2.0`, `1.5`, `0.000000000000000001`).
pub fn format_ether(wei: U256) -> String {
    let (whole, frac) = wei.div_rem(wei_per_ether());
    let frac = format!("{:0>width$}", frac.to_string(), width = DECIMALS);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// A strictly positive ether amount, kept alongside the text the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    wei: U256,
    text: String,
}

impl Amount {
    /// Parse user input. Zero is rejected along with malformed input.
    pub fn parse(input: &str) -> Result<Self, UnitsError> {
        let wei = parse_ether(input)?;
        if wei.is_zero() {
            return Err(UnitsError::Syntax(input.to_string()));
        }
        Ok(Self { wei, text: input.trim().to_string() })
    }

    pub fn wei(&self) -> U256 {
        self.wei
    }

    /// The amount as the user entered it (trimmed).
    pub fn as_entered(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_ether(self.wei))
    }
}
