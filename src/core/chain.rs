//! Chain identifiers as reported by `eth_chainId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ChainId(pub u64);

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
    pub const SEPOLIA: ChainId = ChainId(0xaa36a7);

    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "Ethereum Mainnet",
            0xaa36a7 => "Sepolia",
            17000 => "Holesky",
            31337 => "Anvil",
            _ => "unknown network",
        }
    }
}

impl FromStr for ChainId {
    type Err = String;

    /// Accepts `0x`-prefixed hex in any case, or decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed.map(ChainId).map_err(|_| format!("invalid chain id {:?}", s))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ChainId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
