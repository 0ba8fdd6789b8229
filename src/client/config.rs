//! Client Configuration - fixed at construction, never edited by the user

use crate::core::{parse_address, ChainId};
use crate::error::ConfigError;
use alloy_primitives::{address, Address};
use std::time::Duration;

pub const DEFAULT_CONTRACT: Address = address!("28Dc9A85C0f80D1f2e941ABb5ba97237efbB1503");

/// Client configuration. The required network cannot change after construction.
#[derive(Debug, Clone)]
pub struct BankConfig {
    contract: Address,
    required_chain: ChainId,
    pub notice_ttl: Duration,
    pub confirmation_poll: Duration,
    pub confirmation_timeout: Option<Duration>,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            contract: DEFAULT_CONTRACT,
            required_chain: ChainId::SEPOLIA,
            notice_ttl: Duration::from_secs(5),
            confirmation_poll: Duration::from_secs(1),
            confirmation_timeout: None,
        }
    }
}

impl BankConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_contract(mut self, contract: Address) -> Self { self.contract = contract; self }
    pub fn with_required_chain(mut self, chain: ChainId) -> Self { self.required_chain = chain; self }
    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self { self.notice_ttl = ttl; self }
    pub fn with_confirmation_poll(mut self, every: Duration) -> Self { self.confirmation_poll = every; self }
    pub fn with_confirmation_timeout(mut self, limit: Duration) -> Self { self.confirmation_timeout = Some(limit); self }

    pub fn contract(&self) -> Address { self.contract }
    pub fn required_chain(&self) -> ChainId { self.required_chain }

    /// Overlay `SIMPLEBANK_CONTRACT`, `SIMPLEBANK_CHAIN_ID` and
    /// `SIMPLEBANK_POLL_MS` onto the defaults.
    #[cfg(feature = "native")]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup("SIMPLEBANK_CONTRACT") {
            config.contract = parse_address(&raw).map_err(|_| ConfigError::Contract(raw.clone()))?;
        }
        if let Some(raw) = lookup("SIMPLEBANK_CHAIN_ID") {
            config.required_chain = raw.parse().map_err(|_| ConfigError::ChainId(raw.clone()))?;
        }
        if let Some(raw) = lookup("SIMPLEBANK_POLL_MS") {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Value { name: "SIMPLEBANK_POLL_MS", value: raw.clone() })?;
            config.confirmation_poll = Duration::from_millis(ms);
        }
        Ok(config)
    }
}
