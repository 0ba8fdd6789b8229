//! NetworkGuard - the one network this client is allowed to transact on

use crate::core::ChainId;
use crate::error::BankError;

#[derive(Debug, Clone, Copy)]
pub struct NetworkGuard {
    required: ChainId,
}

impl NetworkGuard {
    pub fn new(required: ChainId) -> Self {
        Self { required }
    }

    pub fn required(&self) -> ChainId {
        self.required
    }

    /// Pass iff the wallet's chain equals the required one. Unparseable ids fail.
    pub fn verify(&self, chain_id: &str) -> Result<ChainId, BankError> {
        match chain_id.parse::<ChainId>() {
            Ok(actual) if actual == self.required => Ok(actual),
            _ => {
                tracing::warn!(expected = %self.required, actual = chain_id, "wrong network");
                Err(BankError::WrongNetwork {
                    expected: self.required.name().to_string(),
                    actual: chain_id.to_string(),
                })
            }
        }
    }

    pub fn passes(&self, chain_id: &str) -> bool {
        self.verify(chain_id).is_ok()
    }
}
