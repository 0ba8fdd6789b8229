//! Operation requests and the handles that track submitted calls.

use crate::core::{parse_address, short_address, Amount};
use crate::error::BankError;
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [OperationKind::Deposit, OperationKind::Withdraw, OperationKind::Transfer];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Transfer => "transfer",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdrawal",
            OperationKind::Transfer => "transfer",
        }
    }

    pub fn pending_text(&self) -> String {
        format!("Your {} is being processed...", self.noun())
    }

    pub fn success_title(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "Deposit successful",
            OperationKind::Withdraw => "Withdrawal successful",
            OperationKind::Transfer => "Transfer successful",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user action, as typed. Transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub amount: String,
    pub recipient: Option<String>,
}

impl OperationRequest {
    pub fn deposit(amount: impl Into<String>) -> Self {
        Self { kind: OperationKind::Deposit, amount: amount.into(), recipient: None }
    }

    pub fn withdraw(amount: impl Into<String>) -> Self {
        Self { kind: OperationKind::Withdraw, amount: amount.into(), recipient: None }
    }

    pub fn transfer(amount: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self { kind: OperationKind::Transfer, amount: amount.into(), recipient: Some(recipient.into()) }
    }

    /// Local checks that need no session: amount, then recipient syntax.
    pub fn validate(&self) -> Result<Operation, BankError> {
        let amount = Amount::parse(&self.amount).map_err(|_| BankError::InvalidAmount(self.amount.clone()))?;
        let recipient = match self.kind {
            OperationKind::Transfer => {
                let raw = self.recipient.as_deref().unwrap_or("");
                let address = parse_address(raw)?;
                Some(Recipient { address, entered: raw.trim().to_string() })
            }
            _ => None,
        };
        Ok(Operation { kind: self.kind, amount, recipient })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: Address,
    /// As typed; the success message shows this, shortened.
    pub entered: String,
}

/// A request that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub amount: Amount,
    pub recipient: Option<Recipient>,
}

impl Operation {
    pub fn success_message(&self) -> String {
        let amount = self.amount.as_entered();
        match (&self.kind, &self.recipient) {
            (OperationKind::Transfer, Some(to)) => {
                format!("Successfully transferred {} ETH to {}", amount, short_address(&to.entered))
            }
            (OperationKind::Withdraw, _) => format!("Successfully withdrew {} ETH", amount),
            _ => format!("Successfully deposited {} ETH", amount),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

/// A submitted call, tracked until its terminal status is reported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHandle {
    pub id: String,
    pub status: TxStatus,
    pub kind: OperationKind,
    pub amount: String,
    pub recipient: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl TransactionHandle {
    pub fn pending(id: impl Into<String>, op: &Operation) -> Self {
        Self {
            id: id.into(),
            status: TxStatus::Pending,
            kind: op.kind,
            amount: op.amount.to_string(),
            recipient: op.recipient.as_ref().map(|r| r.address.to_checksum(None)),
            submitted_at: Utc::now(),
        }
    }

    /// Pending -> terminal, exactly once. Returns false if already settled.
    pub fn settle(&mut self, status: TxStatus) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }
}

/// Outcome reported to the caller of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub success: bool,
    pub title: String,
    pub message: String,
    pub tx_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_order_amount_then_address() {
        let err = OperationRequest::transfer("abc", "nope").validate().unwrap_err();
        assert!(matches!(err, BankError::InvalidAmount(_)));
        let err = OperationRequest::transfer("1", "nope").validate().unwrap_err();
        assert!(matches!(err, BankError::InvalidAddress(_)));
        let mut missing = OperationRequest::transfer("1", "");
        missing.recipient = None;
        assert!(matches!(missing.validate(), Err(BankError::InvalidAddress(_))));
    }

    #[test]
    fn withdraw_ignores_recipient() {
        let mut req = OperationRequest::withdraw("0.5");
        req.recipient = Some("garbage".into());
        let op = req.validate().unwrap();
        assert!(op.recipient.is_none());
        assert_eq!(op.success_message(), "Successfully withdrew 0.5 ETH");
    }

    #[test]
    fn transfer_message_shortens_recipient() {
        let op = OperationRequest::transfer("0.01", "0xABCD000000000000000000000000000000001234")
            .validate()
            .unwrap();
        assert_eq!(op.success_message(), "Successfully transferred 0.01 ETH to 0xABCD...1234");
    }

    #[test]
    fn handle_settles_once() {
        let op = OperationRequest::deposit("1").validate().unwrap();
        let mut handle = TransactionHandle::pending("0xabc", &op);
        assert!(!handle.settle(TxStatus::Pending));
        assert!(handle.settle(TxStatus::Confirmed));
        assert!(!handle.settle(TxStatus::Failed));
        assert_eq!(handle.status, TxStatus::Confirmed);
    }
}
