//! Error taxonomy for the wallet-session and transaction layer.
//!
//! Validation errors are raised locally before any network call. Remote
//! errors carry the provider's message unmodified as their `Display`.

use serde::Serialize;
use thiserror::Error;

/// EIP-1193 "User Rejected Request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("Please install MetaMask or another Web3 wallet")]
    WalletUnavailable,
    #[error("{0}")]
    UserRejected(String),
    #[error("Please connect to {expected} (wallet is on {actual})")]
    WrongNetwork { expected: String, actual: String },
    #[error("Wallet is not connected")]
    NotConnected,
    #[error("Please enter a valid amount greater than 0")]
    InvalidAmount(String),
    #[error("Please enter a valid Ethereum address")]
    InvalidAddress(String),
    #[error("Cannot transfer to your own address")]
    SelfTransfer,
    #[error("{0}")]
    SubmissionFailed(String),
    #[error("{0}")]
    ConfirmationFailed(String),
    #[error("{0}")]
    QueryFailed(String),
    #[error("{0}")]
    ConnectionFailed(String),
}

impl BankError {
    /// Title of the notification raised for this error.
    pub fn title(&self) -> &'static str {
        match self {
            BankError::WalletUnavailable => "Wallet not found",
            BankError::UserRejected(_) => "Request rejected",
            BankError::WrongNetwork { .. } => "Wrong Network",
            BankError::NotConnected => "Not connected",
            BankError::InvalidAmount(_) => "Invalid amount",
            BankError::InvalidAddress(_) => "Invalid address",
            BankError::SelfTransfer => "Invalid transfer",
            BankError::ConnectionFailed(_) => "Connection Error",
            BankError::SubmissionFailed(_)
            | BankError::ConfirmationFailed(_)
            | BankError::QueryFailed(_) => "Error",
        }
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            BankError::WalletUnavailable => "WalletUnavailable",
            BankError::UserRejected(_) => "UserRejected",
            BankError::WrongNetwork { .. } => "WrongNetwork",
            BankError::NotConnected => "NotConnected",
            BankError::InvalidAmount(_) => "InvalidAmount",
            BankError::InvalidAddress(_) => "InvalidAddress",
            BankError::SelfTransfer => "SelfTransfer",
            BankError::SubmissionFailed(_) => "SubmissionFailed",
            BankError::ConfirmationFailed(_) => "ConfirmationFailed",
            BankError::QueryFailed(_) => "QueryFailed",
            BankError::ConnectionFailed(_) => "ConnectionFailed",
        }
    }

    /// True for errors detected before anything is sent to the wallet or ledger.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            BankError::InvalidAmount(_)
                | BankError::InvalidAddress(_)
                | BankError::SelfTransfer
                | BankError::NotConnected
                | BankError::WrongNetwork { .. }
        )
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            title: self.title(),
            message: self.to_string(),
        }
    }
}

/// Serializable view of a [`BankError`] for JS and CLI output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub title: &'static str,
    pub message: String,
}

/// Failure reported by a wallet or ledger capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_code(USER_REJECTED_CODE, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid contract address {0:?}")]
    Contract(String),
    #[error("invalid chain id {0:?}")]
    ChainId(String),
    #[error("invalid {name}: {value:?}")]
    Value { name: &'static str, value: String },
}

pub type BankResult<T> = Result<T, BankError>;
