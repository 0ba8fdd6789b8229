//! Wallet module - external wallet capabilities and the session built on them
//!
//! The wallet and the ledger contract are opaque services. Everything here
//! talks to them through the three capability traits below, so the same
//! session logic runs against `window.ethereum`, a JSON-RPC node or a mock.
//!
//! # Architecture
//!
//! ```text
//! WalletProvider ──subscribe()──► EventSink ──► EventListener
//!     │                                                  │ SessionChange
//!     │ request_accounts / chain_id                      ▼
//!     └──────────────────────────────────────────► WalletSession ◄── NetworkGuard
//!                                                        │
//!                                                        │ signing handle
//!                                                        ▼
//!                                                 Rc<dyn Ledger>
//!                                                        │
//!                                      getBalance / deposit / withdraw / transfer
//!                                                        │
//!                                                        ▼
//!                                           Box<dyn PendingTransaction>
//! ```

mod events;
mod guard;
mod session;

pub use events::{EventListener, EventSink, SessionChange};
pub use guard::NetworkGuard;
pub use session::{Applied, Session, SessionInfo, WalletSession};

use crate::error::ProviderError;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::rc::Rc;

/// Raw notification pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

/// Wallet provider capability (EIP-1193 shaped).
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Whether a wallet is present at all. Checked on every connect.
    fn is_available(&self) -> bool {
        true
    }

    /// Ask the user for account access.
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Active network identity as reported by the wallet (`0x…`).
    async fn chain_id(&self) -> Result<String, ProviderError>;

    /// Register for `accountsChanged` / `chainChanged`. Events go to `sink`
    /// until [`EventSink::send`] returns false.
    fn subscribe(&self, sink: EventSink);

    /// Signing capability bound to `account`, used to build ledger calls.
    fn ledger(&self, account: Address) -> Rc<dyn Ledger>;
}

/// Ledger contract capability, bound to one signing account.
#[async_trait(?Send)]
pub trait Ledger {
    fn account(&self) -> Address;

    /// Smallest-unit balance held by [`Ledger::account`].
    async fn get_balance(&self) -> Result<U256, ProviderError>;

    /// Payable call, `value` attached as the transaction value.
    async fn deposit(&self, value: U256) -> Result<Box<dyn PendingTransaction>, ProviderError>;

    async fn withdraw(&self, amount: U256) -> Result<Box<dyn PendingTransaction>, ProviderError>;

    async fn transfer(&self, to: Address, amount: U256) -> Result<Box<dyn PendingTransaction>, ProviderError>;
}

impl std::fmt::Debug for dyn Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("account", &self.account()).finish_non_exhaustive()
    }
}

/// A call accepted by the wallet but not yet final.
#[async_trait(?Send)]
pub trait PendingTransaction {
    /// Transaction reference (hash).
    fn id(&self) -> &str;

    /// Resolve once the call is final. Dropping the future stops waiting
    /// but never revokes the submission.
    async fn wait(&self) -> Result<(), ProviderError>;
}
