//! SimpleBank: wallet session and transaction orchestration for the
//! SimpleBank ledger contract.
//!
//! # Architecture
//!
//! ```text
//! BankClient (upward interface)
//!   │
//!   ├── WalletSession ── owns the Session (account, chain, signing handle)
//!   │     ├── NetworkGuard ── required chain, checked before every call
//!   │     └── EventListener ── accountsChanged / chainChanged as messages
//!   │
//!   ├── BalanceSync ── last ledger-reported balance, subscribers
//!   │
//!   └── TransactionOrchestrator
//!         validate → submit → await finality → re-query balance
//!
//! WalletProvider / Ledger (capabilities)
//!   └── Eip1193Wallet<Transport>
//!         ├── HttpTransport     (native, JSON-RPC node)
//!         └── BrowserTransport  (wasm, window.ethereum)
//! ```
//!
//! # Upward interface
//!
//! | Operation | Method |
//! |-----------|--------|
//! | connect | `client.connect()` |
//! | disconnect | `client.disconnect()` |
//! | currentSession | `client.current_session()` |
//! | currentBalance | `client.current_balance()` |
//! | subscribeBalance | `client.subscribe_balance(cb)` |
//! | submitDeposit | `client.submit_deposit("1.5")` |
//! | submitWithdraw | `client.submit_withdraw("0.5")` |
//! | submitTransfer | `client.submit_transfer("1", "0xAbCd...")` |
//!
//! # Features
//!
//! - `native` - HTTP JSON-RPC transport, tokio, log subscriber, CLI
//! - `wasm` - browser build, `window.ethereum`, JS bindings (`BankApp`)
//!
//! # Usage
//!
//! ```ignore
//! use simplebank::{BankClient, BankConfig, Eip1193Wallet, HttpTransport};
//! use std::rc::Rc;
//!
//! let config = BankConfig::from_env()?;
//! let wallet = Eip1193Wallet::new(HttpTransport::new("http://127.0.0.1:8545"), config.contract());
//! let client = BankClient::new(Rc::new(wallet), config);
//!
//! client.connect().await?;
//! let receipt = client.submit_deposit("1.5").await?;
//! println!("{} ({})", receipt.message, client.current_balance().display());
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod balance;
pub mod client;
pub mod core;
pub mod eip1193;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod wallet;

// =============================================================================
// Native-only modules (CLI, log subscriber)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use balance::{Balance, BalanceSync, BalanceView};
pub use client::{BankClient, BankConfig, DEFAULT_CONTRACT};
pub use core::{format_ether, parse_address, parse_ether, short_address, Amount, ChainId};
pub use eip1193::{Eip1193Wallet, Transport};
pub use error::{BankError, BankResult, ConfigError, ErrorReport, ProviderError};
pub use notify::{Level, Notice, NoticeId, NoticeLog, Notifier, TracingNotifier};
pub use orchestrator::{OperationKind, OperationRequest, Receipt, TransactionHandle, TxStatus};
pub use wallet::{
    EventListener, Ledger, NetworkGuard, PendingTransaction, Session, SessionChange, SessionInfo,
    WalletEvent, WalletProvider, WalletSession,
};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use eip1193::HttpTransport;

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{BankApp, BrowserTransport};
