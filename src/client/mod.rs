//! BankClient - the interface handed to the presentation layer
//!
//! Wires WalletSession, NetworkGuard, BalanceSync, TransactionOrchestrator
//! and EventListener together. Everything runs on one cooperative task;
//! state lives in `Rc`/`RefCell` and is never borrowed across an await.
//!
//! # Upward interface
//!
//! | Method | Description |
//! |--------|-------------|
//! | `connect()` | Request accounts + chain id, register wallet listeners |
//! | `disconnect()` | Forget the session locally |
//! | `current_session()` | `SessionInfo` snapshot |
//! | `current_balance()` | Last published `Balance` |
//! | `subscribe_balance(cb)` | Called on every published balance |
//! | `submit_deposit(amount)` | Payable deposit |
//! | `submit_withdraw(amount)` | Withdraw to the wallet |
//! | `submit_transfer(amount, to)` | Move balance to another account |

mod config;

pub use config::{BankConfig, DEFAULT_CONTRACT};

use crate::balance::{Balance, BalanceSync, SubscriberId};
use crate::error::BankError;
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::orchestrator::{OperationKind, Receipt, TransactionHandle, TransactionOrchestrator};
use crate::wallet::{Applied, NetworkGuard, SessionChange, SessionInfo, WalletProvider, WalletSession};
use std::rc::Rc;

pub struct BankClient {
    config: BankConfig,
    session: Rc<WalletSession>,
    balance: Rc<BalanceSync>,
    orchestrator: TransactionOrchestrator,
    notifier: Rc<dyn Notifier>,
}

impl BankClient {
    pub fn new(provider: Rc<dyn WalletProvider>, config: BankConfig) -> Self {
        Self::with_notifier(provider, config, Rc::new(TracingNotifier::default()))
    }

    pub fn with_notifier(provider: Rc<dyn WalletProvider>, config: BankConfig, notifier: Rc<dyn Notifier>) -> Self {
        let guard = NetworkGuard::new(config.required_chain());
        let session = Rc::new(WalletSession::new(provider, guard));
        let balance = Rc::new(BalanceSync::new());
        let orchestrator = TransactionOrchestrator::new(
            session.clone(),
            balance.clone(),
            notifier.clone(),
            config.notice_ttl,
        );
        Self { config, session, balance, orchestrator, notifier }
    }

    pub fn config(&self) -> &BankConfig { &self.config }
    pub fn session(&self) -> &WalletSession { &self.session }
    pub fn orchestrator(&self) -> &TransactionOrchestrator { &self.orchestrator }

    fn report(&self, err: &BankError) {
        self.notifier.show(Notice::error(err, self.config.notice_ttl));
    }

    /// Connect the wallet.
    ///
    /// On the wrong network the session is still established (flagged
    /// non-operational) and a `WrongNetwork` notice is raised. The initial
    /// balance is only fetched when the network check passes. A balance
    /// shown for an earlier account or network is cleared first.
    pub async fn connect(&self) -> Result<SessionInfo, BankError> {
        let previous = self.session.account();
        let session = match self.session.connect().await {
            Ok(session) => session,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        if previous.is_some() && (previous != Some(session.account()) || !session.is_operational()) {
            self.balance.reset();
        }
        if session.is_operational() {
            if let Err(e) = self.balance.refresh(session.signing_handle().as_ref()).await {
                self.report(&e);
            }
        } else if let Err(e) = self.session.guard().verify(session.chain_id()) {
            self.report(&e);
        }
        Ok(self.session.info())
    }

    /// Clear the session and the displayed balance. Idempotent.
    pub fn disconnect(&self) {
        let was_connected = self.session.is_connected();
        self.session.disconnect();
        if was_connected {
            self.balance.reset();
        }
    }

    pub fn current_session(&self) -> SessionInfo {
        self.session.info()
    }

    pub fn current_balance(&self) -> Balance {
        self.balance.current()
    }

    pub fn subscribe_balance(&self, callback: impl Fn(&Balance) + 'static) -> SubscriberId {
        self.balance.subscribe(callback)
    }

    pub fn unsubscribe_balance(&self, id: SubscriberId) -> bool {
        self.balance.unsubscribe(id)
    }

    /// Explicit re-query. Gated on the network check like every ledger call.
    pub async fn refresh_balance(&self) -> Result<Balance, BankError> {
        let result = match self.session.operational_handle() {
            Ok(signer) => self.balance.refresh(signer.as_ref()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    pub async fn submit_deposit(&self, amount: &str) -> Result<Receipt, BankError> {
        self.orchestrator.deposit(amount).await
    }

    pub async fn submit_withdraw(&self, amount: &str) -> Result<Receipt, BankError> {
        self.orchestrator.withdraw(amount).await
    }

    pub async fn submit_transfer(&self, amount: &str, recipient: &str) -> Result<Receipt, BankError> {
        self.orchestrator.transfer(amount, recipient).await
    }

    pub fn is_busy(&self, kind: OperationKind) -> bool {
        self.orchestrator.in_flight().is_busy(kind)
    }

    pub fn pending_transactions(&self) -> Vec<TransactionHandle> {
        self.orchestrator.tracked()
    }

    /// Apply one wallet notification and its follow-up.
    pub async fn handle_change(&self, change: SessionChange) -> Applied {
        let applied = self.session.apply(change);
        match applied {
            Applied::AccountSwitched => {
                // the old account's balance must not stay on screen
                let refreshed = match self.session.operational_handle() {
                    Ok(signer) => self.balance.refresh(signer.as_ref()).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = refreshed {
                    self.balance.reset();
                    if !matches!(e, BankError::WrongNetwork { .. }) {
                        self.report(&e);
                    }
                }
            }
            Applied::Disconnected | Applied::Reset => self.balance.reset(),
            Applied::Ignored => {}
        }
        applied
    }

    /// Apply every wallet notification queued so far.
    pub async fn process_events(&self) -> usize {
        let changes = self.session.listener().drain();
        let count = changes.len();
        for change in changes {
            self.handle_change(change).await;
        }
        count
    }

    /// Apply wallet notifications as they arrive, until [`BankClient::close`].
    pub async fn run_events(&self) {
        while let Some(change) = self.session.listener().next().await {
            self.handle_change(change).await;
        }
        tracing::debug!("wallet event loop finished");
    }

    /// Stop the event loop. In-flight transactions are unaffected.
    pub fn close(&self) {
        self.session.listener().close();
    }
}
