//! TransactionOrchestrator - validate, submit, await finality, re-query balance
//!
//! # Flow (per invocation, strictly sequential)
//!
//! ```text
//! acquire busy flag
//!   │
//!   ├── validate amount / recipient ───────────────► InvalidAmount, InvalidAddress
//!   ├── session connected, on required network ───► NotConnected, WrongNetwork
//!   ├── recipient != connected account ───────────► SelfTransfer
//!   ├── submit via signing handle ────────────────► SubmissionFailed
//!   │     └── TransactionHandle { Pending }
//!   ├── await finality ───────────────────────────► ConfirmationFailed (handle Failed)
//!   │     └── handle Confirmed
//!   ├── BalanceSync::refresh
//!   └── report Receipt
//! release busy flag (guard drop)
//! ```
//!
//! Separate invocations are independent and may confirm in any order.

mod busy;
mod request;

pub use busy::{BusyGuard, InFlight};
pub use request::{
    Operation, OperationKind, OperationRequest, Receipt, Recipient, TransactionHandle, TxStatus,
};

use crate::balance::BalanceSync;
use crate::error::BankError;
use crate::notify::{Notice, NoticeId, Notifier};
use crate::wallet::{Ledger, PendingTransaction, WalletSession};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

pub struct TransactionOrchestrator {
    session: Rc<WalletSession>,
    balance: Rc<BalanceSync>,
    notifier: Rc<dyn Notifier>,
    in_flight: InFlight,
    tracked: RefCell<BTreeMap<u64, TransactionHandle>>,
    next_key: Cell<u64>,
    notice_ttl: Duration,
}

/// Dismisses the pending-transaction notice on every exit path.
struct PendingNotice<'a> {
    notifier: &'a dyn Notifier,
    id: NoticeId,
}

impl Drop for PendingNotice<'_> {
    fn drop(&mut self) {
        self.notifier.dismiss(self.id);
    }
}

/// Holds one entry in the tracked map; removed however the invocation ends,
/// including when the caller drops the future mid-confirmation.
struct Tracked<'a> {
    map: &'a RefCell<BTreeMap<u64, TransactionHandle>>,
    key: u64,
}

impl Tracked<'_> {
    fn settle(&self, status: TxStatus) {
        if let Some(handle) = self.map.borrow_mut().get_mut(&self.key) {
            if !handle.settle(status) {
                tracing::error!(tx = handle.id.as_str(), "transaction settled twice");
            }
        }
    }
}

impl Drop for Tracked<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.map.borrow_mut().remove(&self.key) {
            if handle.status == TxStatus::Pending {
                tracing::debug!(tx = handle.id.as_str(), "stopped tracking unsettled transaction");
            }
        }
    }
}

impl TransactionOrchestrator {
    pub fn new(
        session: Rc<WalletSession>,
        balance: Rc<BalanceSync>,
        notifier: Rc<dyn Notifier>,
        notice_ttl: Duration,
    ) -> Self {
        Self {
            session,
            balance,
            notifier,
            in_flight: InFlight::new(),
            tracked: RefCell::new(BTreeMap::new()),
            next_key: Cell::new(0),
            notice_ttl,
        }
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Calls submitted and not yet reported, oldest first.
    pub fn tracked(&self) -> Vec<TransactionHandle> {
        self.tracked.borrow().values().cloned().collect()
    }

    pub async fn deposit(&self, amount: &str) -> Result<Receipt, BankError> {
        self.submit(OperationRequest::deposit(amount)).await
    }

    pub async fn withdraw(&self, amount: &str) -> Result<Receipt, BankError> {
        self.submit(OperationRequest::withdraw(amount)).await
    }

    pub async fn transfer(&self, amount: &str, recipient: &str) -> Result<Receipt, BankError> {
        self.submit(OperationRequest::transfer(amount, recipient)).await
    }

    /// Run one operation to a terminal outcome. Every error is also raised
    /// as a notice; the busy flag for `request.kind` is held throughout.
    pub async fn submit(&self, request: OperationRequest) -> Result<Receipt, BankError> {
        let _busy = self.in_flight.acquire(request.kind);
        let result = self.execute(&request).await;
        if let Err(e) = &result {
            tracing::warn!(kind = %request.kind, error = %e, "{} failed", request.kind);
            self.notifier.show(Notice::error(e, self.notice_ttl));
        }
        result
    }

    async fn execute(&self, request: &OperationRequest) -> Result<Receipt, BankError> {
        let op = request.validate()?;
        let signer = self.session.operational_handle()?;
        if let Some(to) = &op.recipient {
            if to.address == signer.account() {
                return Err(BankError::SelfTransfer);
            }
        }

        let pending = self.send(signer.as_ref(), &op).await?;
        let tx_id = pending.id().to_string();
        let tracked = self.track(TransactionHandle::pending(tx_id.as_str(), &op));
        tracing::info!(kind = %op.kind, tx = tx_id.as_str(), amount = %op.amount, "submitted");

        let outcome = {
            let _notice = PendingNotice {
                notifier: self.notifier.as_ref(),
                id: self.notifier.show(Notice::info("Transaction Pending", op.kind.pending_text())),
            };
            pending.wait().await
        };

        if let Err(e) = outcome {
            tracked.settle(TxStatus::Failed);
            return Err(BankError::ConfirmationFailed(e.message));
        }
        tracked.settle(TxStatus::Confirmed);
        tracing::info!(kind = %op.kind, tx = tx_id.as_str(), "confirmed");

        // Re-query for whoever is connected now; the wallet may have switched
        // accounts while we waited. A failed query keeps the old balance.
        match self.session.operational_handle() {
            Ok(current) => {
                if let Err(e) = self.balance.refresh(current.as_ref()).await {
                    self.notifier.show(Notice::error(&e, self.notice_ttl));
                }
            }
            Err(_) => tracing::debug!(tx = tx_id.as_str(), "session gone before balance refresh"),
        }

        let receipt = Receipt {
            success: true,
            title: op.kind.success_title().to_string(),
            message: op.success_message(),
            tx_id,
        };
        self.notifier.show(Notice::success(
            receipt.title.clone(),
            Some(receipt.message.clone()),
            self.notice_ttl,
        ));
        Ok(receipt)
    }

    async fn send(&self, signer: &dyn Ledger, op: &Operation) -> Result<Box<dyn PendingTransaction>, BankError> {
        let wei = op.amount.wei();
        let submitted = match (&op.kind, &op.recipient) {
            (OperationKind::Deposit, _) => signer.deposit(wei).await,
            (OperationKind::Withdraw, _) => signer.withdraw(wei).await,
            (OperationKind::Transfer, Some(to)) => signer.transfer(to.address, wei).await,
            (OperationKind::Transfer, None) => {
                return Err(BankError::InvalidAddress(String::new()));
            }
        };
        submitted.map_err(|e| BankError::SubmissionFailed(e.message))
    }

    fn track(&self, handle: TransactionHandle) -> Tracked<'_> {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.tracked.borrow_mut().insert(key, handle);
        Tracked { map: &self.tracked, key }
    }
}
