//! BalanceSync - the client's copy of the ledger balance
//!
//! The balance is only ever replaced by a fresh ledger query; it is never
//! adjusted locally. Each query takes a ticket when it is issued, and the
//! ticket becomes the published `as_of`. A query that completes after a
//! newer one has already been published is stale and is not published.

use crate::core::format_ether;
use crate::error::BankError;
use crate::wallet::Ledger;
use alloy_primitives::U256;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Balance {
    /// Smallest-unit amount as reported by the ledger.
    pub wei: U256,
    /// Monotonic sequence number of the query that produced this value.
    pub as_of: u64,
}

impl Balance {
    /// Decimal display form, e.g. `2.0`.
    pub fn display(&self) -> String {
        format_ether(self.wei)
    }

    pub fn view(&self) -> BalanceView {
        BalanceView { value: self.display(), wei: self.wei.to_string(), as_of: self.as_of }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub value: String,
    pub wei: String,
    pub as_of: u64,
}

pub type SubscriberId = usize;

type Subscriber = Rc<dyn Fn(&Balance)>;

#[derive(Default)]
pub struct BalanceSync {
    current: RefCell<Balance>,
    tickets: Cell<u64>,
    subscribers: RefCell<Vec<(SubscriberId, Subscriber)>>,
    next_subscriber: Cell<SubscriberId>,
}

impl BalanceSync {
    pub fn new() -> Self { Self::default() }

    pub fn current(&self) -> Balance {
        self.current.borrow().clone()
    }

    /// Called with every published balance.
    pub fn subscribe(&self, callback: impl Fn(&Balance) + 'static) -> SubscriberId {
        let id = self.next_subscriber.get();
        self.next_subscriber.set(id + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    fn ticket(&self) -> u64 {
        let t = self.tickets.get() + 1;
        self.tickets.set(t);
        t
    }

    /// Query the ledger for the signing account's balance and publish it.
    ///
    /// On failure the previous balance is kept untouched.
    pub async fn refresh(&self, ledger: &dyn Ledger) -> Result<Balance, BankError> {
        let as_of = self.ticket();
        let wei = ledger.get_balance().await.map_err(|e| {
            tracing::warn!(as_of, error = %e, "balance query failed");
            BankError::QueryFailed(e.message)
        })?;
        let balance = Balance { wei, as_of };
        if self.publish(balance.clone()) {
            tracing::debug!(as_of, value = %balance.display(), "balance refreshed");
        } else {
            tracing::debug!(as_of, "stale balance result discarded");
        }
        Ok(balance)
    }

    /// Zero the displayed balance (after a disconnect).
    pub fn reset(&self) {
        let as_of = self.ticket();
        self.publish(Balance { wei: U256::ZERO, as_of });
    }

    fn publish(&self, balance: Balance) -> bool {
        {
            let mut current = self.current.borrow_mut();
            if balance.as_of < current.as_of {
                return false;
            }
            *current = balance.clone();
        }
        // snapshot so callbacks may subscribe or unsubscribe
        let subscribers: Vec<Subscriber> = self.subscribers.borrow().iter().map(|(_, s)| s.clone()).collect();
        for callback in subscribers {
            callback(&balance);
        }
        true
    }
}
