//! EventListener - wallet notifications as an explicit message channel
//!
//! Each `connect()` attaches a fresh [`EventSink`] generation. Sinks from an
//! earlier generation go dead, so a provider holding on to them stops
//! delivering and the listener ignores anything still in flight.

use super::WalletEvent;
use crate::core::parse_address;
use alloy_primitives::Address;
use futures::channel::mpsc;
use futures::StreamExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Normalized notification applied to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// The wallet switched to another account.
    AccountSwitched(Address),
    /// The wallet reported an empty account list.
    Disconnected,
    /// The wallet switched networks; client state must be rebuilt.
    NetworkChanged(String),
}

type Tagged = (u64, WalletEvent);

/// Sending half handed to a [`super::WalletProvider`].
#[derive(Clone)]
pub struct EventSink {
    generation: u64,
    live: Rc<Cell<u64>>,
    tx: mpsc::UnboundedSender<Tagged>,
}

impl EventSink {
    /// Deliver an event. Returns false once the sink is stale; drop it then.
    pub fn send(&self, event: WalletEvent) -> bool {
        self.is_live() && self.tx.unbounded_send((self.generation, event)).is_ok()
    }

    pub fn is_live(&self) -> bool {
        self.live.get() == self.generation && !self.tx.is_closed()
    }
}

pub struct EventListener {
    live: Rc<Cell<u64>>,
    attached: Cell<bool>,
    tx: mpsc::UnboundedSender<Tagged>,
    rx: RefCell<mpsc::UnboundedReceiver<Tagged>>,
}

impl Default for EventListener {
    fn default() -> Self { Self::new() }
}

impl EventListener {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded();
        Self { live: Rc::new(Cell::new(0)), attached: Cell::new(false), tx, rx: RefCell::new(rx) }
    }

    /// Start a new generation. Every previously issued sink goes stale.
    pub(crate) fn attach(&self) -> EventSink {
        let generation = self.live.get() + 1;
        self.live.set(generation);
        self.attached.set(true);
        EventSink { generation, live: self.live.clone(), tx: self.tx.clone() }
    }

    pub(crate) fn detach(&self) {
        if self.attached.replace(false) {
            self.live.set(self.live.get() + 1);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    pub fn normalize(event: WalletEvent) -> Option<SessionChange> {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                None => Some(SessionChange::Disconnected),
                Some(raw) => match parse_address(raw) {
                    Ok(account) => Some(SessionChange::AccountSwitched(account)),
                    Err(_) => {
                        tracing::warn!(account = raw.as_str(), "ignoring malformed accountsChanged");
                        None
                    }
                },
            },
            WalletEvent::ChainChanged(chain) => Some(SessionChange::NetworkChanged(chain)),
        }
    }

    fn accept(&self, (generation, event): Tagged) -> Option<SessionChange> {
        if generation != self.live.get() {
            tracing::debug!(generation, "dropping event from stale subscription");
            return None;
        }
        Self::normalize(event)
    }

    /// Everything queued right now, without waiting.
    pub fn drain(&self) -> Vec<SessionChange> {
        let mut out = Vec::new();
        loop {
            let next = self.rx.borrow_mut().try_next();
            match next {
                Ok(Some(tagged)) => out.extend(self.accept(tagged)),
                _ => break,
            }
        }
        out
    }

    /// Wait for the next change. `None` after [`EventListener::close`].
    pub async fn next(&self) -> Option<SessionChange> {
        loop {
            let tagged = futures::future::poll_fn(|cx| self.rx.borrow_mut().poll_next_unpin(cx)).await?;
            if let Some(change) = self.accept(tagged) {
                return Some(change);
            }
        }
    }

    /// Stop accepting events; `next()` returns `None` once the queue is empty.
    pub fn close(&self) {
        self.detach();
        // wakes a pending next()
        self.tx.close_channel();
        self.rx.borrow_mut().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn normalizes_wallet_events() {
        assert_eq!(
            EventListener::normalize(WalletEvent::AccountsChanged(vec![])),
            Some(SessionChange::Disconnected)
        );
        assert_eq!(
            EventListener::normalize(WalletEvent::AccountsChanged(vec![A.into()])),
            Some(SessionChange::AccountSwitched(parse_address(A).unwrap()))
        );
        assert_eq!(EventListener::normalize(WalletEvent::AccountsChanged(vec!["nope".into()])), None);
        assert_eq!(
            EventListener::normalize(WalletEvent::ChainChanged("0x1".into())),
            Some(SessionChange::NetworkChanged("0x1".into()))
        );
    }

    #[test]
    fn stale_sinks_are_ignored() {
        let listener = EventListener::new();
        let first = listener.attach();
        assert!(first.send(WalletEvent::ChainChanged("0x1".into())));
        let second = listener.attach();
        assert!(!first.is_live());
        assert!(!first.send(WalletEvent::ChainChanged("0x2".into())));
        assert!(second.send(WalletEvent::AccountsChanged(vec![])));

        // the event queued by the first generation is discarded on arrival
        assert_eq!(listener.drain(), vec![SessionChange::Disconnected]);

        listener.detach();
        assert!(!second.send(WalletEvent::AccountsChanged(vec![])));
        assert!(listener.drain().is_empty());
    }
}
