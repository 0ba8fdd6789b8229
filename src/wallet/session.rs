//! WalletSession - connection to the external wallet
//!
//! Sole owner of the [`Session`]. A session exists iff an account is
//! connected, and its signing handle is always bound to that account.

use super::{EventListener, Ledger, NetworkGuard, SessionChange, WalletProvider};
use crate::core::{parse_address, short_address};
use crate::error::{BankError, ProviderError};
use alloy_primitives::Address;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub struct Session {
    account: Address,
    chain_id: String,
    signer: Rc<dyn Ledger>,
    operational: bool,
}

impl Session {
    pub fn account(&self) -> Address { self.account }
    pub fn chain_id(&self) -> &str { &self.chain_id }
    pub fn signing_handle(&self) -> Rc<dyn Ledger> { self.signer.clone() }

    /// False when the wallet is on the wrong network. No calls may be submitted.
    pub fn is_operational(&self) -> bool { self.operational }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("operational", &self.operational)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub account: Option<String>,
    pub short_account: Option<String>,
    pub chain_id: Option<String>,
    pub connected: bool,
    pub operational: bool,
    pub reload_required: bool,
}

/// What applying a [`SessionChange`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    AccountSwitched,
    Disconnected,
    Reset,
    Ignored,
}

pub struct WalletSession {
    provider: Rc<dyn WalletProvider>,
    guard: NetworkGuard,
    listener: EventListener,
    session: RefCell<Option<Session>>,
    reload_required: Cell<bool>,
}

impl WalletSession {
    pub fn new(provider: Rc<dyn WalletProvider>, guard: NetworkGuard) -> Self {
        Self {
            provider,
            guard,
            listener: EventListener::new(),
            session: RefCell::new(None),
            reload_required: Cell::new(false),
        }
    }

    pub fn guard(&self) -> &NetworkGuard { &self.guard }
    pub fn listener(&self) -> &EventListener { &self.listener }

    /// Request account access and network identity.
    ///
    /// A wallet on the wrong network still yields a session, flagged
    /// non-operational. Wallet listeners are registered once per call.
    pub async fn connect(&self) -> Result<Session, BankError> {
        if !self.provider.is_available() {
            return Err(BankError::WalletUnavailable);
        }

        let accounts = self.provider.request_accounts().await.map_err(connect_error)?;
        let first = accounts.first().ok_or(BankError::NotConnected)?;
        let account = parse_address(first)
            .map_err(|_| BankError::ConnectionFailed(format!("wallet returned a malformed account {:?}", first)))?;
        let chain_id = self.provider.chain_id().await.map_err(connect_error)?;
        let operational = self.guard.passes(&chain_id);

        let session = Session {
            account,
            chain_id,
            signer: self.provider.ledger(account),
            operational,
        };
        *self.session.borrow_mut() = Some(session.clone());
        self.reload_required.set(false);
        self.provider.subscribe(self.listener.attach());

        tracing::info!(account = %account, chain = session.chain_id.as_str(), operational, "wallet connected");
        Ok(session)
    }

    /// Forget the session. Never talks to the wallet; safe to repeat.
    pub fn disconnect(&self) {
        self.listener.detach();
        if let Some(old) = self.session.borrow_mut().take() {
            tracing::info!(account = %old.account, "wallet disconnected");
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    pub fn account(&self) -> Option<Address> {
        self.session.borrow().as_ref().map(|s| s.account)
    }

    pub fn is_connected(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// True after a network switch tore the session down, until `connect()`.
    pub fn reload_required(&self) -> bool {
        self.reload_required.get()
    }

    pub fn signing_handle(&self) -> Result<Rc<dyn Ledger>, BankError> {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.signer.clone())
            .ok_or(BankError::NotConnected)
    }

    /// Signing handle for a state-changing call: connected and on the right network.
    pub fn operational_handle(&self) -> Result<Rc<dyn Ledger>, BankError> {
        let session = self.current().ok_or(BankError::NotConnected)?;
        if !session.operational {
            self.guard.verify(&session.chain_id)?;
        }
        Ok(session.signer)
    }

    pub fn info(&self) -> SessionInfo {
        let session = self.session.borrow();
        match session.as_ref() {
            Some(s) => {
                let account = s.account.to_checksum(None);
                SessionInfo {
                    short_account: Some(short_address(&account)),
                    account: Some(account),
                    chain_id: Some(s.chain_id.clone()),
                    connected: true,
                    operational: s.operational,
                    reload_required: false,
                }
            }
            None => SessionInfo {
                account: None,
                short_account: None,
                chain_id: None,
                connected: false,
                operational: false,
                reload_required: self.reload_required.get(),
            },
        }
    }

    /// Apply a normalized wallet notification.
    pub fn apply(&self, change: SessionChange) -> Applied {
        match change {
            SessionChange::AccountSwitched(account) => {
                let mut guard = self.session.borrow_mut();
                match guard.as_mut() {
                    Some(session) if session.account == account => Applied::Ignored,
                    Some(session) => {
                        tracing::info!(from = %session.account, to = %account, "account switched");
                        session.account = account;
                        session.signer = self.provider.ledger(account);
                        Applied::AccountSwitched
                    }
                    None => Applied::Ignored,
                }
            }
            SessionChange::Disconnected => {
                self.disconnect();
                Applied::Disconnected
            }
            SessionChange::NetworkChanged(chain) => {
                tracing::info!(chain = chain.as_str(), "network changed, session reset");
                self.disconnect();
                self.reload_required.set(true);
                Applied::Reset
            }
        }
    }
}

fn connect_error(e: ProviderError) -> BankError {
    if e.is_user_rejection() {
        BankError::UserRejected(e.message)
    } else {
        BankError::ConnectionFailed(e.message)
    }
}
