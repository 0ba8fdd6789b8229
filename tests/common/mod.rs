//! In-memory wallet + SimpleBank ledger for integration tests.
//!
//! Confirmations are immediate by default. With `hold_confirmations()` every
//! submission parks until the test calls `confirm(i)` / `revert(i, msg)`.

#![allow(dead_code)]

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use futures::channel::oneshot;
use once_cell::sync::Lazy;
use simplebank::wallet::EventSink;
use simplebank::{
    parse_address, parse_ether, BankClient, BankConfig, Ledger, NoticeLog, PendingTransaction,
    ProviderError, WalletEvent, WalletProvider,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

pub const SEPOLIA: &str = "0xaa36a7";
pub const MAINNET: &str = "0x1";

pub const ALICE_HEX: &str = "0x1111111111111111111111111111111111111111";
pub const BOB_HEX: &str = "0xABCD000000000000000000000000000000001234";

pub static ALICE: Lazy<Address> = Lazy::new(|| parse_address(ALICE_HEX).unwrap());
pub static BOB: Lazy<Address> = Lazy::new(|| parse_address(BOB_HEX).unwrap());

pub fn eth(amount: &str) -> U256 {
    parse_ether(amount).unwrap()
}

pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Yield until `cond` holds. Lets a driver future interleave with the client.
pub async fn until(cond: impl Fn() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetBalance(Address),
    Deposit(Address, U256),
    Withdraw(Address, U256),
    Transfer(Address, Address, U256),
}

type Release = oneshot::Sender<Result<(), String>>;

/// Ledger state plus a record of every contact.
#[derive(Default)]
pub struct MockBank {
    balances: RefCell<HashMap<Address, U256>>,
    calls: RefCell<Vec<Call>>,
    hold: Cell<bool>,
    parked: RefCell<Vec<Option<Release>>>,
    reject_next_submit: RefCell<Option<ProviderError>>,
    fail_queries: RefCell<Option<String>>,
    next_tx: Cell<u64>,
}

impl MockBank {
    pub fn set_balance(&self, account: Address, wei: U256) {
        self.balances.borrow_mut().insert(account, wei);
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.balances.borrow().get(&account).copied().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn submissions(&self) -> usize {
        self.calls.borrow().iter().filter(|c| !matches!(c, Call::GetBalance(_))).count()
    }

    pub fn queries(&self) -> usize {
        self.calls.borrow().iter().filter(|c| matches!(c, Call::GetBalance(_))).count()
    }

    pub fn hold_confirmations(&self) {
        self.hold.set(true);
    }

    pub fn parked(&self) -> usize {
        self.parked.borrow().len()
    }

    pub fn confirm(&self, index: usize) {
        self.release(index, Ok(()));
    }

    pub fn revert(&self, index: usize, message: &str) {
        self.release(index, Err(message.to_string()));
    }

    fn release(&self, index: usize, outcome: Result<(), String>) {
        let tx = self.parked.borrow_mut()[index].take().expect("already released");
        let _ = tx.send(outcome);
    }

    pub fn reject_next_submit(&self, err: ProviderError) {
        *self.reject_next_submit.borrow_mut() = Some(err);
    }

    pub fn fail_queries(&self, message: Option<&str>) {
        *self.fail_queries.borrow_mut() = message.map(str::to_string);
    }

    fn apply(&self, call: &Call) -> Result<(), String> {
        let mut balances = self.balances.borrow_mut();
        match *call {
            Call::Deposit(from, value) => {
                *balances.entry(from).or_default() += value;
            }
            Call::Withdraw(from, amount) => {
                let held = balances.entry(from).or_default();
                if *held < amount {
                    return Err("execution reverted: Insufficient balance".into());
                }
                *held -= amount;
            }
            Call::Transfer(from, to, amount) => {
                let held = balances.entry(from).or_default();
                if *held < amount {
                    return Err("execution reverted: Insufficient balance".into());
                }
                *held -= amount;
                *balances.entry(to).or_default() += amount;
            }
            Call::GetBalance(_) => {}
        }
        Ok(())
    }
}

pub struct MockLedger {
    bank: Rc<MockBank>,
    account: Address,
}

impl MockLedger {
    fn submit(&self, call: Call) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        self.bank.calls.borrow_mut().push(call.clone());
        if let Some(err) = self.bank.reject_next_submit.borrow_mut().take() {
            return Err(err);
        }
        let n = self.bank.next_tx.get() + 1;
        self.bank.next_tx.set(n);
        let gate = if self.bank.hold.get() {
            let (tx, rx) = oneshot::channel();
            self.bank.parked.borrow_mut().push(Some(tx));
            Some(rx)
        } else {
            None
        };
        Ok(Box::new(MockPending {
            id: format!("0x{:064x}", n),
            bank: self.bank.clone(),
            call,
            gate: RefCell::new(gate),
        }))
    }
}

#[async_trait(?Send)]
impl Ledger for MockLedger {
    fn account(&self) -> Address {
        self.account
    }

    async fn get_balance(&self) -> Result<U256, ProviderError> {
        self.bank.calls.borrow_mut().push(Call::GetBalance(self.account));
        if let Some(message) = self.bank.fail_queries.borrow().clone() {
            return Err(ProviderError::new(message));
        }
        Ok(self.bank.balance(self.account))
    }

    async fn deposit(&self, value: U256) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        self.submit(Call::Deposit(self.account, value))
    }

    async fn withdraw(&self, amount: U256) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        self.submit(Call::Withdraw(self.account, amount))
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        self.submit(Call::Transfer(self.account, to, amount))
    }
}

pub struct MockPending {
    id: String,
    bank: Rc<MockBank>,
    call: Call,
    gate: RefCell<Option<oneshot::Receiver<Result<(), String>>>>,
}

#[async_trait(?Send)]
impl PendingTransaction for MockPending {
    fn id(&self) -> &str {
        &self.id
    }

    async fn wait(&self) -> Result<(), ProviderError> {
        let gate = self.gate.borrow_mut().take();
        if let Some(rx) = gate {
            match rx.await {
                Ok(Ok(())) => {}
                Ok(Err(message)) => return Err(ProviderError::new(message)),
                Err(_) => return Err(ProviderError::new("dropped")),
            }
        }
        self.bank.apply(&self.call).map_err(ProviderError::new)
    }
}

/// Injected-wallet stand-in.
pub struct MockWallet {
    pub bank: Rc<MockBank>,
    available: Cell<bool>,
    accounts: RefCell<Result<Vec<String>, ProviderError>>,
    chain: RefCell<String>,
    sinks: RefCell<Vec<EventSink>>,
    subscriptions: Cell<usize>,
}

impl MockWallet {
    pub fn new(bank: Rc<MockBank>) -> Self {
        Self {
            bank,
            available: Cell::new(true),
            accounts: RefCell::new(Ok(vec![ALICE_HEX.to_string()])),
            chain: RefCell::new(SEPOLIA.to_string()),
            sinks: RefCell::new(Vec::new()),
            subscriptions: Cell::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    pub fn set_accounts(&self, accounts: Result<Vec<&str>, ProviderError>) {
        *self.accounts.borrow_mut() = accounts.map(|a| a.into_iter().map(str::to_string).collect());
    }

    pub fn set_chain(&self, chain: &str) {
        *self.chain.borrow_mut() = chain.to_string();
    }

    pub fn subscriptions(&self) -> usize {
        self.subscriptions.get()
    }

    /// Push an event to every live subscriber.
    pub fn emit(&self, event: WalletEvent) {
        self.sinks.borrow_mut().retain(|sink| sink.send(event.clone()));
    }

    pub fn switch_account(&self, account: &str) {
        self.set_accounts(Ok(vec![account]));
        self.emit(WalletEvent::AccountsChanged(vec![account.to_string()]));
    }

    pub fn lock(&self) {
        self.set_accounts(Ok(vec![]));
        self.emit(WalletEvent::AccountsChanged(vec![]));
    }

    pub fn switch_chain(&self, chain: &str) {
        self.set_chain(chain);
        self.emit(WalletEvent::ChainChanged(chain.to_string()));
    }
}

#[async_trait(?Send)]
impl WalletProvider for MockWallet {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.accounts.borrow().clone()
    }

    async fn chain_id(&self) -> Result<String, ProviderError> {
        Ok(self.chain.borrow().clone())
    }

    fn subscribe(&self, sink: EventSink) {
        self.subscriptions.set(self.subscriptions.get() + 1);
        self.sinks.borrow_mut().push(sink);
    }

    fn ledger(&self, account: Address) -> Rc<dyn Ledger> {
        Rc::new(MockLedger { bank: self.bank.clone(), account })
    }
}

pub struct Harness {
    pub bank: Rc<MockBank>,
    pub wallet: Rc<MockWallet>,
    pub notices: Rc<NoticeLog>,
    pub client: BankClient,
}

/// Alice on Sepolia holding 2.0 in the bank. Not yet connected.
pub fn harness() -> Harness {
    let bank = Rc::new(MockBank::default());
    bank.set_balance(*ALICE, eth("2.0"));
    let wallet = Rc::new(MockWallet::new(bank.clone()));
    let notices = Rc::new(NoticeLog::new());
    let client = BankClient::with_notifier(wallet.clone(), BankConfig::default(), notices.clone());
    Harness { bank, wallet, notices, client }
}

impl Harness {
    pub fn titles(&self) -> Vec<String> {
        self.notices.titles()
    }
}
