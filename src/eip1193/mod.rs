//! EIP-1193 adapter - wallet and ledger capabilities over `request(method, params)`
//!
//! The browser's `window.ethereum` and a plain JSON-RPC node speak the same
//! method set, so one adapter serves both. Only the [`Transport`] differs.
//!
//! | Capability | Method |
//! |------------|--------|
//! | accounts | `eth_requestAccounts` (falls back to `eth_accounts`) |
//! | network | `eth_chainId` |
//! | `getBalance()` | `eth_call` from the connected account |
//! | `deposit()` / `withdraw` / `transfer` | `eth_sendTransaction` |
//! | confirmation | `eth_getTransactionReceipt` polling |

#[cfg(feature = "native")]
mod http;

#[cfg(feature = "native")]
pub use http::HttpTransport;

use crate::core::abi::{self, rpc};
use crate::error::ProviderError;
use crate::wallet::{EventSink, Ledger, PendingTransaction, WalletProvider};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::rc::Rc;
use std::time::Duration;

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i64 = -32601;

#[async_trait(?Send)]
pub trait Transport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    async fn sleep(&self, duration: Duration);

    fn is_available(&self) -> bool {
        true
    }

    /// Forward wallet push events into `sink`. Transports without push
    /// notifications (plain HTTP) ignore it.
    fn subscribe(&self, _sink: EventSink) {}
}

fn expect_str(method: &str, value: &Value) -> Result<String, ProviderError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::new(format!("unexpected {} result: {}", method, value)))
}

pub struct Eip1193Wallet<T> {
    transport: Rc<T>,
    contract: Address,
    poll: Duration,
    timeout: Option<Duration>,
}

impl<T: Transport + 'static> Eip1193Wallet<T> {
    pub fn new(transport: T, contract: Address) -> Self {
        Self { transport: Rc::new(transport), contract, poll: Duration::from_secs(1), timeout: None }
    }

    pub fn with_confirmation(mut self, poll: Duration, timeout: Option<Duration>) -> Self {
        self.poll = poll;
        self.timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait(?Send)]
impl<T: Transport + 'static> WalletProvider for Eip1193Wallet<T> {
    fn is_available(&self) -> bool {
        self.transport.is_available()
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let result = match self.transport.request(rpc::REQUEST_ACCOUNTS, json!([])).await {
            Err(e) if e.code == Some(METHOD_NOT_FOUND) => self.transport.request(rpc::ACCOUNTS, json!([])).await?,
            other => other?,
        };
        let accounts = result
            .as_array()
            .ok_or_else(|| ProviderError::new(format!("unexpected {} result: {}", rpc::REQUEST_ACCOUNTS, result)))?;
        accounts.iter().map(|a| expect_str(rpc::REQUEST_ACCOUNTS, a)).collect()
    }

    async fn chain_id(&self) -> Result<String, ProviderError> {
        let result = self.transport.request(rpc::CHAIN_ID, json!([])).await?;
        expect_str(rpc::CHAIN_ID, &result)
    }

    fn subscribe(&self, sink: EventSink) {
        self.transport.subscribe(sink);
    }

    fn ledger(&self, account: Address) -> Rc<dyn Ledger> {
        Rc::new(ContractLedger {
            transport: self.transport.clone(),
            contract: self.contract,
            account,
            poll: self.poll,
            timeout: self.timeout,
        })
    }
}

/// The SimpleBank contract, called as `account`.
pub struct ContractLedger<T> {
    transport: Rc<T>,
    contract: Address,
    account: Address,
    poll: Duration,
    timeout: Option<Duration>,
}

impl<T: Transport + 'static> ContractLedger<T> {
    fn call_object(&self, data: String, value: Option<U256>) -> Value {
        let mut tx = Map::new();
        tx.insert("from".into(), json!(self.account.to_checksum(None)));
        tx.insert("to".into(), json!(self.contract.to_checksum(None)));
        tx.insert("data".into(), json!(data));
        if let Some(value) = value {
            tx.insert("value".into(), json!(abi::quantity(value)));
        }
        Value::Object(tx)
    }

    async fn send(&self, data: String, value: Option<U256>) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        let result = self
            .transport
            .request(rpc::SEND_TRANSACTION, json!([self.call_object(data, value)]))
            .await?;
        let hash = expect_str(rpc::SEND_TRANSACTION, &result)?;
        Ok(Box::new(ReceiptWatcher {
            transport: self.transport.clone(),
            hash,
            poll: self.poll,
            timeout: self.timeout,
        }))
    }
}

#[async_trait(?Send)]
impl<T: Transport + 'static> Ledger for ContractLedger<T> {
    fn account(&self) -> Address {
        self.account
    }

    async fn get_balance(&self) -> Result<U256, ProviderError> {
        let result = self
            .transport
            .request(rpc::CALL, json!([self.call_object(abi::get_balance(), None), "latest"]))
            .await?;
        let data = expect_str(rpc::CALL, &result)?;
        abi::decode_u256(&data).map_err(ProviderError::new)
    }

    async fn deposit(&self, value: U256) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        self.send(abi::deposit(), Some(value)).await
    }

    async fn withdraw(&self, amount: U256) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        self.send(abi::withdraw(amount), None).await
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        self.send(abi::transfer(to, amount), None).await
    }
}

/// Polls for the receipt of a submitted transaction.
pub struct ReceiptWatcher<T> {
    transport: Rc<T>,
    hash: String,
    poll: Duration,
    timeout: Option<Duration>,
}

#[async_trait(?Send)]
impl<T: Transport + 'static> PendingTransaction for ReceiptWatcher<T> {
    fn id(&self) -> &str {
        &self.hash
    }

    async fn wait(&self) -> Result<(), ProviderError> {
        let mut waited = Duration::ZERO;
        loop {
            let receipt = self.transport.request(rpc::GET_RECEIPT, json!([self.hash])).await?;
            if !receipt.is_null() {
                return match receipt.get("status").and_then(Value::as_str) {
                    Some("0x0") => Err(ProviderError::new(format!("transaction reverted: {}", self.hash))),
                    _ => Ok(()),
                };
            }
            if let Some(limit) = self.timeout {
                if waited >= limit {
                    return Err(ProviderError::new(format!("timed out waiting for {}", self.hash)));
                }
            }
            self.transport.sleep(self.poll).await;
            waited += self.poll;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses and records every request.
    #[derive(Default)]
    struct Script {
        replies: RefCell<VecDeque<Result<Value, ProviderError>>>,
        seen: RefCell<Vec<(String, Value)>>,
    }

    impl Script {
        fn reply(self, r: Result<Value, ProviderError>) -> Self {
            self.replies.borrow_mut().push_back(r);
            self
        }
    }

    #[async_trait(?Send)]
    impl Transport for Script {
        async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
            self.seen.borrow_mut().push((method.to_string(), params));
            self.replies.borrow_mut().pop_front().unwrap_or(Ok(Value::Null))
        }

        async fn sleep(&self, _duration: Duration) {}
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

    fn account() -> Address {
        ACCOUNT.parse().unwrap()
    }

    #[test]
    fn falls_back_to_eth_accounts() {
        let script = Script::default()
            .reply(Err(ProviderError::with_code(METHOD_NOT_FOUND, "method not found")))
            .reply(Ok(json!([ACCOUNT])));
        let wallet = Eip1193Wallet::new(script, Address::ZERO);
        let accounts = block_on(wallet.request_accounts()).unwrap();
        assert_eq!(accounts, vec![ACCOUNT.to_string()]);
        let seen = wallet.transport().seen.borrow();
        assert_eq!(seen[1].0, rpc::ACCOUNTS);
    }

    #[test]
    fn deposit_attaches_value_and_waits_for_receipt() {
        let script = Script::default()
            .reply(Ok(json!("0xfeed")))
            .reply(Ok(Value::Null))
            .reply(Ok(json!({"status": "0x1"})));
        let wallet = Eip1193Wallet::new(script, Address::ZERO);
        let ledger = wallet.ledger(account());
        let pending = block_on(ledger.deposit(U256::from(1_500_000_000_000_000_000u64))).unwrap();
        assert_eq!(pending.id(), "0xfeed");
        block_on(pending.wait()).unwrap();

        let seen = wallet.transport().seen.borrow();
        assert_eq!(seen[0].0, rpc::SEND_TRANSACTION);
        assert_eq!(seen[0].1[0]["value"], "0x14d1120d7b160000");
        assert_eq!(seen[0].1[0]["data"], "0xd0e30db0");
        assert_eq!(seen.iter().filter(|(m, _)| m == rpc::GET_RECEIPT).count(), 2);
    }

    #[test]
    fn reverted_receipt_is_an_error() {
        let script = Script::default()
            .reply(Ok(json!("0xdead")))
            .reply(Ok(json!({"status": "0x0"})));
        let wallet = Eip1193Wallet::new(script, Address::ZERO);
        let ledger = wallet.ledger(account());
        let pending = block_on(ledger.withdraw(U256::from(1u64))).unwrap();
        let err = block_on(pending.wait()).unwrap_err();
        assert_eq!(err.message, "transaction reverted: 0xdead");
    }

    #[test]
    fn confirmation_timeout() {
        let script = Script::default().reply(Ok(json!("0xslow")));
        let wallet = Eip1193Wallet::new(script, Address::ZERO)
            .with_confirmation(Duration::from_millis(10), Some(Duration::from_millis(30)));
        let ledger = wallet.ledger(account());
        let pending = block_on(ledger.withdraw(U256::from(1u64))).unwrap();
        let err = block_on(pending.wait()).unwrap_err();
        assert_eq!(err.message, "timed out waiting for 0xslow");
    }

    #[test]
    fn balance_is_decoded_from_call_output() {
        let word = format!("0x{:0>64}", "1bc16d674ec80000");
        let script = Script::default().reply(Ok(json!(word)));
        let wallet = Eip1193Wallet::new(script, Address::ZERO);
        let ledger = wallet.ledger(account());
        let wei = block_on(ledger.get_balance()).unwrap();
        assert_eq!(wei, U256::from(2_000_000_000_000_000_000u64));
        let seen = wallet.transport().seen.borrow();
        assert_eq!(seen[0].1[1], "latest");
        assert_eq!(seen[0].1[0]["data"], "0x12065fe0");
    }
}
