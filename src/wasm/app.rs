//! BankApp: the JS-facing client
//!
//! Promise-returning methods resolve with plain objects and reject with
//! `{ kind, title, message }` (an `ErrorReport`).

use super::ethereum::BrowserTransport;
use super::log;
use crate::client::{BankClient, BankConfig};
use crate::core::ChainId;
use crate::eip1193::Eip1193Wallet;
use crate::error::BankError;
use crate::notify::{Notice, NoticeId, NoticeLog, Notifier};
use crate::orchestrator::OperationKind;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}

fn reject(err: BankError) -> JsValue {
    to_js(&err.report())
}

/// Keeps notice history and forwards each change to an optional JS callback.
#[derive(Default)]
struct JsNotifier {
    log: NoticeLog,
    callback: RefCell<Option<js_sys::Function>>,
}

impl JsNotifier {
    fn emit(&self, id: NoticeId) {
        let callback = self.callback.borrow().clone();
        if let Some(callback) = callback {
            if let Some(entry) = self.log.all().into_iter().find(|e| e.id == id) {
                let _ = callback.call1(&JsValue::NULL, &to_js(&entry));
            }
        }
    }
}

impl Notifier for JsNotifier {
    fn show(&self, notice: Notice) -> NoticeId {
        self.log.prune();
        let id = self.log.show(notice);
        self.emit(id);
        id
    }

    fn dismiss(&self, id: NoticeId) {
        self.log.dismiss(id);
        self.emit(id);
    }
}

#[wasm_bindgen]
pub struct BankApp {
    client: Rc<BankClient>,
    notices: Rc<JsNotifier>,
    listening: Cell<bool>,
}

#[wasm_bindgen]
impl BankApp {
    /// Client for the default deployment (SimpleBank on Sepolia).
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::build(BankConfig::default())
    }

    /// Client for another deployment. `chain_id` is hex (`0xaa36a7`) or decimal.
    #[wasm_bindgen(js_name = "withConfig")]
    pub fn with_config(contract: &str, chain_id: &str) -> Result<BankApp, JsValue> {
        let contract = crate::core::parse_address(contract)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let chain: ChainId = chain_id.parse().map_err(|e: String| JsValue::from_str(&e))?;
        Ok(Self::build(BankConfig::new().with_contract(contract).with_required_chain(chain)))
    }

    /// Connect the wallet. Resolves with the session snapshot.
    #[wasm_bindgen]
    pub async fn connect(&self) -> Result<JsValue, JsValue> {
        let info = self.client.connect().await.map_err(reject)?;
        if !self.listening.replace(true) {
            let client = self.client.clone();
            spawn_local(async move { client.run_events().await });
        }
        Ok(to_js(&info))
    }

    #[wasm_bindgen]
    pub fn disconnect(&self) {
        self.client.disconnect();
    }

    #[wasm_bindgen(js_name = "currentSession")]
    pub fn current_session(&self) -> JsValue {
        to_js(&self.client.current_session())
    }

    #[wasm_bindgen(js_name = "currentBalance")]
    pub fn current_balance(&self) -> JsValue {
        to_js(&self.client.current_balance().view())
    }

    /// Call `callback({ value, wei, asOf })` on every published balance.
    #[wasm_bindgen(js_name = "subscribeBalance")]
    pub fn subscribe_balance(&self, callback: js_sys::Function) -> usize {
        self.client.subscribe_balance(move |balance| {
            let _ = callback.call1(&JsValue::NULL, &to_js(&balance.view()));
        })
    }

    #[wasm_bindgen(js_name = "unsubscribeBalance")]
    pub fn unsubscribe_balance(&self, id: usize) -> bool {
        self.client.unsubscribe_balance(id)
    }

    #[wasm_bindgen(js_name = "refreshBalance")]
    pub async fn refresh_balance(&self) -> Result<JsValue, JsValue> {
        let balance = self.client.refresh_balance().await.map_err(reject)?;
        Ok(to_js(&balance.view()))
    }

    #[wasm_bindgen(js_name = "submitDeposit")]
    pub async fn submit_deposit(&self, amount: String) -> Result<JsValue, JsValue> {
        let receipt = self.client.submit_deposit(&amount).await.map_err(reject)?;
        Ok(to_js(&receipt))
    }

    #[wasm_bindgen(js_name = "submitWithdraw")]
    pub async fn submit_withdraw(&self, amount: String) -> Result<JsValue, JsValue> {
        let receipt = self.client.submit_withdraw(&amount).await.map_err(reject)?;
        Ok(to_js(&receipt))
    }

    #[wasm_bindgen(js_name = "submitTransfer")]
    pub async fn submit_transfer(&self, amount: String, recipient: String) -> Result<JsValue, JsValue> {
        let receipt = self.client.submit_transfer(&amount, &recipient).await.map_err(reject)?;
        Ok(to_js(&receipt))
    }

    /// `kind` is `deposit`, `withdraw` or `transfer`.
    #[wasm_bindgen(js_name = "isBusy")]
    pub fn is_busy(&self, kind: &str) -> bool {
        OperationKind::ALL
            .iter()
            .find(|k| k.as_str() == kind)
            .map(|k| self.client.is_busy(*k))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = "pendingTransactions")]
    pub fn pending_transactions(&self) -> JsValue {
        to_js(&self.client.pending_transactions())
    }

    /// Notices not yet dismissed or expired.
    #[wasm_bindgen]
    pub fn notices(&self) -> JsValue {
        self.notices.log.prune();
        to_js(&self.notices.log.visible())
    }

    /// Call `callback(notice)` whenever a notice is shown or dismissed.
    #[wasm_bindgen(js_name = "onNotice")]
    pub fn on_notice(&self, callback: js_sys::Function) {
        *self.notices.callback.borrow_mut() = Some(callback);
    }

    #[wasm_bindgen(js_name = "dismissNotice")]
    pub fn dismiss_notice(&self, id: u64) {
        self.notices.dismiss(id);
    }

    /// Stop listening for wallet events.
    #[wasm_bindgen]
    pub fn close(&self) {
        self.client.close();
    }
}

impl BankApp {
    fn build(config: BankConfig) -> Self {
        log!("[SimpleBank] contract {} on {}", config.contract(), config.required_chain());
        let wallet = Eip1193Wallet::new(BrowserTransport::new(), config.contract())
            .with_confirmation(config.confirmation_poll, config.confirmation_timeout);
        let notices = Rc::new(JsNotifier::default());
        let client = BankClient::with_notifier(Rc::new(wallet), config, notices.clone());
        Self { client: Rc::new(client), notices, listening: Cell::new(false) }
    }
}

impl Default for BankApp {
    fn default() -> Self {
        Self::new()
    }
}
