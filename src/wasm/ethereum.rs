//! `window.ethereum` as an EIP-1193 [`Transport`].
//!
//! `accountsChanged` / `chainChanged` listeners are registered with the
//! injected provider once per page. They fan out to every live
//! [`EventSink`]; sinks from an earlier connect are pruned on delivery.

use super::log;
use crate::core::abi::events;
use crate::eip1193::Transport;
use crate::error::ProviderError;
use crate::wallet::{EventSink, WalletEvent};
use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

type Sinks = Rc<RefCell<Vec<EventSink>>>;

/// Listener closures, kept alive for as long as the transport.
struct Hooks {
    _accounts: Closure<dyn FnMut(JsValue)>,
    _chain: Closure<dyn FnMut(JsValue)>,
}

#[derive(Default)]
pub struct BrowserTransport {
    sinks: Sinks,
    hooks: RefCell<Option<Hooks>>,
}

impl BrowserTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ethereum() -> Option<JsValue> {
    let window = web_sys::window()?;
    let provider = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
    if provider.is_undefined() || provider.is_null() {
        None
    } else {
        Some(provider)
    }
}

fn method(target: &JsValue, name: &str) -> Result<Function, ProviderError> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| ProviderError::new(format!("injected wallet has no {}()", name)))
}

/// EIP-1193 errors are `{ code, message }` objects; anything else is stringified.
fn provider_error(value: JsValue) -> ProviderError {
    let message = Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    match Reflect::get(&value, &JsValue::from_str("code")).ok().and_then(|c| c.as_f64()) {
        Some(code) => ProviderError::with_code(code as i64, message),
        None => ProviderError::new(message),
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, ProviderError> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(|e| ProviderError::new(e.to_string()))
}

fn fan_out(sinks: &Sinks, event: WalletEvent) {
    sinks.borrow_mut().retain(|sink| sink.send(event.clone()));
}

#[async_trait(?Send)]
impl Transport for BrowserTransport {
    async fn request(&self, name: &str, params: Value) -> Result<Value, ProviderError> {
        let provider = ethereum().ok_or_else(|| ProviderError::new("no injected wallet"))?;
        let request = method(&provider, "request")?;

        let args = Object::new();
        let _ = Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(name));
        let _ = Reflect::set(&args, &JsValue::from_str("params"), &to_js(&params)?);

        let promise: Promise = request
            .call1(&provider, &args)
            .map_err(provider_error)?
            .dyn_into()
            .map_err(|_| ProviderError::new(format!("{} did not return a promise", name)))?;
        let result = JsFuture::from(promise).await.map_err(provider_error)?;
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::new(e.to_string()))
    }

    async fn sleep(&self, duration: Duration) {
        let Some(window) = web_sys::window() else { return };
        let ms = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = Promise::new(&mut |resolve, _reject| {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        });
        let _ = JsFuture::from(promise).await;
    }

    fn is_available(&self) -> bool {
        ethereum().is_some()
    }

    fn subscribe(&self, sink: EventSink) {
        self.sinks.borrow_mut().push(sink);
        if self.hooks.borrow().is_some() {
            return;
        }
        let Some(provider) = ethereum() else { return };
        let Ok(on) = method(&provider, "on") else {
            log!("[SimpleBank] wallet does not emit events");
            return;
        };

        let sinks = self.sinks.clone();
        let accounts = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let list: Vec<String> = serde_wasm_bindgen::from_value(value).unwrap_or_default();
            fan_out(&sinks, WalletEvent::AccountsChanged(list));
        });
        let sinks = self.sinks.clone();
        let chain = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let chain_id = value.as_string().unwrap_or_default();
            fan_out(&sinks, WalletEvent::ChainChanged(chain_id));
        });

        let _ = on.call2(&provider, &JsValue::from_str(events::ACCOUNTS_CHANGED), accounts.as_ref().unchecked_ref());
        let _ = on.call2(&provider, &JsValue::from_str(events::CHAIN_CHANGED), chain.as_ref().unchecked_ref());
        *self.hooks.borrow_mut() = Some(Hooks { _accounts: accounts, _chain: chain });
    }
}
