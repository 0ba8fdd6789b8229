//! WASM module: SimpleBank in the browser
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           BankApp (JS API)              │
//! │  connect, disconnect, currentSession,   │
//! │  currentBalance, subscribeBalance,      │
//! │  submitDeposit/Withdraw/Transfer        │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │              BankClient                 │
//! │  session, guard, balance, orchestrator  │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     Eip1193Wallet<BrowserTransport>     │
//! │  window.ethereum.request / .on          │
//! └─────────────────────────────────────────┘
//! ```

mod app;
mod ethereum;

pub use app::BankApp;
pub use ethereum::BrowserTransport;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
