//! # edge-wallet
//!
//! WebAssembly wallet connector for the payment pages.
//!
//! This crate provides:
//! - Detection of injected EIP-1193 providers (MetaMask, Coinbase, Brave, Trust)
//! - A connection state machine persisted in `localStorage`
//! - Account, chain and disconnect event handling
//! - The "Connect Wallet" flow: install prompt, direct connect or picker
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WalletConnector } from './edge_wallet.js';
//!
//! await init();
//!
//! const wallet = new WalletConnector();
//! console.log(wallet.availableWallets());
//!
//! await wallet.restore();
//! document.getElementById('connect-wallet-btn')
//!     .addEventListener('click', () => wallet.showWalletModal());
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

pub mod bindings;
pub mod connector;
pub mod modal;
pub mod wallet;

pub use bindings::{injected_providers, BrowserStorage, InjectedProvider, WalletConnector};
pub use connector::{
    choose_wallet, shorten, AccountRequest, ConnectionState, Connector, EventOutcome,
    ProviderEvent, WalletChoice, WalletError, WalletProvider, WalletStorage, INSTALL_LINKS,
    SELECTED_WALLET_KEY, USER_ADDRESS_KEY,
};
pub use wallet::{
    available_wallets, detect_provider, ProviderDescriptor, ProviderFlags, WalletKind,
    WalletOption,
};

use wasm_bindgen::prelude::*;

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
