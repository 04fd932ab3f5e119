//! Browser bindings for the connector: `window.ethereum`, `localStorage`
//! and the wallet status elements on the payment pages.

use crate::connector::{
    choose_wallet, shorten, AccountRequest, Connector, EventOutcome, ProviderEvent, WalletChoice,
    WalletError, WalletProvider, WalletStorage,
};
use crate::modal;
use crate::wallet::{available_wallets, ProviderDescriptor, ProviderFlags, WalletKind};
use async_trait::async_trait;
use js_sys::{Array, Function, Object, Promise, Reflect};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys::console;

/// An EIP-1193 provider injected by a wallet extension
#[derive(Debug, Clone)]
pub struct InjectedProvider {
    inner: JsValue,
    flags: ProviderFlags,
}

impl InjectedProvider {
    pub fn from_js(inner: JsValue) -> Self {
        let flag = |name: &str| {
            Reflect::get(&inner, &JsValue::from_str(name))
                .map(|v| v.is_truthy())
                .unwrap_or(false)
        };
        let flags = ProviderFlags {
            is_metamask: flag("isMetaMask"),
            is_coinbase_wallet: flag("isCoinbaseWallet"),
            is_brave_wallet: flag("isBraveWallet"),
            is_trust: flag("isTrust"),
        };
        Self { inner, flags }
    }

    pub fn as_js(&self) -> &JsValue {
        &self.inner
    }

    /// Subscribe to a provider event
    pub fn on(&self, event: &str, handler: &Function) -> Result<(), JsValue> {
        let on: Function = Reflect::get(&self.inner, &JsValue::from_str("on"))?.dyn_into()?;
        on.call2(&self.inner, &JsValue::from_str(event), handler)?;
        Ok(())
    }
}

impl ProviderDescriptor for InjectedProvider {
    fn flags(&self) -> ProviderFlags {
        self.flags
    }
}

#[async_trait(?Send)]
impl WalletProvider for InjectedProvider {
    async fn request_accounts(&self, request: AccountRequest) -> Result<Vec<String>, WalletError> {
        let method: Function = Reflect::get(&self.inner, &JsValue::from_str("request"))
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;

        let args = Object::new();
        Reflect::set(
            &args,
            &JsValue::from_str("method"),
            &JsValue::from_str(request.as_method()),
        )
        .map_err(js_error)?;

        let pending = method.call1(&self.inner, &args).map_err(js_error)?;
        let accounts = JsFuture::from(Promise::resolve(&pending))
            .await
            .map_err(js_error)?;

        Ok(Array::from(&accounts)
            .iter()
            .filter_map(|account| account.as_string())
            .collect())
    }
}

/// Read `code` and `message` off a thrown provider error
fn js_error(error: JsValue) -> WalletError {
    let code = Reflect::get(&error, &JsValue::from_str("code"))
        .ok()
        .and_then(|code| code.as_f64())
        .map(|code| code as i64);
    let message = Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{:?}", error));
    WalletError::from_provider(code, message)
}

fn to_js(error: WalletError) -> JsValue {
    js_sys::Error::new(&error.to_string()).into()
}

/// Providers on `window.ethereum`, or each of `window.ethereum.providers`
/// when several extensions are installed
pub fn injected_providers() -> Vec<InjectedProvider> {
    let Some(window) = web_sys::window() else {
        return Vec::new();
    };
    let ethereum = match Reflect::get(&window, &JsValue::from_str("ethereum")) {
        Ok(ethereum) if !ethereum.is_undefined() && !ethereum.is_null() => ethereum,
        _ => return Vec::new(),
    };

    let providers = Reflect::get(&ethereum, &JsValue::from_str("providers"))
        .ok()
        .filter(Array::is_array)
        .map(|providers| Array::from(&providers).to_vec())
        .unwrap_or_default();
    select_providers(ethereum, providers)
        .into_iter()
        .map(InjectedProvider::from_js)
        .collect()
}

/// `providers` when non-empty, otherwise the lone injected provider
fn select_providers<T>(ethereum: T, providers: Vec<T>) -> Vec<T> {
    if providers.is_empty() {
        vec![ethereum]
    } else {
        providers
    }
}

/// `window.localStorage`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl WalletStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if let Err(e) = storage.set_item(key, value) {
                console::warn_2(&JsValue::from_str("localStorage write failed:"), &e);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

enum Notice {
    Connected {
        address: String,
        provider: InjectedProvider,
    },
    Disconnected,
}

type BrowserConnector = Connector<BrowserStorage, InjectedProvider>;

struct Shared {
    connector: RefCell<BrowserConnector>,
    pending: Rc<RefCell<VecDeque<Notice>>>,
    on_connect: RefCell<Vec<Function>>,
    on_disconnect: RefCell<Vec<Function>>,
    listening: RefCell<Vec<JsValue>>,
}

impl Shared {
    fn new() -> Rc<Self> {
        let pending: Rc<RefCell<VecDeque<Notice>>> = Rc::default();
        let mut connector = Connector::new(BrowserStorage);
        {
            let pending = pending.clone();
            connector.on_connect(move |address, provider: &InjectedProvider| {
                pending.borrow_mut().push_back(Notice::Connected {
                    address: address.to_string(),
                    provider: provider.clone(),
                });
            });
        }
        {
            let pending = pending.clone();
            connector.on_disconnect(move || pending.borrow_mut().push_back(Notice::Disconnected));
        }

        Rc::new(Self {
            connector: RefCell::new(connector),
            pending,
            on_connect: RefCell::default(),
            on_disconnect: RefCell::default(),
            listening: RefCell::default(),
        })
    }

    /// Deliver queued notifications. Must be called with the connector unborrowed.
    fn flush(self: &Rc<Self>) {
        loop {
            let Some(notice) = self.pending.borrow_mut().pop_front() else {
                break;
            };
            match notice {
                Notice::Connected { address, provider } => {
                    self.listen(&provider);
                    update_ui(Some(&shorten(&address)));
                    let observers = self.on_connect.borrow().clone();
                    for observer in &observers {
                        if let Err(e) =
                            observer.call2(&JsValue::NULL, &JsValue::from_str(&address), provider.as_js())
                        {
                            console::error_2(&JsValue::from_str("connect observer failed:"), &e);
                        }
                    }
                }
                Notice::Disconnected => {
                    update_ui(None);
                    let observers = self.on_disconnect.borrow().clone();
                    for observer in &observers {
                        if let Err(e) = observer.call0(&JsValue::NULL) {
                            console::error_2(&JsValue::from_str("disconnect observer failed:"), &e);
                        }
                    }
                }
            }
        }
    }

    async fn connect_kind(self: Rc<Self>, kind: WalletKind) -> Result<String, WalletError> {
        let providers = injected_providers();
        let provider = self
            .connector
            .borrow_mut()
            .begin_connect(&providers, kind)?;

        let accounts = provider.request_accounts(AccountRequest::Request).await;
        let result = self
            .connector
            .borrow_mut()
            .finish_connect(kind, provider, accounts);
        self.flush();
        result
    }

    /// Connect from a click: failures are shown to the user, not returned
    fn connect_from_ui(self: &Rc<Self>, kind: WalletKind) {
        modal::close();
        let shared = self.clone();
        spawn_local(async move {
            if let Err(e) = shared.connect_kind(kind).await {
                let message = e.to_string();
                console::error_2(
                    &JsValue::from_str("Failed to connect wallet:"),
                    &JsValue::from_str(&message),
                );
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&message);
                }
            }
        });
    }

    fn handle(self: &Rc<Self>, event: ProviderEvent) {
        let outcome = self.connector.borrow_mut().handle_event(event);
        self.flush();
        if outcome == EventOutcome::Reload {
            if let Some(window) = web_sys::window() {
                let _ = window.location().reload();
            }
        }
    }

    /// Subscribe to a provider's events once
    fn listen(self: &Rc<Self>, provider: &InjectedProvider) {
        if self
            .listening
            .borrow()
            .iter()
            .any(|known| Object::is(known, provider.as_js()))
        {
            return;
        }
        self.listening.borrow_mut().push(provider.as_js().clone());

        let accounts_changed = self.subscriber(|accounts| {
            ProviderEvent::AccountsChanged(
                Array::from(&accounts)
                    .iter()
                    .filter_map(|account| account.as_string())
                    .collect(),
            )
        });
        let chain_changed =
            self.subscriber(|chain| ProviderEvent::ChainChanged(chain.as_string().unwrap_or_default()));
        let disconnect = self.subscriber(|_| ProviderEvent::Disconnect);

        for (event, handler) in [
            ("accountsChanged", accounts_changed),
            ("chainChanged", chain_changed),
            ("disconnect", disconnect),
        ] {
            if let Err(e) = provider.on(event, handler.as_ref().unchecked_ref()) {
                console::warn_2(&JsValue::from_str(event), &e);
            }
            // Listeners live as long as the page
            handler.forget();
        }
    }

    fn subscriber(
        self: &Rc<Self>,
        to_event: impl Fn(JsValue) -> ProviderEvent + 'static,
    ) -> Closure<dyn FnMut(JsValue)> {
        let shared = Rc::downgrade(self);
        Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            if let Some(shared) = shared.upgrade() {
                shared.handle(to_event(payload));
            }
        })
    }
}

/// Toggle the connect button and wallet status elements
fn update_ui(short_address: Option<&str>) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let button = document.get_element_by_id("connect-wallet-btn");
    let status = document.get_element_by_id("wallet-status");
    let address = document.get_element_by_id("wallet-address");

    match short_address {
        Some(short) => {
            if let Some(button) = button {
                let _ = button.class_list().add_1("hidden");
            }
            if let Some(status) = status {
                let _ = status.class_list().remove_1("hidden");
                let _ = status.class_list().add_1("flex");
            }
            if let Some(address) = address {
                address.set_text_content(Some(short));
            }
        }
        None => {
            if let Some(button) = button {
                let _ = button.class_list().remove_1("hidden");
            }
            if let Some(status) = status {
                let _ = status.class_list().add_1("hidden");
                let _ = status.class_list().remove_1("flex");
            }
            if let Some(address) = address {
                address.set_text_content(None);
            }
        }
    }
}

/// Wallet connector exported to the payment pages
///
/// ```javascript
/// const wallet = new WalletConnector();
/// wallet.onConnect((address, provider) => console.log('connected', address));
/// await wallet.restore();
/// if (!wallet.isConnected()) wallet.showWalletModal();
/// ```
#[wasm_bindgen]
pub struct WalletConnector {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl WalletConnector {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            shared: Shared::new(),
        }
    }

    /// Wallet picker entries: `[{ name, label, icon }]`
    #[wasm_bindgen(js_name = availableWallets)]
    pub fn available_wallets(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&available_wallets(&injected_providers()))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Connect the named wallet; resolves to the address
    pub fn connect(&self, name: &str) -> Promise {
        let shared = self.shared.clone();
        let kind = WalletKind::from_name(name);

        future_to_promise(async move {
            shared
                .connect_kind(kind)
                .await
                .map(JsValue::from)
                .map_err(to_js)
        })
    }

    /// The "Connect Wallet" button: prompt to install when nothing is
    /// injected, connect directly when there is one wallet, otherwise open
    /// the picker
    #[wasm_bindgen(js_name = showWalletModal)]
    pub fn show_wallet_modal(&self) -> Result<(), JsValue> {
        match choose_wallet(&injected_providers()) {
            WalletChoice::Install => modal::show_install(),
            WalletChoice::Connect(kind) => {
                self.shared.connect_from_ui(kind);
                Ok(())
            }
            WalletChoice::Pick(options) => {
                let shared = Rc::downgrade(&self.shared);
                modal::show_picker(&options, move |kind| {
                    if let Some(shared) = shared.upgrade() {
                        shared.connect_from_ui(kind);
                    }
                })
            }
        }
    }

    /// Connect the named wallet from the picker; failures are alerted
    #[wasm_bindgen(js_name = connectToWallet)]
    pub fn connect_to_wallet(&self, name: &str) {
        self.shared.connect_from_ui(WalletKind::from_name(name));
    }

    #[wasm_bindgen(js_name = closeModal)]
    pub fn close_modal(&self) {
        modal::close();
    }

    /// Reconnect from `localStorage` without prompting; resolves to a boolean
    pub fn restore(&self) -> Promise {
        let shared = self.shared.clone();

        future_to_promise(async move {
            let providers = injected_providers();
            let saved = shared.connector.borrow().begin_restore(&providers);
            let Some((kind, address, provider)) = saved else {
                return Ok(JsValue::FALSE);
            };

            let accounts = provider.request_accounts(AccountRequest::Existing).await;
            let restored = shared
                .connector
                .borrow_mut()
                .finish_restore(kind, &address, provider, accounts);
            shared.flush();

            Ok(JsValue::from_bool(restored))
        })
    }

    pub fn disconnect(&self) {
        self.shared.connector.borrow_mut().disconnect();
        self.shared.flush();
    }

    pub fn address(&self) -> Option<String> {
        self.shared.connector.borrow().address().map(str::to_string)
    }

    #[wasm_bindgen(js_name = shortAddress)]
    pub fn short_address(&self) -> Option<String> {
        self.shared.connector.borrow().short_address()
    }

    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.shared.connector.borrow().is_connected()
    }

    #[wasm_bindgen(js_name = selectedWallet)]
    pub fn selected_wallet(&self) -> Option<String> {
        self.shared
            .connector
            .borrow()
            .selected_wallet()
            .map(|kind| kind.as_str().to_string())
    }

    /// `callback(address, provider)` after connecting or switching accounts
    #[wasm_bindgen(js_name = onConnect)]
    pub fn on_connect(&self, callback: Function) {
        self.shared.on_connect.borrow_mut().push(callback);
    }

    #[wasm_bindgen(js_name = onDisconnect)]
    pub fn on_disconnect(&self, callback: Function) {
        self.shared.on_disconnect.borrow_mut().push(callback);
    }
}

impl Default for WalletConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_provider_list_falls_back_to_injected() {
        assert_eq!(select_providers("ethereum", vec![]), vec!["ethereum"]);
        assert_eq!(
            select_providers("ethereum", vec!["metamask", "coinbase"]),
            vec!["metamask", "coinbase"]
        );
    }
}
