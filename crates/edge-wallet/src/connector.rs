//! # Wallet Connector
//!
//! Connection state for the payment pages:
//! `Disconnected → Connecting → Connected { wallet, address }`.
//!
//! The selected wallet and address are persisted in client storage so a
//! reload can restore the session without prompting. Everything runs on the
//! browser's event loop, so there is no locking; the async steps are split
//! into `begin_*`/`finish_*` so a caller holding the connector in a
//! `RefCell` never keeps it borrowed across an await.

use crate::wallet::{
    available_wallets, detect_provider, ProviderDescriptor, WalletKind, WalletOption,
};
use async_trait::async_trait;
use thiserror::Error;

/// Storage key for the selected wallet name
pub const SELECTED_WALLET_KEY: &str = "selectedWallet";
/// Storage key for the connected address
pub const USER_ADDRESS_KEY: &str = "userAddress";
/// EIP-1193 "user rejected the request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// Wallet connection failures, worded for display
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Selected wallet not found. Please make sure it is installed and enabled.")]
    NotFound(WalletKind),

    #[error("No accounts found. Please unlock your wallet and try again.")]
    NoAccounts,

    #[error("Connection request rejected. Please try again and approve the connection.")]
    Rejected,

    #[error("A connection request is already pending")]
    Busy,

    #[error("Failed to connect wallet: {message}")]
    Provider { code: Option<i64>, message: String },
}

impl WalletError {
    /// Classify a provider error by its EIP-1193 code
    pub fn from_provider(code: Option<i64>, message: impl Into<String>) -> Self {
        match code {
            Some(USER_REJECTED_CODE) => WalletError::Rejected,
            _ => WalletError::Provider {
                code,
                message: message.into(),
            },
        }
    }
}

/// Shorten an address for display, e.g. `0x1234...abcd`
pub fn shorten(address: &str) -> String {
    format!(
        "{}...{}",
        address.get(..6).unwrap_or(address),
        address.get(38..).unwrap_or("")
    )
}

/// Download pages offered when no wallet is injected
pub const INSTALL_LINKS: [(WalletKind, &str); 2] = [
    (WalletKind::MetaMask, "https://metamask.io/download/"),
    (WalletKind::Coinbase, "https://www.coinbase.com/wallet/downloads"),
];

/// What "Connect Wallet" does with the injected providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletChoice {
    /// Nothing injected: prompt to install a wallet
    Install,
    /// Exactly one wallet: connect it without asking
    Connect(WalletKind),
    /// Several wallets: let the user pick
    Pick(Vec<WalletOption>),
}

pub fn choose_wallet<P: ProviderDescriptor>(providers: &[P]) -> WalletChoice {
    let mut wallets = available_wallets(providers);
    match wallets.len() {
        0 => WalletChoice::Install,
        1 => WalletChoice::Connect(WalletKind::from_name(wallets.remove(0).name)),
        _ => WalletChoice::Pick(wallets),
    }
}

/// Client-side key/value storage (`localStorage` in the browser)
pub trait WalletStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Which accounts call to make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRequest {
    /// Prompt the user (`eth_requestAccounts`)
    Request,
    /// Already-authorized accounts, no prompt (`eth_accounts`)
    Existing,
}

impl AccountRequest {
    pub fn as_method(&self) -> &'static str {
        match self {
            AccountRequest::Request => "eth_requestAccounts",
            AccountRequest::Existing => "eth_accounts",
        }
    }
}

/// An injected wallet provider.
///
/// Providers belong to the browser extension; the connector only keeps a
/// handle to the one it is connected through.
#[async_trait(?Send)]
pub trait WalletProvider: ProviderDescriptor + Clone {
    async fn request_accounts(&self, request: AccountRequest) -> Result<Vec<String>, WalletError>;
}

/// Connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting(WalletKind),
    Connected { wallet: WalletKind, address: String },
}

/// Notifications pushed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
    Disconnect,
}

/// What the host page must do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    /// The chain changed; the page must reload
    Reload,
}

type ConnectObserver<P> = Box<dyn Fn(&str, &P)>;
type DisconnectObserver = Box<dyn Fn()>;

/// Wallet connection state machine
pub struct Connector<S: WalletStorage, P: WalletProvider> {
    storage: S,
    connection: Option<(WalletKind, String, P)>,
    connecting: Option<WalletKind>,
    on_connect: Vec<ConnectObserver<P>>,
    on_disconnect: Vec<DisconnectObserver>,
}

impl<S: WalletStorage, P: WalletProvider> Connector<S, P> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            connection: None,
            connecting: None,
            on_connect: Vec::new(),
            on_disconnect: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        if let Some(kind) = self.connecting {
            return ConnectionState::Connecting(kind);
        }
        match &self.connection {
            Some((wallet, address, _)) => ConnectionState::Connected {
                wallet: *wallet,
                address: address.clone(),
            },
            None => ConnectionState::Disconnected,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.connection.as_ref().map(|(_, address, _)| address.as_str())
    }

    pub fn selected_wallet(&self) -> Option<WalletKind> {
        self.connection.as_ref().map(|(wallet, _, _)| *wallet)
    }

    pub fn provider(&self) -> Option<&P> {
        self.connection.as_ref().map(|(_, _, provider)| provider)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn short_address(&self) -> Option<String> {
        self.address().map(shorten)
    }

    /// Observe successful connections and account switches
    pub fn on_connect(&mut self, observer: impl Fn(&str, &P) + 'static) {
        self.on_connect.push(Box::new(observer));
    }

    /// Observe disconnection
    pub fn on_disconnect(&mut self, observer: impl Fn() + 'static) {
        self.on_disconnect.push(Box::new(observer));
    }

    /// Pick the provider for `kind` and enter `Connecting`
    pub fn begin_connect(&mut self, providers: &[P], kind: WalletKind) -> Result<P, WalletError> {
        if self.connecting.is_some() {
            return Err(WalletError::Busy);
        }
        let provider = detect_provider(providers, kind)
            .cloned()
            .ok_or(WalletError::NotFound(kind))?;
        self.connecting = Some(kind);
        Ok(provider)
    }

    /// Apply the result of `eth_requestAccounts`.
    ///
    /// A failure leaves any previous connection in place.
    pub fn finish_connect(
        &mut self,
        kind: WalletKind,
        provider: P,
        accounts: Result<Vec<String>, WalletError>,
    ) -> Result<String, WalletError> {
        self.connecting = None;
        let address = accounts?
            .into_iter()
            .next()
            .ok_or(WalletError::NoAccounts)?;

        self.storage.set(SELECTED_WALLET_KEY, kind.as_str());
        self.storage.set(USER_ADDRESS_KEY, &address);
        self.connection = Some((kind, address.clone(), provider));
        self.notify_connect();

        Ok(address)
    }

    /// Ask the user to connect `kind`
    pub async fn connect(&mut self, providers: &[P], kind: WalletKind) -> Result<String, WalletError> {
        let provider = self.begin_connect(providers, kind)?;
        let accounts = provider.request_accounts(AccountRequest::Request).await;
        self.finish_connect(kind, provider, accounts)
    }

    /// Saved session whose provider is still injected
    pub fn begin_restore(&self, providers: &[P]) -> Option<(WalletKind, String, P)> {
        let wallet = self.storage.get(SELECTED_WALLET_KEY)?;
        let address = self.storage.get(USER_ADDRESS_KEY)?;
        let kind = WalletKind::from_name(&wallet);
        let provider = detect_provider(providers, kind)?.clone();
        Some((kind, address, provider))
    }

    /// Apply the result of `eth_accounts` to a saved session.
    ///
    /// Restores only if the provider still exposes the saved address first;
    /// a provider error forgets the saved session.
    pub fn finish_restore(
        &mut self,
        kind: WalletKind,
        saved_address: &str,
        provider: P,
        accounts: Result<Vec<String>, WalletError>,
    ) -> bool {
        match accounts {
            Ok(accounts) => {
                let Some(first) = accounts.into_iter().next() else {
                    return false;
                };
                if !first.eq_ignore_ascii_case(saved_address) {
                    return false;
                }
                self.connection = Some((kind, first, provider));
                self.notify_connect();
                true
            }
            Err(_) => {
                self.clear_storage();
                false
            }
        }
    }

    /// Reconnect silently from client storage
    pub async fn restore(&mut self, providers: &[P]) -> bool {
        let Some((kind, saved, provider)) = self.begin_restore(providers) else {
            return false;
        };
        let accounts = provider.request_accounts(AccountRequest::Existing).await;
        self.finish_restore(kind, &saved, provider, accounts)
    }

    /// React to a provider notification
    pub fn handle_event(&mut self, event: ProviderEvent) -> EventOutcome {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                None => self.disconnect(),
                Some(address) => {
                    let Some((_, current, _)) = self.connection.as_mut() else {
                        return EventOutcome::Handled;
                    };
                    *current = address.clone();
                    self.storage.set(USER_ADDRESS_KEY, &address);
                    self.notify_connect();
                }
            },
            ProviderEvent::ChainChanged(_) => return EventOutcome::Reload,
            ProviderEvent::Disconnect => self.disconnect(),
        }
        EventOutcome::Handled
    }

    /// Forget the connection and the saved session
    pub fn disconnect(&mut self) {
        self.connection = None;
        self.connecting = None;
        self.clear_storage();
        for observer in &self.on_disconnect {
            observer();
        }
    }

    fn clear_storage(&self) {
        self.storage.remove(SELECTED_WALLET_KEY);
        self.storage.remove(USER_ADDRESS_KEY);
    }

    fn notify_connect(&self) {
        if let Some((_, address, provider)) = &self.connection {
            for observer in &self.on_connect {
                observer(address, provider);
            }
        }
    }
}
