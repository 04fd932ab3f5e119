//! # Wallet Detection
//!
//! Browser extensions inject EIP-1193 providers and mark themselves with
//! vendor flags. Several can be injected at once; this module picks the one
//! the user asked for.

use serde::{Deserialize, Serialize};

/// Wallet vendors the payment pages know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    MetaMask,
    Coinbase,
    Brave,
    Trust,
    /// Any injected provider without a known flag
    Other,
}

impl WalletKind {
    /// Known vendors, in the order they are offered
    pub const KNOWN: [WalletKind; 4] = [
        WalletKind::MetaMask,
        WalletKind::Coinbase,
        WalletKind::Brave,
        WalletKind::Trust,
    ];

    /// Name stored in client storage
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "metamask",
            WalletKind::Coinbase => "coinbase",
            WalletKind::Brave => "brave",
            WalletKind::Trust => "trust",
            WalletKind::Other => "other",
        }
    }

    /// Parse a stored name; unknown names fall back to `Other`
    pub fn from_name(name: &str) -> Self {
        match name {
            "metamask" => WalletKind::MetaMask,
            "coinbase" => WalletKind::Coinbase,
            "brave" => WalletKind::Brave,
            "trust" => WalletKind::Trust,
            _ => WalletKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "MetaMask",
            WalletKind::Coinbase => "Coinbase Wallet",
            WalletKind::Brave => "Brave Wallet",
            WalletKind::Trust => "Trust Wallet",
            WalletKind::Other => "Web3 Wallet",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "🦊",
            WalletKind::Coinbase => "🔵",
            WalletKind::Brave => "🦁",
            WalletKind::Trust => "⚡",
            WalletKind::Other => "💼",
        }
    }

    /// Whether a provider with these flags belongs to this vendor.
    ///
    /// Brave sets `isMetaMask` too, so MetaMask requires `!isBraveWallet`.
    pub fn matches(&self, flags: &ProviderFlags) -> bool {
        match self {
            WalletKind::MetaMask => flags.is_metamask && !flags.is_brave_wallet,
            WalletKind::Coinbase => flags.is_coinbase_wallet,
            WalletKind::Brave => flags.is_brave_wallet,
            WalletKind::Trust => flags.is_trust,
            WalletKind::Other => true,
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor flags read off an injected provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFlags {
    #[serde(default, rename = "isMetaMask")]
    pub is_metamask: bool,
    #[serde(default)]
    pub is_coinbase_wallet: bool,
    #[serde(default)]
    pub is_brave_wallet: bool,
    #[serde(default)]
    pub is_trust: bool,
}

/// Anything that exposes vendor flags
pub trait ProviderDescriptor {
    fn flags(&self) -> ProviderFlags;
}

impl ProviderDescriptor for ProviderFlags {
    fn flags(&self) -> ProviderFlags {
        *self
    }
}

/// First provider belonging to `kind`; `Other` takes the first provider
pub fn detect_provider<P: ProviderDescriptor>(providers: &[P], kind: WalletKind) -> Option<&P> {
    match kind {
        WalletKind::Other => providers.first(),
        _ => providers.iter().find(|p| kind.matches(&p.flags())),
    }
}

/// Entry in the wallet picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletOption {
    pub name: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

impl From<WalletKind> for WalletOption {
    fn from(kind: WalletKind) -> Self {
        Self {
            name: kind.as_str(),
            label: kind.label(),
            icon: kind.icon(),
        }
    }
}

/// Wallets that can be connected with the injected providers.
///
/// If providers exist but none carries a known flag, a single generic
/// "Web3 Wallet" entry is offered.
pub fn available_wallets<P: ProviderDescriptor>(providers: &[P]) -> Vec<WalletOption> {
    if providers.is_empty() {
        return Vec::new();
    }

    let mut wallets: Vec<WalletOption> = WalletKind::KNOWN
        .iter()
        .filter(|kind| providers.iter().any(|p| kind.matches(&p.flags())))
        .map(|kind| WalletOption::from(*kind))
        .collect();

    if wallets.is_empty() {
        wallets.push(WalletKind::Other.into());
    }
    wallets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metamask() -> ProviderFlags {
        ProviderFlags {
            is_metamask: true,
            ..Default::default()
        }
    }

    fn brave() -> ProviderFlags {
        // Brave impersonates MetaMask
        ProviderFlags {
            is_metamask: true,
            is_brave_wallet: true,
            ..Default::default()
        }
    }

    fn coinbase() -> ProviderFlags {
        ProviderFlags {
            is_coinbase_wallet: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_brave_is_not_metamask() {
        let providers = [brave()];
        assert!(detect_provider(&providers, WalletKind::MetaMask).is_none());
        assert_eq!(
            detect_provider(&providers, WalletKind::Brave),
            Some(&brave())
        );
    }

    #[test]
    fn test_detect_among_multiple() {
        let providers = [brave(), coinbase(), metamask()];
        assert_eq!(
            detect_provider(&providers, WalletKind::MetaMask),
            Some(&metamask())
        );
        assert_eq!(
            detect_provider(&providers, WalletKind::Coinbase),
            Some(&coinbase())
        );
        assert!(detect_provider(&providers, WalletKind::Trust).is_none());
        assert_eq!(
            detect_provider(&providers, WalletKind::Other),
            Some(&brave())
        );
    }

    #[test]
    fn test_no_providers() {
        let providers: [ProviderFlags; 0] = [];
        assert!(detect_provider(&providers, WalletKind::Other).is_none());
        assert!(available_wallets(&providers).is_empty());
    }

    #[test]
    fn test_available_wallets_order() {
        let providers = [coinbase(), brave(), metamask()];
        let names: Vec<_> = available_wallets(&providers)
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["metamask", "coinbase", "brave"]);
    }

    #[test]
    fn test_unknown_provider_offers_generic_wallet() {
        let wallets = available_wallets(&[ProviderFlags::default()]);
        assert_eq!(wallets, vec![WalletOption::from(WalletKind::Other)]);
        assert_eq!(wallets[0].label, "Web3 Wallet");
    }

    #[test]
    fn test_unknown_name_is_other() {
        assert_eq!(WalletKind::from_name("phantom"), WalletKind::Other);
        assert_eq!(WalletKind::from_name("brave"), WalletKind::Brave);
    }

    #[test]
    fn test_flags_from_provider_json() {
        let flags: ProviderFlags =
            serde_json::from_str(r#"{"isMetaMask": true, "isBraveWallet": true}"#).unwrap();
        assert_eq!(flags, brave());
    }
}
