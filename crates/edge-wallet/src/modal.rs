//! Wallet picker and install prompt, built with the DOM API.
//!
//! Only one modal (`#wallet-modal`) exists at a time. Clicking the backdrop
//! or the close button removes it.

use crate::connector::INSTALL_LINKS;
use crate::wallet::{WalletKind, WalletOption};
use js_sys::Object;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event};

pub const MODAL_ID: &str = "wallet-modal";

const BACKDROP_CLASS: &str =
    "fixed inset-0 bg-black/50 backdrop-blur-sm flex items-center justify-center z-50 p-4";
const PANEL_CLASS: &str = "bg-white dark:bg-gray-800 rounded-2xl shadow-2xl max-w-md w-full p-6";
const OPTION_CLASS: &str = "wallet-option w-full flex items-center gap-4 p-4 rounded-xl border-2 \
     border-gray-200 dark:border-gray-700 hover:border-primary transition-all";

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn element(document: &Document, tag: &str, class: &str, text: Option<&str>) -> Result<Element, JsValue> {
    let el = document.create_element(tag)?;
    el.set_class_name(class);
    if text.is_some() {
        el.set_text_content(text);
    }
    Ok(el)
}

/// Attach a click handler that lives as long as the element's page
fn on_click(target: &Element, handler: impl FnMut(Event) + 'static) -> Result<(), JsValue> {
    let handler = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

/// Remove the open modal, if any
pub fn close() {
    if let Ok(document) = document() {
        if let Some(modal) = document.get_element_by_id(MODAL_ID) {
            modal.remove();
        }
    }
}

/// Backdrop, panel and title bar; returns the backdrop and the panel body
fn frame(document: &Document, title: &str) -> Result<(Element, Element), JsValue> {
    close();

    let backdrop = element(document, "div", BACKDROP_CLASS, None)?;
    backdrop.set_id(MODAL_ID);
    {
        let backdrop_ref: JsValue = backdrop.clone().into();
        on_click(&backdrop, move |event: Event| {
            let on_backdrop = event
                .target()
                .map(|target| Object::is(&target, &backdrop_ref))
                .unwrap_or(false);
            if on_backdrop {
                close();
            }
        })?;
    }

    let panel = element(document, "div", PANEL_CLASS, None)?;
    let header = element(document, "div", "flex justify-between items-center mb-6", None)?;
    header.append_child(&element(
        document,
        "h2",
        "text-2xl font-bold text-gray-900 dark:text-white",
        Some(title),
    )?.into())?;
    let close_button = element(document, "button", "text-gray-400 hover:text-gray-600", Some("✕"))?;
    close_button.set_attribute("aria-label", "Close")?;
    on_click(&close_button, |_| close())?;
    header.append_child(&close_button)?;
    panel.append_child(&header)?;

    let body = element(document, "div", "space-y-3", None)?;
    panel.append_child(&body)?;
    backdrop.append_child(&panel)?;

    Ok((backdrop, body))
}

fn mount(document: &Document, backdrop: &Element) -> Result<(), JsValue> {
    document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(backdrop)?;
    Ok(())
}

/// "No Wallet Found" with download links
pub fn show_install() -> Result<(), JsValue> {
    let document = document()?;
    let (backdrop, body) = frame(&document, "No Wallet Found")?;

    body.append_child(&element(&document, "div", "text-6xl text-center", Some("🔒"))?.into())?;
    body.append_child(&element(
        &document,
        "p",
        "text-gray-600 dark:text-gray-400 mb-6 text-center",
        Some("No Web3 wallet detected. Please install a wallet extension to continue."),
    )?.into())?;

    for (kind, url) in INSTALL_LINKS {
        let link = element(
            &document,
            "a",
            "block w-full p-4 rounded-xl border-2 border-gray-200 text-center font-semibold",
            Some(&format!("{} Install {}", kind.icon(), kind.label())),
        )?;
        link.set_attribute("href", url)?;
        link.set_attribute("target", "_blank")?;
        link.set_attribute("rel", "noopener")?;
        body.append_child(&link)?;
    }

    mount(&document, &backdrop)
}

/// "Connect Wallet" with one button per option; `pick` gets the chosen wallet
pub fn show_picker(
    options: &[WalletOption],
    pick: impl Fn(WalletKind) + Clone + 'static,
) -> Result<(), JsValue> {
    let document = document()?;
    let (backdrop, body) = frame(&document, "Connect Wallet")?;

    body.append_child(&element(
        &document,
        "p",
        "text-gray-600 dark:text-gray-400 mb-6 text-sm",
        Some("Choose your preferred wallet to connect"),
    )?.into())?;

    for option in options {
        let button = element(&document, "button", OPTION_CLASS, None)?;
        button.set_attribute("data-wallet", option.name)?;
        button.append_child(&element(&document, "div", "text-4xl", Some(option.icon))?.into())?;
        button.append_child(&element(
            &document,
            "div",
            "flex-1 text-left font-semibold text-gray-900 dark:text-white",
            Some(option.label),
        )?.into())?;

        let kind = WalletKind::from_name(option.name);
        let pick = pick.clone();
        on_click(&button, move |_| pick(kind))?;
        body.append_child(&button)?;
    }

    mount(&document, &backdrop)
}
