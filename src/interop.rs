//! interop.rs
//!
//! Runtime loading of the gateway's hosted-session script (no inline JS).
//!
//! # Overview
//! `load_hosted_script()` replaces any previously injected
//! `<script data-payment-session>` with a fresh, async one for the current
//! merchant. The script defines `window.PaymentSession` some time after it
//! is appended, so callers wait for it with `wait_for_hosted_widget()` and
//! for the placeholder inputs with `wait_for_elements()`.
//!
//! # Usage
//! ```rust,ignore
//! load_hosted_script(&config, Callback::from(|url| log::error!("{}", url)))?;
//! wait_for_hosted_widget().await?;
//! wait_for_elements(&CardFieldSelectors::default().all()).await?;
//! ```

use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::js_sys::Reflect;
use web_sys::{Document, HtmlScriptElement};
use yew::Callback;

use crate::config::MerchantConfig;
use crate::error::CheckoutError;
use crate::retry::{browser_sleep, poll_until, RetryPolicy};

/// Attribute marking the injected script.
pub const SCRIPT_MARKER: &str = "data-payment-session";
/// Path the issuer redirects to after a challenge.
pub const AUTHENTICATION_CALLBACK_PATH: &str = "/authentication-callback";

const WIDGET_GLOBAL: &str = "PaymentSession";

fn document() -> Result<Document, CheckoutError> {
    web_sys::window()
        .and_then(|win| win.document())
        .ok_or_else(|| CheckoutError::ScriptLoad("no document".to_string()))
}

/// Inject the merchant's `session.js`, dropping any earlier copy.
///
/// `on_error` receives the script URL if the browser fails to load it.
pub fn load_hosted_script(config: &MerchantConfig, on_error: Callback<String>) -> Result<(), CheckoutError> {
    let document = document()?;
    let load_err = |e: JsValue| CheckoutError::ScriptLoad(format!("{:?}", e));

    let stale = document
        .query_selector_all(&format!("script[{}]", SCRIPT_MARKER))
        .map_err(load_err)?;
    for i in 0..stale.length() {
        if let Some(node) = stale.item(i) {
            if let Some(parent) = node.parent_node() {
                parent.remove_child(&node).map_err(load_err)?;
            }
        }
    }

    let url = config.hosted_script_url();
    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(load_err)?
        .dyn_into()
        .map_err(|_| CheckoutError::ScriptLoad("not a script element".to_string()))?;
    script.set_src(&url);
    script.set_async(true);
    script.set_attribute(SCRIPT_MARKER, "true").map_err(load_err)?;

    let failed_url = url.clone();
    let onerror = Closure::wrap(Box::new(move || {
        log::error!("Failed to load Payment Session script from {}", failed_url);
        on_error.emit(failed_url.clone());
    }) as Box<dyn Fn()>);
    script.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    let onload = Closure::wrap(Box::new(|| {
        log::info!("Payment Session script loaded");
    }) as Box<dyn Fn()>);
    script.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    document
        .head()
        .ok_or_else(|| CheckoutError::ScriptLoad("head missing".to_string()))?
        .append_child(&script)
        .map_err(load_err)?;
    log::info!("Loading Payment Session script from {}", url);
    Ok(())
}

/// `true` once the script has defined `window.PaymentSession`.
pub fn hosted_widget_present() -> bool {
    web_sys::window()
        .and_then(|win| Reflect::has(&win, &JsValue::from_str(WIDGET_GLOBAL)).ok())
        .unwrap_or(false)
}

pub async fn wait_for_hosted_widget() -> Result<(), CheckoutError> {
    if poll_until(RetryPolicy::HOSTED_WIDGET, hosted_widget_present, browser_sleep).await {
        Ok(())
    } else {
        log::error!("PaymentSession not defined after {:?}", RetryPolicy::HOSTED_WIDGET.budget());
        Err(CheckoutError::WidgetUnavailable)
    }
}

/// Selectors from `selectors` that match nothing yet.
pub fn missing_elements(selectors: &[&str]) -> Vec<String> {
    let Ok(document) = document() else {
        return selectors.iter().map(|s| s.to_string()).collect();
    };
    selectors
        .iter()
        .filter(|selector| !matches!(document.query_selector(selector), Ok(Some(_))))
        .map(|s| s.to_string())
        .collect()
}

/// Wait until every selector matches an element.
pub async fn wait_for_elements(selectors: &[&str]) -> Result<(), CheckoutError> {
    let mounted = poll_until(
        RetryPolicy::DOM_ELEMENTS,
        || missing_elements(selectors).is_empty(),
        browser_sleep,
    )
    .await;
    if mounted {
        return Ok(());
    }
    let missing = missing_elements(selectors);
    log::error!("Payment form elements missing: {:?}", missing);
    Err(CheckoutError::ElementsNotMounted(missing))
}

/// `{origin}/authentication-callback`, or the bare path without a window.
pub fn authentication_callback_url() -> String {
    let origin = web_sys::window()
        .and_then(|win| win.location().origin().ok())
        .unwrap_or_default();
    format!("{}{}", origin, AUTHENTICATION_CALLBACK_PATH)
}
