//! yew_mpgs/src/client.rs
//!
//! High-level Rust API over the hosted-session widget.
//!
//! This module provides:
//! - `CardFieldSelectors` naming the read-only inputs the widget takes over.
//! - `HostedFieldsEvents`, the handlers for the widget's two events.
//! - `configure_hosted_fields()` to bind the widget to a gateway session.
//! - `update_session_from_form()` to submit the captured card to the gateway.
//!
//! # Events
//!
//! - `initialized` fires once the widget has attached its frames to the
//!   placeholders. Informational only.
//! - `formSessionUpdate` fires after `update_session_from_form()`. A response
//!   with `status: "ok"` means the gateway now holds the card details in the
//!   session, and the 3DS sequence may start. Any other status is a capture
//!   failure (invalid field, timeout, system error) to show the payer.
//!
//! Card data never reaches this crate; only the session id is shared.
//!
//! # Example Usage
//! ```rust,ignore
//! let events = HostedFieldsEvents {
//!     initialized: Callback::from(|_| log::info!("hosted fields ready")),
//!     form_session_update: Callback::from(move |resp: HostedResponse| {
//!         match resp.into_result() {
//!             Ok(()) => start_three_ds.emit(()),
//!             Err(err) => error.set(Some(err.to_string())),
//!         }
//!     }),
//! };
//! configure_hosted_fields(&session.session_id, &CardFieldSelectors::default(), events)?;
//! // on "Pay" click:
//! update_session_from_form(CARD_PAYMENT)?;
//! ```

use gloo_utils::format::JsValueSerdeExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsValue;
use web_sys::js_sys::{Object, Reflect};
use yew::Callback;

use crate::bindings;
use crate::error::CheckoutError;

/// Payment type passed to `updateSessionFromForm`.
pub const CARD_PAYMENT: &str = "card";

/// CSS selectors of the inputs the widget replaces.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardFieldSelectors {
    pub number: String,
    pub security_code: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub name_on_card: String,
}

impl Default for CardFieldSelectors {
    fn default() -> Self {
        Self {
            number: "#card-number".to_string(),
            security_code: "#security-code".to_string(),
            expiry_month: "#expiry-month".to_string(),
            expiry_year: "#expiry-year".to_string(),
            name_on_card: "#cardholder-name".to_string(),
        }
    }
}

impl CardFieldSelectors {
    pub fn all(&self) -> [&str; 5] {
        [
            &self.number,
            &self.expiry_month,
            &self.expiry_year,
            &self.security_code,
            &self.name_on_card,
        ]
    }

    /// Element id behind a `#id` selector, used when rendering the placeholders.
    pub fn id_of(selector: &str) -> &str {
        selector.trim_start_matches('#')
    }
}

/// Payload of the widget's callbacks.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct HostedResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HostedResponse {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    /// `Ok` when the card was captured into the session.
    pub fn into_result(self) -> Result<(), CheckoutError> {
        if self.is_ok() {
            return Ok(());
        }
        let shown = serde_json::to_string(&self).unwrap_or_else(|_| format!("{:?}", self.status));
        Err(CheckoutError::CardCapture(shown))
    }

    fn from_js(value: JsValue) -> Self {
        value.into_serde::<HostedResponse>().unwrap_or_else(|err| {
            log::warn!("unreadable hosted session response: {}", err);
            HostedResponse::default()
        })
    }
}

/// Handlers for the widget's named events.
#[derive(Clone, Default, PartialEq)]
pub struct HostedFieldsEvents {
    pub initialized: Callback<HostedResponse>,
    pub form_session_update: Callback<HostedResponse>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DisplayControl {
    format_card: &'static str,
    invalid_field_characters: &'static str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Interaction {
    display_control: DisplayControl,
}

#[derive(Serialize, Debug)]
struct Fields<'a> {
    card: &'a CardFieldSelectors,
}

/// Bind the widget to `session_id` and the placeholder inputs.
///
/// The handlers stay registered for the lifetime of the page.
pub fn configure_hosted_fields(
    session_id: &str,
    selectors: &CardFieldSelectors,
    events: HostedFieldsEvents,
) -> Result<(), CheckoutError> {
    let opts = Object::new();
    set(&opts, "session", &JsValue::from_str(session_id))?;
    set(&opts, "fields", &to_js(&Fields { card: selectors })?)?;
    set(&opts, "frameEmbeddingMitigation", &to_js(&["javascript"])?)?;
    set(
        &opts,
        "interaction",
        &to_js(&Interaction {
            display_control: DisplayControl {
                format_card: "EMBOSSED",
                invalid_field_characters: "REJECT",
            },
        })?,
    )?;

    let callbacks = Object::new();
    set(&callbacks, "initialized", &event_handler("initialized", events.initialized))?;
    set(
        &callbacks,
        "formSessionUpdate",
        &event_handler("formSessionUpdate", events.form_session_update),
    )?;
    set(&opts, "callbacks", &callbacks)?;

    log::info!("Configuring PaymentSession for session {}", session_id);
    bindings::configure(&opts.into()).map_err(|e| CheckoutError::WidgetConfigure(js_message(&e)))
}

/// Ask the widget to push the captured card into the session.
pub fn update_session_from_form(payment_type: &str) -> Result<(), CheckoutError> {
    bindings::update_session_from_form(payment_type)
        .map_err(|e| CheckoutError::CardCapture(js_message(&e)))
}

fn event_handler(name: &'static str, callback: Callback<HostedResponse>) -> JsValue {
    let closure = Closure::wrap(Box::new(move |response: JsValue| {
        let response = HostedResponse::from_js(response);
        log::debug!("hosted session {}: {:?}", name, response.status);
        callback.emit(response);
    }) as Box<dyn FnMut(JsValue)>);
    // The widget keeps calling these for as long as the page lives.
    closure.into_js_value()
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), CheckoutError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| CheckoutError::WidgetConfigure(js_message(&e)))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, CheckoutError> {
    to_value(value).map_err(|e| CheckoutError::WidgetConfigure(e.to_string()))
}

/// Best effort text of a caught JS exception.
pub(crate) fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selectors_serialize_with_widget_keys() {
        let value = serde_json::to_value(Fields {
            card: &CardFieldSelectors::default(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "card": {
                    "number": "#card-number",
                    "securityCode": "#security-code",
                    "expiryMonth": "#expiry-month",
                    "expiryYear": "#expiry-year",
                    "nameOnCard": "#cardholder-name"
                }
            })
        );
        assert_eq!(CardFieldSelectors::id_of("#card-number"), "card-number");
    }

    #[test]
    fn ok_update_captures_card() {
        let response: HostedResponse = serde_json::from_value(json!({
            "status": "ok",
            "session": { "id": "SESSION0002" }
        }))
        .unwrap();
        assert!(response.into_result().is_ok());
    }

    #[test]
    fn failed_update_shows_widget_payload() {
        let response: HostedResponse = serde_json::from_value(json!({
            "status": "fields_in_error",
            "errors": { "cardNumber": "invalid" }
        }))
        .unwrap();
        let err = response.into_result().unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Failed to capture card details: "));
        assert!(text.contains("fields_in_error"));
        assert!(text.contains("cardNumber"));
    }
}
