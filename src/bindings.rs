//! yew_mpgs/src/bindings.rs
//!
//! Low-level wasm-bindgen bindings to the gateway's hosted-session script
//! (`session.js`), which installs a global `PaymentSession` object.
//!
//! The calls resolve `window.PaymentSession` when they run, so they fail with
//! a caught `ReferenceError` if the script has not loaded yet.
//! Higher-level wrappers live in `client.rs`.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    //------------------------------------------------------------------------------
    // PaymentSession
    //------------------------------------------------------------------------------

    /// `PaymentSession.configure({ session, fields, callbacks, ... })`
    #[wasm_bindgen(catch, js_namespace = PaymentSession, js_name = configure)]
    pub fn configure(options: &JsValue) -> Result<(), JsValue>;

    /// `PaymentSession.updateSessionFromForm(paymentType)`
    ///
    /// The result is delivered to the `formSessionUpdate` callback registered
    /// in `configure`.
    #[wasm_bindgen(catch, js_namespace = PaymentSession, js_name = updateSessionFromForm)]
    pub fn update_session_from_form(payment_type: &str) -> Result<(), JsValue>;
}
