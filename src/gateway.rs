//! yew_mpgs/src/gateway.rs
//!
//! Typed client for the merchant backend that fronts the payment gateway.
//!
//! The backend exposes one endpoint per gateway operation. Every POST body
//! carries the merchant configuration; every response may carry an `apiLog`
//! object describing the call the backend made to the gateway.
//!
//! | Operation                | Endpoint                           |
//! |--------------------------|------------------------------------|
//! | create session           | `POST /create-session`             |
//! | initiate authentication  | `POST /api/initiate-authentication`|
//! | authenticate payer       | `POST /api/authenticate-payer`     |
//! | authorize / pay          | `POST /api/authorize-pay`          |
//! | retrieve transaction     | `POST /retrieve-transaction`       |
//! | health                   | `GET /health`                      |
//!
//! [`GatewayApi`] is the seam the orchestration code is written against;
//! [`HttpGateway`] implements it with `gloo-net`.

use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api_log::ApiCall;
use crate::config::{ClientSettings, MerchantConfig};
use crate::error::GatewayError;
use crate::session::PaymentSession;

pub const CREATE_SESSION: &str = "/create-session";
pub const INITIATE_AUTHENTICATION: &str = "/api/initiate-authentication";
pub const AUTHENTICATE_PAYER: &str = "/api/authenticate-payer";
pub const AUTHORIZE_PAY: &str = "/api/authorize-pay";
pub const RETRIEVE_TRANSACTION: &str = "/retrieve-transaction";
pub const HEALTH: &str = "/health";

/// Authentication status values reported by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticationStatus {
    Available,
    NotAvailable,
    NotSupported,
    NotInEffect,
    Successful,
    /// Anything else, kept verbatim (`AUTHENTICATION_PENDING`, `AUTHENTICATION_FAILED`, ...).
    Other(String),
}

impl AuthenticationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "AUTHENTICATION_AVAILABLE",
            Self::NotAvailable => "AUTHENTICATION_NOT_AVAILABLE",
            Self::NotSupported => "AUTHENTICATION_NOT_SUPPORTED",
            Self::NotInEffect => "AUTHENTICATION_NOT_IN_EFFECT",
            Self::Successful => "AUTHENTICATION_SUCCESSFUL",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for AuthenticationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "AUTHENTICATION_AVAILABLE" => Self::Available,
            "AUTHENTICATION_NOT_AVAILABLE" => Self::NotAvailable,
            "AUTHENTICATION_NOT_SUPPORTED" => Self::NotSupported,
            "AUTHENTICATION_NOT_IN_EFFECT" => Self::NotInEffect,
            "AUTHENTICATION_SUCCESSFUL" => Self::Successful,
            _ => Self::Other(raw),
        }
    }
}

impl From<AuthenticationStatus> for String {
    fn from(status: AuthenticationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl Serialize for AuthenticationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuthenticationStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl std::fmt::Display for AuthenticationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device data the 3DS protocol wants from the payer's browser.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserDetails {
    pub screen_height: i32,
    pub screen_width: i32,
    pub color_depth: i32,
    /// Minutes from UTC as reported by `Date.getTimezoneOffset()`.
    pub time_zone_offset: i32,
    pub language: String,
    pub java_enabled: bool,
}

impl Default for BrowserDetails {
    fn default() -> Self {
        Self {
            screen_height: 0,
            screen_width: 0,
            color_depth: 24,
            time_zone_offset: 0,
            language: "en-US".to_string(),
            java_enabled: false,
        }
    }
}

impl BrowserDetails {
    /// Read the details from `window`; missing values fall back to defaults.
    pub fn collect() -> Self {
        let mut details = Self::default();
        let Some(window) = web_sys::window() else {
            return details;
        };
        if let Ok(screen) = window.screen() {
            details.screen_height = screen.height().unwrap_or(details.screen_height);
            details.screen_width = screen.width().unwrap_or(details.screen_width);
            details.color_depth = screen.color_depth().unwrap_or(details.color_depth);
        }
        if let Some(language) = window.navigator().language() {
            details.language = language;
        }
        details.time_zone_offset = web_sys::js_sys::Date::new_0().get_timezone_offset() as i32;
        details
    }
}

//------------------------------------------------------------------------------
// Requests
//------------------------------------------------------------------------------

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    merchant_config: &'a MerchantConfig,
    amount: &'a str,
    currency: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    merchant_config: &'a MerchantConfig,
    session_id: &'a str,
    order_id: &'a str,
    transaction_id: &'a str,
}

impl<'a> SessionRequest<'a> {
    fn new(config: &'a MerchantConfig, session: &'a PaymentSession) -> Self {
        Self {
            merchant_config: config,
            session_id: &session.session_id,
            order_id: &session.order_id,
            transaction_id: &session.transaction_id,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AuthenticatePayerRequest<'a> {
    #[serde(flatten)]
    session: SessionRequest<'a>,
    amount: &'a str,
    redirect_response_url: &'a str,
    browser_details: &'a BrowserDetails,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AuthorizePayRequest<'a> {
    #[serde(flatten)]
    session: SessionRequest<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<&'a str>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RetrieveTransactionRequest<'a> {
    merchant_config: &'a MerchantConfig,
    order_id: &'a str,
    transaction_id: &'a str,
}

//------------------------------------------------------------------------------
// Responses
//------------------------------------------------------------------------------

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionid")]
    pub session_id: String,
    #[serde(rename = "orderid")]
    pub order_id: String,
    #[serde(rename = "trxid")]
    pub transaction_id: String,
    #[serde(rename = "apiLog", default)]
    pub api_log: Option<ApiCall>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitiateAuthenticationResponse {
    #[serde(default)]
    pub authentication_status: Option<AuthenticationStatus>,
    #[serde(default)]
    pub gateway_recommendation: Option<String>,
    #[serde(default)]
    pub api_log: Option<ApiCall>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatePayerResponse {
    /// Issuer challenge page; absent when no interaction is needed.
    #[serde(default)]
    pub redirect_html: Option<String>,
    #[serde(default)]
    pub authentication_status: Option<AuthenticationStatus>,
    #[serde(default)]
    pub api_log: Option<ApiCall>,
}

impl AuthenticatePayerResponse {
    pub fn challenge_html(&self) -> Option<&str> {
        self.redirect_html.as_deref().filter(|html| !html.trim().is_empty())
    }
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizePayResponse {
    #[serde(default)]
    pub result: Option<String>,
    /// Id of the payment transaction, distinct from the authentication one.
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub gateway_code: Option<String>,
    #[serde(default)]
    pub gateway_recommendation: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub authentication_status: Option<AuthenticationStatus>,
    #[serde(default)]
    pub api_log: Option<ApiCall>,
    /// The whole response body, for the receipt's raw view.
    #[serde(skip)]
    pub raw: Value,
}

impl AuthorizePayResponse {
    pub fn is_success(&self) -> bool {
        self.result.as_deref() == Some("SUCCESS")
    }
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(default)]
    pub authentication_status: Option<AuthenticationStatus>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponseSummary {
    #[serde(default)]
    pub gateway_code: Option<String>,
    #[serde(default)]
    pub gateway_recommendation: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveTransactionResponse {
    #[serde(default)]
    pub order: Option<OrderSummary>,
    #[serde(default)]
    pub response: Option<GatewayResponseSummary>,
    #[serde(default)]
    pub api_log: Option<ApiCall>,
    #[serde(skip)]
    pub raw: Value,
}

impl RetrieveTransactionResponse {
    pub fn authentication_status(&self) -> Option<&AuthenticationStatus> {
        self.order.as_ref()?.authentication_status.as_ref()
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body: `{ details: string | { error: { explanation } }, apiLog? }`.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    details: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    api_log: Option<ApiCall>,
}

/// Best human readable text out of a backend `details` value.
pub fn error_detail(details: &Value) -> Option<String> {
    match details {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => details
            .pointer("/error/explanation")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(details.to_string())),
        other => Some(other.to_string()),
    }
}

//------------------------------------------------------------------------------
// Client
//------------------------------------------------------------------------------

#[async_trait(?Send)]
pub trait GatewayApi {
    async fn create_session(
        &self,
        config: &MerchantConfig,
        amount: &str,
        currency: &str,
    ) -> Result<CreateSessionResponse, GatewayError>;

    async fn initiate_authentication(
        &self,
        config: &MerchantConfig,
        session: &PaymentSession,
    ) -> Result<InitiateAuthenticationResponse, GatewayError>;

    async fn authenticate_payer(
        &self,
        config: &MerchantConfig,
        session: &PaymentSession,
        amount: &str,
        redirect_response_url: &str,
        browser: &BrowserDetails,
    ) -> Result<AuthenticatePayerResponse, GatewayError>;

    async fn authorize_pay(
        &self,
        config: &MerchantConfig,
        session: &PaymentSession,
        amount: Option<&str>,
    ) -> Result<AuthorizePayResponse, GatewayError>;

    async fn retrieve_transaction(
        &self,
        config: &MerchantConfig,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<RetrieveTransactionResponse, GatewayError>;

    async fn health(&self) -> Result<HealthResponse, GatewayError>;
}

/// Cloneable handle to the backend, provided to components through context.
#[derive(Clone)]
pub struct SharedGateway(pub Rc<dyn GatewayApi>);

impl SharedGateway {
    pub fn new<A: GatewayApi + 'static>(api: A) -> Self {
        Self(Rc::new(api))
    }

    pub fn api(&self) -> &dyn GatewayApi {
        self.0.as_ref()
    }
}

impl PartialEq for SharedGateway {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// [`GatewayApi`] over HTTP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpGateway {
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.api_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<(T, Value), GatewayError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        log::debug!(target: "gateway", "POST {}", path);
        let response = Request::post(&self.url(path))
            .json(body)
            .map_err(|e| GatewayError::transport(e.to_string()))?
            .send()
            .await
            .map_err(|e| GatewayError::transport(format!("Network error: {}", e)))?;
        read_response(path, response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<(T, Value), GatewayError> {
        log::debug!(target: "gateway", "GET {}", path);
        let response = Request::get(&self.url(path))
            .send()
            .await
            .map_err(|e| GatewayError::transport(format!("Network error: {}", e)))?;
        read_response(path, response).await
    }
}

async fn read_response<T: DeserializeOwned>(
    path: &str,
    response: Response,
) -> Result<(T, Value), GatewayError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| GatewayError::transport(e.to_string()))?;

    if !response.ok() {
        log::warn!(target: "gateway", "{} answered {}", path, status);
        return Err(decode_error(status, &text));
    }

    let raw: Value = serde_json::from_str(&text)
        .map_err(|e| GatewayError::transport(format!("Bad JSON from {}: {}", path, e)))?;
    let typed = T::deserialize(&raw)
        .map_err(|e| GatewayError::transport(format!("Unexpected response from {}: {}", path, e)))?;
    Ok((typed, raw))
}

/// Turn a non-2xx body into a [`GatewayError`], keeping its `apiLog`.
pub fn decode_error(status: u16, body: &str) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .details
        .as_ref()
        .and_then(error_detail)
        .or_else(|| parsed.error.as_ref().and_then(error_detail))
        .unwrap_or_else(|| format!("Request failed with status code {}", status));
    GatewayError::with_status(status, message, parsed.api_log)
}

#[async_trait(?Send)]
impl GatewayApi for HttpGateway {
    async fn create_session(
        &self,
        config: &MerchantConfig,
        amount: &str,
        currency: &str,
    ) -> Result<CreateSessionResponse, GatewayError> {
        let body = CreateSessionRequest {
            merchant_config: config,
            amount,
            currency,
        };
        self.post(CREATE_SESSION, &body).await.map(|(typed, _)| typed)
    }

    async fn initiate_authentication(
        &self,
        config: &MerchantConfig,
        session: &PaymentSession,
    ) -> Result<InitiateAuthenticationResponse, GatewayError> {
        let body = SessionRequest::new(config, session);
        self.post(INITIATE_AUTHENTICATION, &body)
            .await
            .map(|(typed, _)| typed)
    }

    async fn authenticate_payer(
        &self,
        config: &MerchantConfig,
        session: &PaymentSession,
        amount: &str,
        redirect_response_url: &str,
        browser: &BrowserDetails,
    ) -> Result<AuthenticatePayerResponse, GatewayError> {
        let body = AuthenticatePayerRequest {
            session: SessionRequest::new(config, session),
            amount,
            redirect_response_url,
            browser_details: browser,
        };
        self.post(AUTHENTICATE_PAYER, &body).await.map(|(typed, _)| typed)
    }

    async fn authorize_pay(
        &self,
        config: &MerchantConfig,
        session: &PaymentSession,
        amount: Option<&str>,
    ) -> Result<AuthorizePayResponse, GatewayError> {
        let body = AuthorizePayRequest {
            session: SessionRequest::new(config, session),
            amount,
        };
        let (mut typed, raw): (AuthorizePayResponse, Value) = self.post(AUTHORIZE_PAY, &body).await?;
        typed.raw = raw;
        Ok(typed)
    }

    async fn retrieve_transaction(
        &self,
        config: &MerchantConfig,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<RetrieveTransactionResponse, GatewayError> {
        let body = RetrieveTransactionRequest {
            merchant_config: config,
            order_id,
            transaction_id,
        };
        let (mut typed, raw): (RetrieveTransactionResponse, Value) =
            self.post(RETRIEVE_TRANSACTION, &body).await?;
        typed.raw = raw;
        Ok(typed)
    }

    async fn health(&self) -> Result<HealthResponse, GatewayError> {
        self.get(HEALTH).await.map(|(typed, _)| typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> PaymentSession {
        PaymentSession {
            session_id: "SESSION0002".into(),
            order_id: "ORD-1".into(),
            transaction_id: "TRX-1".into(),
        }
    }

    #[test]
    fn statuses_parse_and_keep_unknown_values() {
        let parsed: InitiateAuthenticationResponse = serde_json::from_value(json!({
            "authenticationStatus": "AUTHENTICATION_NOT_IN_EFFECT",
            "gatewayRecommendation": "PROCEED"
        }))
        .unwrap();
        assert_eq!(parsed.authentication_status, Some(AuthenticationStatus::NotInEffect));

        let odd: AuthenticationStatus = serde_json::from_value(json!("AUTHENTICATION_PENDING")).unwrap();
        assert_eq!(odd, AuthenticationStatus::Other("AUTHENTICATION_PENDING".into()));
        assert_eq!(odd.to_string(), "AUTHENTICATION_PENDING");
    }

    #[test]
    fn create_session_response_uses_backend_keys() {
        let parsed: CreateSessionResponse = serde_json::from_value(json!({
            "sessionid": "SESSION0002",
            "orderid": "ORD-1",
            "trxid": "TRX-1",
            "apiLog": { "endpoint": "/session", "method": "POST" }
        }))
        .unwrap();
        assert_eq!(parsed.session_id, "SESSION0002");
        assert_eq!(parsed.api_log.unwrap().endpoint.as_deref(), Some("/session"));
    }

    #[test]
    fn authenticate_payer_body_carries_fingerprint() {
        let config = MerchantConfig::test_credentials();
        let session = session();
        let browser = BrowserDetails::default();
        let body = AuthenticatePayerRequest {
            session: SessionRequest::new(&config, &session),
            amount: "1800.00",
            redirect_response_url: "https://shop/authentication-callback",
            browser_details: &browser,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["merchantConfig"]["merchantId"], "TESTMPGSTEST0101");
        assert_eq!(value["sessionId"], "SESSION0002");
        assert_eq!(value["orderId"], "ORD-1");
        assert_eq!(value["transactionId"], "TRX-1");
        assert_eq!(value["amount"], "1800.00");
        assert_eq!(value["redirectResponseUrl"], "https://shop/authentication-callback");
        assert_eq!(value["browserDetails"]["colorDepth"], 24);
        assert_eq!(value["browserDetails"]["javaEnabled"], false);
    }

    #[test]
    fn authorize_pay_omits_missing_amount() {
        let config = MerchantConfig::test_credentials();
        let session = session();
        let body = AuthorizePayRequest {
            session: SessionRequest::new(&config, &session),
            amount: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("amount").is_none());
        assert_eq!(value["transactionId"], "TRX-1");
    }

    #[test]
    fn challenge_html_ignores_blank_markup() {
        let blank = AuthenticatePayerResponse {
            redirect_html: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(blank.challenge_html(), None);
    }

    #[test]
    fn error_bodies_prefer_gateway_explanation() {
        let err = decode_error(
            400,
            r#"{"details":{"error":{"cause":"INVALID_REQUEST","explanation":"Invalid card number"}},"apiLog":{"endpoint":"/pay","error":{"status":400}}}"#,
        );
        assert_eq!(err.message, "Invalid card number");
        assert_eq!(err.status, Some(400));
        assert!(err.api_log.unwrap().is_error());

        let err = decode_error(502, r#"{"details":"gateway unreachable"}"#);
        assert_eq!(err.message, "gateway unreachable");

        let err = decode_error(500, "<html>oops</html>");
        assert_eq!(err.message, "Request failed with status code 500");
        assert!(err.api_log.is_none());
    }

    #[test]
    fn base_url_is_normalised() {
        let gateway = HttpGateway::new("http://localhost:3001/");
        assert_eq!(gateway.url(CREATE_SESSION), "http://localhost:3001/create-session");
    }
}
