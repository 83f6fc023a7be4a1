//! Terminal result of a checkout attempt, as shown on the receipt screen.

use serde_json::Value;

use crate::gateway::{AuthorizePayResponse, RetrieveTransactionResponse};
use crate::session::PaymentSession;

pub const FAILED: &str = "FAILED";
pub const SUCCESS: &str = "SUCCESS";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaymentOutcome {
    pub order_id: String,
    pub transaction_id: String,
    /// Gateway result (`SUCCESS`, `FAILURE`, ...) or `FAILED` for client-side failures.
    pub status: String,
    pub gateway_code: Option<String>,
    pub gateway_recommendation: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub authentication_status: Option<String>,
    pub error: Option<String>,
    pub full_response: Option<Value>,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }

    /// Outcome of an authorize/pay call made for `session`.
    pub fn from_payment(session: &PaymentSession, pay: &AuthorizePayResponse) -> Self {
        Self {
            order_id: session.order_id.clone(),
            transaction_id: session.transaction_id.clone(),
            status: pay.result.clone().unwrap_or_else(|| FAILED.to_string()),
            gateway_code: pay.gateway_code.clone(),
            gateway_recommendation: pay.gateway_recommendation.clone(),
            amount: pay.amount.as_ref().and_then(value_label),
            currency: pay.currency.clone(),
            authentication_status: pay.authentication_status.as_ref().map(ToString::to_string),
            error: None,
            full_response: Some(pay.raw.clone()).filter(|raw| !raw.is_null()),
        }
    }

    /// Failed outcome built from a transaction retrieval whose authentication did not succeed.
    pub fn from_retrieval(
        order_id: &str,
        transaction_id: &str,
        retrieval: &RetrieveTransactionResponse,
        error: String,
    ) -> Self {
        let order = retrieval.order.as_ref();
        let response = retrieval.response.as_ref();
        Self {
            order_id: order_id.to_string(),
            transaction_id: transaction_id.to_string(),
            status: FAILED.to_string(),
            gateway_code: response.and_then(|r| r.gateway_code.clone()),
            gateway_recommendation: response.and_then(|r| r.gateway_recommendation.clone()),
            amount: order.and_then(|o| o.amount.as_ref()).and_then(value_label),
            currency: order.and_then(|o| o.currency.clone()),
            authentication_status: retrieval.authentication_status().map(ToString::to_string),
            error: Some(error),
            full_response: Some(retrieval.raw.clone()).filter(|raw| !raw.is_null()),
        }
    }

    pub fn failed(order_id: &str, transaction_id: &str, error: String) -> Self {
        Self {
            order_id: order_id.to_string(),
            transaction_id: transaction_id.to_string(),
            status: FAILED.to_string(),
            error: Some(error),
            ..Self::default()
        }
    }
}

impl PaymentOutcome {
    /// Label/value pairs for the receipt's transaction table; absent fields are left out.
    pub fn detail_rows(&self) -> Vec<(&'static str, String)> {
        let amount = self.amount.as_ref().map(|amount| match &self.currency {
            Some(currency) => format!("{} {}", currency, amount),
            None => amount.clone(),
        });
        [
            ("Order ID", Some(self.order_id.clone())),
            ("Transaction ID", Some(self.transaction_id.clone())),
            ("Status", Some(self.status.clone())),
            ("Amount", amount),
            ("Gateway Code", self.gateway_code.clone()),
            ("Recommendation", self.gateway_recommendation.clone()),
            ("Authentication Status", self.authentication_status.clone()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.filter(|v| !v.is_empty()).map(|v| (label, v)))
        .collect()
    }
}

fn value_label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
