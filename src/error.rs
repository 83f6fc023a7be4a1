//! Error types shared by the checkout flow.
//!
//! Every failure the UI can show ends up as a [`CheckoutError`]; its
//! `Display` text is what the user reads. Backend failures keep the `apiLog`
//! the backend attached so the caller can still record it.

use thiserror::Error;

use crate::api_log::ApiCall;
use crate::sequencer::AuthStep;

/// A non-2xx response or transport failure from the merchant backend.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GatewayError {
    /// Human readable detail, preferring the gateway's own explanation.
    pub message: String,
    /// HTTP status, `None` for transport and decode failures.
    pub status: Option<u16>,
    /// Log record the backend attached to the failed response, if any.
    pub api_log: Option<ApiCall>,
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            api_log: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>, api_log: Option<ApiCall>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            api_log,
        }
    }

    /// Detach the attached log record, leaving `None` behind.
    pub fn take_api_log(&mut self) -> Option<ApiCall> {
        self.api_log.take()
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Merchant configuration not found. Please configure your merchant details.")]
    MissingConfig,
    #[error("Invalid merchant configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Unexpected authentication status: {status}")]
    UnexpectedStatus { step: AuthStep, status: String },
    #[error("Payment failed: {0}")]
    PaymentDeclined(String),
    #[error("Failed to capture card details: {0}")]
    CardCapture(String),
    #[error("Failed to load Payment Session script. Please check your merchant configuration.")]
    ScriptLoad(String),
    #[error("Payment Session script failed to load. Please refresh the page.")]
    WidgetUnavailable,
    #[error("Payment form did not render ({}). Please refresh the page.", .0.join(", "))]
    ElementsNotMounted(Vec<String>),
    #[error("Failed to initialize payment form. Please refresh and try again.")]
    WidgetConfigure(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("Step {} failed: {source}", .step.number())]
    StepFailed {
        step: AuthStep,
        #[source]
        source: Box<CheckoutError>,
    },
}

impl CheckoutError {
    /// Errors that should send the user back to the configuration screen.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingConfig | Self::InvalidConfig(_))
    }

    /// Widget and script failures; the page has to be reloaded.
    pub fn needs_refresh(&self) -> bool {
        matches!(
            self,
            Self::ScriptLoad(_)
                | Self::WidgetUnavailable
                | Self::ElementsNotMounted(_)
                | Self::WidgetConfigure(_)
        )
    }

    pub(crate) fn at_step(self, step: AuthStep) -> Self {
        match self {
            already @ Self::StepFailed { .. } => already,
            other => Self::StepFailed {
                step,
                source: Box::new(other),
            },
        }
    }
}

impl From<gloo_storage::errors::StorageError> for CheckoutError {
    fn from(err: gloo_storage::errors::StorageError) -> Self {
        CheckoutError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failures_are_prefixed_once() {
        let err = CheckoutError::Gateway(GatewayError::transport("connection refused"))
            .at_step(AuthStep::CheckingAvailability)
            .at_step(AuthStep::Authorizing);
        assert_eq!(err.to_string(), "Step 1 failed: connection refused");
    }

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(CheckoutError::MissingConfig.is_configuration());
        assert!(!CheckoutError::WidgetUnavailable.is_configuration());
        assert!(CheckoutError::ElementsNotMounted(vec!["#card-number".into()]).needs_refresh());
    }

    #[test]
    fn missing_elements_are_listed() {
        let err = CheckoutError::ElementsNotMounted(vec!["#card-number".into(), "#security-code".into()]);
        assert_eq!(
            err.to_string(),
            "Payment form did not render (#card-number, #security-code). Please refresh the page."
        );
    }
}
