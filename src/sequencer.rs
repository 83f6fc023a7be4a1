//! Three-step 3-D Secure sequence: initiate authentication, authenticate the
//! payer, authorize/pay.
//!
//! The branches are dictated by the gateway's status strings:
//!
//! ```text
//! initiate ── AVAILABLE ─────────────────────▶ authenticate payer ── redirectHtml ──▶ challenge
//!    │                                              │
//!    └─ NOT_AVAILABLE / NOT_SUPPORTED / NOT_IN_EFFECT ┴──────────────▶ authorize/pay ──▶ outcome
//! ```
//!
//! Any other step-1 status halts the attempt. Nothing is retried.

use crate::api_log::ApiLog;
use crate::config::MerchantConfig;
use crate::error::{CheckoutError, GatewayError};
use crate::gateway::{AuthenticationStatus, BrowserDetails, GatewayApi};
use crate::outcome::PaymentOutcome;
use crate::session::PaymentSession;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthStep {
    #[default]
    Idle,
    CheckingAvailability,
    AuthenticatingPayer,
    Authorizing,
}

impl AuthStep {
    pub fn number(self) -> u8 {
        match self {
            AuthStep::Idle => 0,
            AuthStep::CheckingAvailability => 1,
            AuthStep::AuthenticatingPayer => 2,
            AuthStep::Authorizing => 3,
        }
    }

    pub fn status_text(self) -> &'static str {
        match self {
            AuthStep::Idle => "",
            AuthStep::CheckingAvailability => "Step 1: Checking 3DS availability...",
            AuthStep::AuthenticatingPayer => "Step 2: Authenticating payer...",
            AuthStep::Authorizing => "Step 3: Processing payment...",
        }
    }
}

/// Where step 1 sends the flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextStep {
    AuthenticatePayer,
    AuthorizePay,
}

pub fn route_after_initiate(status: Option<&AuthenticationStatus>) -> Result<NextStep, CheckoutError> {
    match status {
        Some(AuthenticationStatus::Available) => Ok(NextStep::AuthenticatePayer),
        Some(
            AuthenticationStatus::NotAvailable
            | AuthenticationStatus::NotSupported
            | AuthenticationStatus::NotInEffect,
        ) => Ok(NextStep::AuthorizePay),
        other => Err(CheckoutError::UnexpectedStatus {
            step: AuthStep::CheckingAvailability,
            status: other.map_or_else(|| "missing".to_string(), ToString::to_string),
        }),
    }
}

/// Issuer challenge handed to the challenge presenter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    pub html: String,
    pub session: PaymentSession,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SequenceOutcome {
    /// Authorize/pay answered `SUCCESS`.
    Paid(PaymentOutcome),
    /// The issuer wants the payer to interact; the sequence is suspended.
    ChallengeRequired(Challenge),
}

pub struct ThreeDsSequencer<'a, A: ?Sized> {
    api: &'a A,
    log: &'a ApiLog,
    config: &'a MerchantConfig,
    amount: &'a str,
    redirect_response_url: String,
    browser: BrowserDetails,
}

impl<'a, A> ThreeDsSequencer<'a, A>
where
    A: GatewayApi + ?Sized,
{
    pub fn new(
        api: &'a A,
        log: &'a ApiLog,
        config: &'a MerchantConfig,
        amount: &'a str,
        redirect_response_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            log,
            config,
            amount,
            redirect_response_url: redirect_response_url.into(),
            browser: BrowserDetails::default(),
        }
    }

    pub fn with_browser(mut self, browser: BrowserDetails) -> Self {
        self.browser = browser;
        self
    }

    /// Run the sequence for `session`, reporting each step as it starts.
    pub async fn run<F>(&self, session: &PaymentSession, mut on_step: F) -> Result<SequenceOutcome, CheckoutError>
    where
        F: FnMut(AuthStep),
    {
        on_step(AuthStep::CheckingAvailability);
        let next = self.initiate_authentication(session).await?;

        if next == NextStep::AuthenticatePayer {
            on_step(AuthStep::AuthenticatingPayer);
            if let Some(challenge) = self.authenticate_payer(session).await? {
                return Ok(SequenceOutcome::ChallengeRequired(challenge));
            }
        }

        on_step(AuthStep::Authorizing);
        self.authorize_pay(session).await.map(SequenceOutcome::Paid)
    }

    /// Step 1.
    pub async fn initiate_authentication(&self, session: &PaymentSession) -> Result<NextStep, CheckoutError> {
        let step = AuthStep::CheckingAvailability;
        log::info!(target: "three_ds", "[STEP 1] Initiating authentication for order {}", session.order_id);
        let mut response = self
            .api
            .initiate_authentication(self.config, session)
            .await
            .map_err(|err| self.fail(step, err))?;
        self.log.record_opt(response.api_log.take());

        log::info!(
            target: "three_ds",
            "[STEP 1] Auth status: {:?}, recommendation: {:?}",
            response.authentication_status,
            response.gateway_recommendation
        );
        route_after_initiate(response.authentication_status.as_ref()).map_err(|err| {
            log::error!(target: "three_ds", "[STEP 1] {}", err);
            err
        })
    }

    /// Step 2. `Some` when the issuer requires a challenge.
    pub async fn authenticate_payer(&self, session: &PaymentSession) -> Result<Option<Challenge>, CheckoutError> {
        let step = AuthStep::AuthenticatingPayer;
        log::info!(target: "three_ds", "[STEP 2] Authenticating payer...");
        let mut response = self
            .api
            .authenticate_payer(
                self.config,
                session,
                self.amount,
                &self.redirect_response_url,
                &self.browser,
            )
            .await
            .map_err(|err| self.fail(step, err))?;
        self.log.record_opt(response.api_log.take());

        match response.challenge_html() {
            Some(html) => {
                log::info!(target: "three_ds", "[STEP 2] 3DS challenge required");
                Ok(Some(Challenge {
                    html: html.to_string(),
                    session: session.clone(),
                }))
            }
            None => {
                log::info!(target: "three_ds", "[STEP 2] No challenge needed, proceeding to payment");
                Ok(None)
            }
        }
    }

    /// Step 3. Anything but `SUCCESS` is a declined payment.
    pub async fn authorize_pay(&self, session: &PaymentSession) -> Result<PaymentOutcome, CheckoutError> {
        let step = AuthStep::Authorizing;
        log::info!(target: "three_ds", "[STEP 3] Authorizing payment...");
        let mut response = self
            .api
            .authorize_pay(self.config, session, Some(self.amount))
            .await
            .map_err(|err| self.fail(step, err))?;
        self.log.record_opt(response.api_log.take());

        if response.is_success() {
            log::info!(target: "three_ds", "[STEP 3] Payment successful");
            Ok(PaymentOutcome::from_payment(session, &response))
        } else {
            let result = response.result.unwrap_or_else(|| "UNKNOWN".to_string());
            log::warn!(target: "three_ds", "[STEP 3] Payment failed: {}", result);
            Err(CheckoutError::PaymentDeclined(result))
        }
    }

    fn fail(&self, step: AuthStep, mut err: GatewayError) -> CheckoutError {
        log::error!(target: "three_ds", "[STEP {}] Error: {}", step.number(), err);
        self.log.record_opt(err.take_api_log());
        CheckoutError::from(err).at_step(step)
    }
}
