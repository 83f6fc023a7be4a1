//! End-to-end checkout flow against a scripted backend.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use futures::executor::block_on;

use yew_mpgs::api_log::{ApiCall, ApiLog};
use yew_mpgs::cart::Cart;
use yew_mpgs::challenge::ChallengeResolver;
use yew_mpgs::config::MerchantConfig;
use yew_mpgs::gateway::{
    AuthenticatePayerResponse, AuthenticationStatus, AuthorizePayResponse, BrowserDetails,
    CreateSessionResponse, GatewayApi, HealthResponse, InitiateAuthenticationResponse, OrderSummary,
    RetrieveTransactionResponse,
};
use yew_mpgs::outcome::FAILED;
use yew_mpgs::sequencer::{AuthStep, Challenge, SequenceOutcome, ThreeDsSequencer};
use yew_mpgs::session::{create_session, PaymentSession, SessionGuard};
use yew_mpgs::storage::MemoryStorage;
use yew_mpgs::{CheckoutError, GatewayError};

const REDIRECT_URL: &str = "https://shop.test/authentication-callback";

#[derive(Clone, Debug, PartialEq)]
enum Call {
    CreateSession { amount: String, currency: String },
    Initiate(PaymentSession),
    AuthenticatePayer { session: PaymentSession, amount: String, redirect: String },
    AuthorizePay { session: PaymentSession, amount: Option<String> },
    Retrieve { order_id: String, transaction_id: String },
    Health,
}

type Script<T> = RefCell<VecDeque<Result<T, GatewayError>>>;

#[derive(Default)]
struct MockGateway {
    calls: RefCell<Vec<Call>>,
    create: Script<CreateSessionResponse>,
    initiate: Script<InitiateAuthenticationResponse>,
    payer: Script<AuthenticatePayerResponse>,
    pay: Script<AuthorizePayResponse>,
    retrieve: Script<RetrieveTransactionResponse>,
}

fn next<T>(script: &Script<T>, name: &str) -> Result<T, GatewayError> {
    script
        .borrow_mut()
        .pop_front()
        .unwrap_or_else(|| Err(GatewayError::transport(format!("unscripted {}", name))))
}

impl MockGateway {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn initiate_with(self, status: AuthenticationStatus) -> Self {
        self.initiate.borrow_mut().push_back(Ok(InitiateAuthenticationResponse {
            authentication_status: Some(status),
            gateway_recommendation: Some("PROCEED".into()),
            api_log: Some(ApiCall::new("POST", "/api/initiate-authentication")),
        }));
        self
    }

    fn payer_with(self, redirect_html: Option<&str>) -> Self {
        self.payer.borrow_mut().push_back(Ok(AuthenticatePayerResponse {
            redirect_html: redirect_html.map(str::to_string),
            ..Default::default()
        }));
        self
    }

    fn pay_with(self, result: &str, transaction_id: Option<&str>) -> Self {
        self.pay.borrow_mut().push_back(Ok(AuthorizePayResponse {
            result: Some(result.into()),
            transaction_id: transaction_id.map(str::to_string),
            gateway_code: Some("APPROVED".into()),
            amount: Some(serde_json::json!(1800.0)),
            currency: Some("USD".into()),
            api_log: Some(ApiCall::new("POST", "/api/authorize-pay")),
            ..Default::default()
        }));
        self
    }

    fn retrieve_with(self, status: Option<AuthenticationStatus>) -> Self {
        self.retrieve.borrow_mut().push_back(Ok(RetrieveTransactionResponse {
            order: Some(OrderSummary {
                authentication_status: status,
                ..Default::default()
            }),
            ..Default::default()
        }));
        self
    }
}

#[async_trait(?Send)]
impl GatewayApi for MockGateway {
    async fn create_session(
        &self,
        _config: &MerchantConfig,
        amount: &str,
        currency: &str,
    ) -> Result<CreateSessionResponse, GatewayError> {
        self.calls.borrow_mut().push(Call::CreateSession {
            amount: amount.into(),
            currency: currency.into(),
        });
        next(&self.create, "create_session")
    }

    async fn initiate_authentication(
        &self,
        _config: &MerchantConfig,
        session: &PaymentSession,
    ) -> Result<InitiateAuthenticationResponse, GatewayError> {
        self.calls.borrow_mut().push(Call::Initiate(session.clone()));
        next(&self.initiate, "initiate_authentication")
    }

    async fn authenticate_payer(
        &self,
        _config: &MerchantConfig,
        session: &PaymentSession,
        amount: &str,
        redirect_response_url: &str,
        _browser: &BrowserDetails,
    ) -> Result<AuthenticatePayerResponse, GatewayError> {
        self.calls.borrow_mut().push(Call::AuthenticatePayer {
            session: session.clone(),
            amount: amount.into(),
            redirect: redirect_response_url.into(),
        });
        next(&self.payer, "authenticate_payer")
    }

    async fn authorize_pay(
        &self,
        _config: &MerchantConfig,
        session: &PaymentSession,
        amount: Option<&str>,
    ) -> Result<AuthorizePayResponse, GatewayError> {
        self.calls.borrow_mut().push(Call::AuthorizePay {
            session: session.clone(),
            amount: amount.map(str::to_string),
        });
        next(&self.pay, "authorize_pay")
    }

    async fn retrieve_transaction(
        &self,
        _config: &MerchantConfig,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<RetrieveTransactionResponse, GatewayError> {
        self.calls.borrow_mut().push(Call::Retrieve {
            order_id: order_id.into(),
            transaction_id: transaction_id.into(),
        });
        next(&self.retrieve, "retrieve_transaction")
    }

    async fn health(&self) -> Result<HealthResponse, GatewayError> {
        self.calls.borrow_mut().push(Call::Health);
        Ok(HealthResponse { status: "ok".into() })
    }
}

fn ledger() -> ApiLog {
    ApiLog::new(Rc::new(MemoryStorage::new()))
}

fn session() -> PaymentSession {
    PaymentSession {
        session_id: "SESSION0002".into(),
        order_id: "ORD-100".into(),
        transaction_id: "TRX-100".into(),
    }
}

fn run(api: &MockGateway, log: &ApiLog, session: &PaymentSession) -> (Result<SequenceOutcome, CheckoutError>, Vec<AuthStep>) {
    let config = MerchantConfig::test_credentials();
    let mut steps = Vec::new();
    let result = block_on(
        ThreeDsSequencer::new(api, log, &config, "1800.00", REDIRECT_URL).run(session, |step| steps.push(step)),
    );
    (result, steps)
}

fn challenge_resolver() -> ChallengeResolver {
    ChallengeResolver::new(Challenge {
        html: "<form id=\"threedsChallengeRedirectForm\"></form>".into(),
        session: session(),
    })
}

#[test]
fn available_authenticates_payer_once_before_paying() {
    let api = MockGateway::default()
        .initiate_with(AuthenticationStatus::Available)
        .payer_with(None)
        .pay_with("SUCCESS", None);
    let log = ledger();

    let (result, steps) = run(&api, &log, &session());

    assert!(matches!(result, Ok(SequenceOutcome::Paid(ref outcome)) if outcome.is_success()));
    assert_eq!(
        steps,
        [AuthStep::CheckingAvailability, AuthStep::AuthenticatingPayer, AuthStep::Authorizing]
    );
    assert_eq!(
        api.calls(),
        vec![
            Call::Initiate(session()),
            Call::AuthenticatePayer {
                session: session(),
                amount: "1800.00".into(),
                redirect: REDIRECT_URL.into(),
            },
            Call::AuthorizePay {
                session: session(),
                amount: Some("1800.00".into()),
            },
        ]
    );
    assert_eq!(log.len(), 2);
}

#[test]
fn unavailable_statuses_skip_payer_authentication() {
    for status in [
        AuthenticationStatus::NotAvailable,
        AuthenticationStatus::NotSupported,
        AuthenticationStatus::NotInEffect,
    ] {
        let api = MockGateway::default()
            .initiate_with(status.clone())
            .pay_with("SUCCESS", None);
        let (result, steps) = run(&api, &ledger(), &session());

        assert!(matches!(result, Ok(SequenceOutcome::Paid(_))), "{}", status);
        assert_eq!(steps, [AuthStep::CheckingAvailability, AuthStep::Authorizing]);
        assert!(!api.calls().iter().any(|call| matches!(call, Call::AuthenticatePayer { .. })));
    }
}

#[test]
fn challenge_suspends_before_payment() {
    let api = MockGateway::default()
        .initiate_with(AuthenticationStatus::Available)
        .payer_with(Some("<div id=\"threedsChallengeRedirect\"></div>"));

    let (result, _) = run(&api, &ledger(), &session());

    match result {
        Ok(SequenceOutcome::ChallengeRequired(challenge)) => {
            assert_eq!(challenge.session, session());
            assert!(challenge.html.contains("threedsChallengeRedirect"));
        }
        other => panic!("expected a challenge, got {:?}", other),
    }
    assert!(!api.calls().iter().any(|call| matches!(call, Call::AuthorizePay { .. })));
}

#[test]
fn blank_redirect_html_is_no_challenge() {
    let api = MockGateway::default()
        .initiate_with(AuthenticationStatus::Available)
        .payer_with(Some("   "))
        .pay_with("SUCCESS", None);

    let (result, _) = run(&api, &ledger(), &session());

    assert!(matches!(result, Ok(SequenceOutcome::Paid(_))));
}

#[test]
fn unexpected_status_halts_after_step_one() {
    let api = MockGateway::default().initiate_with(AuthenticationStatus::Other("AUTHENTICATION_PENDING".into()));

    let (result, steps) = run(&api, &ledger(), &session());

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Unexpected authentication status: AUTHENTICATION_PENDING");
    assert_eq!(steps, [AuthStep::CheckingAvailability]);
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn transport_error_stops_the_sequence() {
    let api = MockGateway::default();
    api.initiate
        .borrow_mut()
        .push_back(Err(GatewayError::transport("Network error: connection refused")));

    let (result, _) = run(&api, &ledger(), &session());

    assert_eq!(result.unwrap_err().to_string(), "Step 1 failed: Network error: connection refused");
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn declined_payment_reports_gateway_result() {
    let api = MockGateway::default()
        .initiate_with(AuthenticationStatus::NotAvailable)
        .pay_with("FAILURE", None);

    let (result, _) = run(&api, &ledger(), &session());

    let err = result.unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentDeclined(ref result) if result == "FAILURE"));
    assert_eq!(err.to_string(), "Payment failed: FAILURE");
}

#[test]
fn error_responses_still_record_their_api_log() {
    let mut failed = ApiCall::new("POST", "/api/authenticate-payer");
    failed.error = Some(serde_json::json!({ "message": "Request failed with status code 502" }));
    let api = MockGateway::default().initiate_with(AuthenticationStatus::Available);
    api.payer
        .borrow_mut()
        .push_back(Err(GatewayError::with_status(502, "Gateway unavailable", Some(failed))));
    let log = ledger();

    let (result, _) = run(&api, &log, &session());

    assert_eq!(result.unwrap_err().to_string(), "Step 2 failed: Gateway unavailable");
    let stats = log.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.endpoints.get("/api/authenticate-payer"), Some(&1));
}

#[test]
fn session_is_created_once_per_guard() {
    let api = MockGateway::default();
    api.create.borrow_mut().push_back(Ok(CreateSessionResponse {
        session_id: "SESSION0002".into(),
        order_id: "ORD-100".into(),
        transaction_id: "TRX-100".into(),
        api_log: Some(ApiCall::new("POST", "/create-session")),
    }));
    let log = ledger();
    let guard = SessionGuard::new();
    let config = MerchantConfig::test_credentials();

    let first = block_on(create_session(&api, &log, &guard, &config, "1800.00")).unwrap();
    let second = block_on(create_session(&api, &log, &guard, &config, "1800.00")).unwrap();

    assert_eq!(first, Some(session()));
    assert_eq!(second, None);
    assert_eq!(api.calls().len(), 1);
    assert_eq!(log.len(), 1);
}

#[test]
fn session_creation_is_skipped_while_in_flight() {
    let api = MockGateway::default();
    let guard = SessionGuard::new();
    assert!(guard.try_begin());

    let result = block_on(create_session(&api, &ledger(), &guard, &MerchantConfig::test_credentials(), "1.00"));

    assert_eq!(result.unwrap(), None);
    assert!(api.calls().is_empty());
}

#[test]
fn failed_session_creation_is_not_retried() {
    let api = MockGateway::default();
    api.create
        .borrow_mut()
        .push_back(Err(GatewayError::with_status(401, "Invalid merchant credentials", None)));
    let guard = SessionGuard::new();
    let config = MerchantConfig::test_credentials();

    let err = block_on(create_session(&api, &ledger(), &guard, &config, "1800.00")).unwrap_err();
    let retry = block_on(create_session(&api, &ledger(), &guard, &config, "1800.00")).unwrap();

    assert_eq!(err.to_string(), "Invalid merchant credentials");
    assert_eq!(retry, None);
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn default_cart_pays_1800_with_session_ids() {
    let api = MockGateway::default()
        .initiate_with(AuthenticationStatus::NotAvailable)
        .pay_with("SUCCESS", Some("PAY-1"));
    api.create.borrow_mut().push_back(Ok(CreateSessionResponse {
        session_id: "SESSION0002".into(),
        order_id: "ORD-100".into(),
        transaction_id: "TRX-100".into(),
        api_log: None,
    }));
    let log = ledger();
    let config = MerchantConfig::test_credentials();
    let amount = Cart::default().checkout_amount().unwrap();
    assert_eq!(amount, "1800.00");

    let session = block_on(create_session(&api, &log, &SessionGuard::new(), &config, &amount))
        .unwrap()
        .unwrap();
    let result = block_on(ThreeDsSequencer::new(&api, &log, &config, &amount, REDIRECT_URL).run(&session, |_| {}));

    let outcome = match result {
        Ok(SequenceOutcome::Paid(outcome)) => outcome,
        other => panic!("expected payment, got {:?}", other),
    };
    assert_eq!(outcome.status, "SUCCESS");
    assert_eq!(outcome.order_id, "ORD-100");
    assert_eq!(outcome.transaction_id, "TRX-100");
    assert_eq!(outcome.currency.as_deref(), Some("USD"));
    assert_eq!(
        api.calls(),
        vec![
            Call::CreateSession {
                amount: "1800.00".into(),
                currency: "USD".into(),
            },
            Call::Initiate(session.clone()),
            Call::AuthorizePay {
                session,
                amount: Some("1800.00".into()),
            },
        ]
    );
}

#[test]
fn challenge_is_resolved_at_most_once() {
    let api = MockGateway::default()
        .retrieve_with(Some(AuthenticationStatus::Successful))
        .pay_with("SUCCESS", Some("PAY-7"));
    let log = ledger();
    let config = MerchantConfig::test_credentials();
    let resolver = challenge_resolver();
    let button = resolver.clone();

    let from_timer = block_on(resolver.resolve(&api, &log, &config));
    let from_button = block_on(button.resolve(&api, &log, &config));

    assert!(from_timer.is_some());
    assert!(from_button.is_none());
    let retrievals = api.calls().iter().filter(|call| matches!(call, Call::Retrieve { .. })).count();
    assert_eq!(retrievals, 1);
}

#[test]
fn successful_challenge_pays_without_amount() {
    let api = MockGateway::default()
        .retrieve_with(Some(AuthenticationStatus::Successful))
        .pay_with("SUCCESS", Some("PAY-7"));
    let resolver = challenge_resolver();

    let outcome = block_on(resolver.resolve(&api, &ledger(), &MerchantConfig::test_credentials())).unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.order_id, "ORD-100");
    assert_eq!(outcome.transaction_id, "PAY-7");
    assert_eq!(
        api.calls(),
        vec![
            Call::Retrieve {
                order_id: "ORD-100".into(),
                transaction_id: "TRX-100".into(),
            },
            Call::AuthorizePay {
                session: session(),
                amount: None,
            },
        ]
    );
}

#[test]
fn failed_challenge_reports_authentication_status() {
    let api = MockGateway::default()
        .retrieve_with(Some(AuthenticationStatus::Other("AUTHENTICATION_FAILED".into())))
        .retrieve_with(None);
    let config = MerchantConfig::test_credentials();

    let failed = block_on(challenge_resolver().resolve(&api, &ledger(), &config)).unwrap();
    let unknown = block_on(challenge_resolver().resolve(&api, &ledger(), &config)).unwrap();

    assert_eq!(failed.status, FAILED);
    assert_eq!(failed.error.as_deref(), Some("Authentication status: AUTHENTICATION_FAILED"));
    assert_eq!(unknown.error.as_deref(), Some("Authentication status: Unknown"));
    assert!(!api.calls().iter().any(|call| matches!(call, Call::AuthorizePay { .. })));
}

#[test]
fn unreachable_backend_fails_the_challenge() {
    let api = MockGateway::default();
    api.retrieve
        .borrow_mut()
        .push_back(Err(GatewayError::transport("Network error: timeout")));

    let outcome = block_on(challenge_resolver().resolve(&api, &ledger(), &MerchantConfig::test_credentials())).unwrap();

    assert!(!outcome.is_success());
    assert_eq!(outcome.order_id, "ORD-100");
    assert_eq!(outcome.transaction_id, "TRX-100");
    assert_eq!(outcome.error.as_deref(), Some("Network error: timeout"));
}

#[test]
fn payment_after_successful_challenge_can_still_fail() {
    let api = MockGateway::default()
        .retrieve_with(Some(AuthenticationStatus::Successful))
        .pay_with("FAILURE", None)
        .retrieve_with(Some(AuthenticationStatus::Successful));
    api.pay.borrow_mut().push_back(Err(GatewayError::with_status(
        502,
        "Acquirer unavailable",
        Some(ApiCall::new("POST", "/api/authorize-pay")),
    )));
    let log = ledger();
    let config = MerchantConfig::test_credentials();

    let declined = block_on(challenge_resolver().resolve(&api, &log, &config)).unwrap();
    assert!(!declined.is_success());
    assert_eq!(declined.status, "FAILURE");
    assert_eq!(declined.order_id, "ORD-100");
    assert_eq!(declined.transaction_id, "TRX-100");

    let broken = block_on(challenge_resolver().resolve(&api, &log, &config)).unwrap();
    assert_eq!(broken.status, FAILED);
    assert_eq!(broken.order_id, "ORD-100");
    assert_eq!(broken.transaction_id, "TRX-100");
    assert_eq!(broken.error.as_deref(), Some("Acquirer unavailable"));

    let pay_entries = log
        .entries()
        .iter()
        .filter(|entry| entry.call.endpoint.as_deref() == Some("/api/authorize-pay"))
        .count();
    assert_eq!(pay_entries, 2);
}
