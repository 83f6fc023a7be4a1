//! Payment screen: hosted card fields plus the 3DS sequence.
//!
//! On mount the screen loads the merchant's hosted-session script, creates
//! one gateway session, waits for the widget and the placeholders, then
//! binds the hosted fields. "Pay" asks the widget to store the card in the
//! session; a successful `formSessionUpdate` runs the 3DS sequence, which
//! ends on the receipt screen, in a challenge, or in an error shown inline.

use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api_log::ApiLog;
use crate::app::Route;
use crate::challenge::ChallengeResolver;
use crate::client::{self, CardFieldSelectors, HostedFieldsEvents, HostedResponse, CARD_PAYMENT};
use crate::components::{ApiLogViewer, Banner, BannerKind, Button, ChallengeModal};
use crate::config::{ConfigStore, MerchantConfig};
use crate::error::CheckoutError;
use crate::gateway::{BrowserDetails, SharedGateway};
use crate::interop::{authentication_callback_url, load_hosted_script, wait_for_elements, wait_for_hosted_widget};
use crate::outcome::PaymentOutcome;
use crate::retry::browser_sleep;
use crate::sequencer::{SequenceOutcome, ThreeDsSequencer};
use crate::session::{create_session, PaymentSession, SessionGuard};

const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Properties, PartialEq)]
pub struct PaymentPageProps {
    pub store: ConfigStore,
    /// Decimal amount, e.g. `"1800.00"`.
    pub amount: String,
    pub on_navigate: Callback<Route>,
}

/// State handles the async flow writes into.
#[derive(Clone)]
struct Flow {
    gateway: SharedGateway,
    api_log: ApiLog,
    config: MerchantConfig,
    amount: String,
    session: UseStateHandle<Option<PaymentSession>>,
    ready: UseStateHandle<bool>,
    processing: UseStateHandle<bool>,
    status: UseStateHandle<Option<String>>,
    error: UseStateHandle<Option<String>>,
    challenge: UseStateHandle<Option<ChallengeResolver>>,
    on_navigate: Callback<Route>,
}

impl Flow {
    fn fail(&self, err: &CheckoutError) {
        log::error!("{}", err);
        self.error.set(Some(err.to_string()));
        self.status.set(None);
        self.processing.set(false);
    }

    async fn bootstrap(&self, guard: &SessionGuard) -> Result<(), CheckoutError> {
        let script_failed = {
            let flow = self.clone();
            Callback::from(move |url: String| flow.fail(&CheckoutError::ScriptLoad(url)))
        };
        load_hosted_script(&self.config, script_failed)?;

        let Some(session) =
            create_session(self.gateway.api(), &self.api_log, guard, &self.config, &self.amount).await?
        else {
            return Ok(());
        };
        self.session.set(Some(session.clone()));
        let session_id = session.session_id.clone();

        wait_for_hosted_widget().await?;
        let selectors = CardFieldSelectors::default();
        wait_for_elements(&selectors.all()).await?;

        let events = HostedFieldsEvents {
            initialized: Callback::from(|_: HostedResponse| log::info!("PaymentSession initialized")),
            form_session_update: {
                let flow = self.clone();
                Callback::from(move |response: HostedResponse| flow.on_form_session_update(response, &session))
            },
        };
        client::configure_hosted_fields(&session_id, &selectors, events)?;
        self.ready.set(true);
        Ok(())
    }

    fn on_form_session_update(&self, response: HostedResponse, session: &PaymentSession) {
        if let Err(err) = response.into_result() {
            self.fail(&err);
            return;
        }
        log::info!("Card details captured, starting 3DS");
        let flow = self.clone();
        let session = session.clone();
        spawn_local(async move { flow.run_three_ds(session).await });
    }

    async fn run_three_ds(&self, session: PaymentSession) {
        let sequencer = ThreeDsSequencer::new(
            self.gateway.api(),
            &self.api_log,
            &self.config,
            &self.amount,
            authentication_callback_url(),
        )
        .with_browser(BrowserDetails::collect());

        let status = self.status.clone();
        let result = sequencer
            .run(&session, |step| status.set(Some(step.status_text().to_string())))
            .await;

        match result {
            Ok(SequenceOutcome::Paid(outcome)) => self.finish(outcome).await,
            Ok(SequenceOutcome::ChallengeRequired(challenge)) => {
                self.status.set(Some("Waiting for 3DS authentication...".to_string()));
                self.challenge.set(Some(ChallengeResolver::new(challenge)));
            }
            Err(err) => self.fail(&err),
        }
    }

    async fn finish(&self, outcome: PaymentOutcome) {
        self.status.set(Some("Payment successful! Redirecting...".to_string()));
        browser_sleep(REDIRECT_DELAY).await;
        self.on_navigate.emit(Route::Receipt(outcome));
    }
}

#[function_component(PaymentPage)]
pub fn payment_page(props: &PaymentPageProps) -> Html {
    let api_log = use_context::<ApiLog>();
    let gateway = use_context::<SharedGateway>();
    let config = use_memo(props.store.clone(), |store| {
        store.require().and_then(|config| config.validate().map(|_| config))
    });
    let config = (*config).clone();
    let guard = use_memo((), |_| SessionGuard::new());
    let session = use_state(|| None::<PaymentSession>);
    let ready = use_state(|| false);
    let processing = use_state(|| false);
    let status = use_state(|| None::<String>);
    let error = use_state(|| None::<String>);
    let challenge = use_state(|| None::<ChallengeResolver>);
    // Every recorded call is followed by a state change on this page.
    let log_revision = api_log.as_ref().map(ApiLog::revision).unwrap_or_default();

    let flow = match (config.as_ref(), api_log, gateway) {
        (Ok(config), Some(api_log), Some(gateway)) => Some(Flow {
            gateway,
            api_log,
            config: config.clone(),
            amount: props.amount.clone(),
            session: session.clone(),
            ready: ready.clone(),
            processing: processing.clone(),
            status: status.clone(),
            error: error.clone(),
            challenge: challenge.clone(),
            on_navigate: props.on_navigate.clone(),
        }),
        _ => None,
    };

    {
        let flow = flow.clone();
        let guard = Rc::clone(&guard);
        use_effect_with((), move |_| {
            if let Some(flow) = flow {
                spawn_local(async move {
                    if let Err(err) = flow.bootstrap(&guard).await {
                        flow.fail(&err);
                    }
                });
            }
            || ()
        });
    }

    let on_navigate = props.on_navigate.clone();
    if let Err(err) = config.as_ref() {
        let to_config = Callback::from(move |_: MouseEvent| on_navigate.emit(Route::Config));
        return html! {
            <div class="mpgs-card">
                <h1>{ "Configuration Error" }</h1>
                <Banner kind={BannerKind::Error} message={err.to_string()} />
                <Button label="Go to Configuration" onclick={to_config} />
            </div>
        };
    }

    let on_pay = {
        let ready = ready.clone();
        let processing = processing.clone();
        let error = error.clone();
        let status = status.clone();
        Callback::from(move |_: MouseEvent| {
            if !*ready || *processing {
                return;
            }
            processing.set(true);
            error.set(None);
            status.set(None);
            if let Err(err) = client::update_session_from_form(CARD_PAYMENT) {
                log::error!("{}", err);
                error.set(Some(err.to_string()));
                processing.set(false);
            }
        })
    };

    let on_outcome = {
        let on_navigate = props.on_navigate.clone();
        let challenge = challenge.clone();
        Callback::from(move |outcome: PaymentOutcome| {
            challenge.set(None);
            on_navigate.emit(Route::Receipt(outcome));
        })
    };

    let currency = config.as_ref().map(|c| c.currency.clone()).unwrap_or_default();
    let selectors = CardFieldSelectors::default();
    let placeholder = |selector: &str, label: &'static str| {
        let id = CardFieldSelectors::id_of(selector).to_string();
        html! {
            <label class="mpgs-field">
                <span class="mpgs-field-label">{ label }</span>
                <input id={id} class="mpgs-hosted-input" type="text" readonly={true} placeholder={label} />
            </label>
        }
    };
    let pay_label = if *processing {
        "Processing...".to_string()
    } else {
        format!("Pay {} {}", currency, props.amount)
    };

    html! {
        <div class="mpgs-card">
            <h1>{ "Secure Payment" }</h1>
            <p class="mpgs-total">{ format!("Amount: {} {}", currency, props.amount) }</p>

            if let Some(session) = &*session {
                <div class="mpgs-session-details">
                    <h3>{ "Session Details" }</h3>
                    <p>{ format!("Session ID: {}", session.session_id) }</p>
                    <p>{ format!("Order ID: {}", session.order_id) }</p>
                    <p>{ format!("Transaction ID: {}", session.transaction_id) }</p>
                </div>
            } else {
                <p class="mpgs-muted">{ "Creating payment session..." }</p>
            }

            <form id="payment-form" class="mpgs-hosted-form" onsubmit={Callback::from(|e: SubmitEvent| e.prevent_default())}>
                { placeholder(&selectors.number, "Card Number") }
                <div class="mpgs-row">
                    { placeholder(&selectors.expiry_month, "Expiry Month") }
                    { placeholder(&selectors.expiry_year, "Expiry Year") }
                    { placeholder(&selectors.security_code, "Security Code") }
                </div>
                { placeholder(&selectors.name_on_card, "Cardholder Name") }
            </form>

            if let Some(text) = &*status {
                <Banner kind={BannerKind::Info} message={text.clone()} />
            }
            if let Some(text) = &*error {
                <Banner kind={BannerKind::Error} message={text.clone()} />
            }

            <Button label={pay_label} onclick={on_pay} disabled={!*ready || *processing} />

            <ApiLogViewer revision={log_revision} />

            if let (Some(resolver), Ok(config)) = (&*challenge, config.as_ref()) {
                <ChallengeModal resolver={resolver.clone()} config={config.clone()} {on_outcome} />
            }
        </div>
    }
}
