//! Modal presenting the issuer's 3DS challenge.
//!
//! The challenge markup is rendered once into a sandboxed frame that may
//! submit forms and run scripts but cannot reach this page or navigate the
//! top window. The outcome is settled by [`ChallengeResolver`], triggered by
//! the timer or by the payer's "completed" button, whichever fires first.

use gloo_timers::callback::Timeout;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::Button;
use crate::api_log::ApiLog;
use crate::challenge::{ChallengeResolver, CHALLENGE_TIMEOUT};
use crate::config::MerchantConfig;
use crate::gateway::SharedGateway;
use crate::outcome::PaymentOutcome;

pub const CHALLENGE_SANDBOX: &str = "allow-forms allow-scripts";

#[derive(Properties, PartialEq)]
pub struct ChallengeModalProps {
    pub resolver: ChallengeResolver,
    pub config: MerchantConfig,
    /// Emitted once with the settled outcome.
    pub on_outcome: Callback<PaymentOutcome>,
}

#[function_component(ChallengeModal)]
pub fn challenge_modal(props: &ChallengeModalProps) -> Html {
    let api_log = use_context::<ApiLog>();
    let gateway = use_context::<SharedGateway>();

    let settle = {
        let resolver = props.resolver.clone();
        let config = props.config.clone();
        let on_outcome = props.on_outcome.clone();
        Callback::from(move |trigger: &'static str| {
            let (Some(api_log), Some(gateway)) = (api_log.clone(), gateway.clone()) else {
                log::error!(target: "three_ds", "[3DS] No backend in context, cannot resolve challenge");
                return;
            };
            if resolver.is_processed() {
                return;
            }
            log::info!(target: "three_ds", "[3DS] {} - checking authentication status", trigger);
            let resolver = resolver.clone();
            let config = config.clone();
            let on_outcome = on_outcome.clone();
            spawn_local(async move {
                if let Some(outcome) = resolver.resolve(gateway.api(), &api_log, &config).await {
                    on_outcome.emit(outcome);
                }
            });
        })
    };

    {
        let settle = settle.clone();
        use_effect_with(props.resolver.clone(), move |_| {
            let millis = u32::try_from(CHALLENGE_TIMEOUT.as_millis()).unwrap_or(u32::MAX);
            let timeout = Timeout::new(millis, move || settle.emit("Challenge timeout"));
            move || drop(timeout)
        });
    }

    let on_completed = Callback::from(move |_: MouseEvent| settle.emit("Payer completed verification"));

    html! {
        <div class="mpgs-modal-backdrop">
            <div class="mpgs-modal" role="dialog" aria-modal="true">
                <h3>{ "3D Secure Authentication" }</h3>
                <p class="mpgs-muted">{ "Please complete the verification requested by your bank." }</p>
                <iframe
                    title="3DS Challenge"
                    class="mpgs-challenge-frame"
                    srcdoc={props.resolver.challenge().html.clone()}
                    sandbox={CHALLENGE_SANDBOX}
                />
                <Button label="I have completed verification" onclick={on_completed} />
            </div>
        </div>
    }
}
