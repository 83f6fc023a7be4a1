//! Receipt screen for a settled checkout attempt.

use yew::prelude::*;

use crate::app::Route;
use crate::components::{ApiLogViewer, Banner, BannerKind, Button};
use crate::outcome::PaymentOutcome;

#[derive(Properties, PartialEq)]
pub struct ReceiptPageProps {
    pub outcome: PaymentOutcome,
    pub on_navigate: Callback<Route>,
}

#[function_component(ReceiptPage)]
pub fn receipt_page(props: &ReceiptPageProps) -> Html {
    let show_response = use_state(|| false);
    let outcome = &props.outcome;
    let success = outcome.is_success();

    let go = |route: Route| {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(route.clone()))
    };
    let toggle_response = {
        let show_response = show_response.clone();
        Callback::from(move |_: MouseEvent| show_response.set(!*show_response))
    };

    html! {
        <div class="mpgs-card mpgs-receipt">
            <header class={classes!("mpgs-receipt-header", if success { "mpgs-ok" } else { "mpgs-err" })}>
                <div class="mpgs-status-icon">{ if success { "✓" } else { "✗" } }</div>
                <h1>{ if success { "Payment Successful!" } else { "Payment Failed" } }</h1>
                <p class="mpgs-muted">
                    { if success { "Your transaction has been completed" } else { "There was an issue processing your payment" } }
                </p>
            </header>

            if let Some(error) = &outcome.error {
                <Banner kind={BannerKind::Error} message="Error Details">
                    <div class="mpgs-error-message">{ error }</div>
                </Banner>
            }

            <table class="mpgs-details">
                { for outcome.detail_rows().into_iter().map(|(label, value)| html! {
                    <tr>
                        <th>{ label }</th>
                        <td>{ value }</td>
                    </tr>
                }) }
            </table>

            <ApiLogViewer manage={true} />

            if let Some(full) = &outcome.full_response {
                <section class="mpgs-full-response">
                    <Button label={if *show_response { "Hide Full Response" } else { "Show Full Response" }}
                        onclick={toggle_response} class={classes!("mpgs-button-link")} />
                    if *show_response {
                        <pre>{ serde_json::to_string_pretty(full).unwrap_or_default() }</pre>
                    }
                </section>
            }

            <div class="mpgs-actions">
                <Button label="New Transaction" onclick={go(Route::Checkout)} />
                <Button label="View Configuration" onclick={go(Route::Config)} class={classes!("mpgs-button-secondary")} />
            </div>

            <p class="mpgs-muted mpgs-footer">
                { if success { "Thank you for your purchase!" } else { "Please try again or contact support if the issue persists" } }
            </p>
        </div>
    }
}
