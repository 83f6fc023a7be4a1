//! Root component: screen routing and the handles shared through context.

use yew::prelude::*;

use crate::api_log::ApiLog;
use crate::config::{ClientSettings, ConfigStore};
use crate::gateway::{HttpGateway, SharedGateway};
use crate::outcome::PaymentOutcome;
use crate::pages::{CartPage, ConfigPage, PaymentPage, ReceiptPage};

/// The four screens of the checkout.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Route {
    #[default]
    Config,
    Checkout,
    /// Payment for `amount`, formatted as the backend expects (`"1800.00"`).
    Payment { amount: String },
    Receipt(PaymentOutcome),
}

#[derive(Properties, PartialEq, Default)]
pub struct AppProps {
    #[prop_or_default]
    pub settings: ClientSettings,
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    let api_log = use_memo((), |_| ApiLog::session());
    let gateway = use_memo(props.settings.clone(), |settings| {
        SharedGateway::new(HttpGateway::from_settings(settings))
    });
    let store = use_memo((), |_| ConfigStore::browser());
    let route = use_state(Route::default);

    let navigate = {
        let route = route.clone();
        Callback::from(move |next: Route| {
            log::debug!("navigate to {:?}", next);
            route.set(next);
        })
    };

    let store = (*store).clone();
    let screen = match &*route {
        Route::Config => html! { <ConfigPage {store} on_navigate={navigate} /> },
        Route::Checkout => html! { <CartPage {store} on_navigate={navigate} /> },
        Route::Payment { amount } => html! {
            <PaymentPage {store} amount={amount.clone()} on_navigate={navigate} />
        },
        Route::Receipt(outcome) => html! {
            <ReceiptPage outcome={outcome.clone()} on_navigate={navigate} />
        },
    };

    html! {
        <ContextProvider<ApiLog> context={(*api_log).clone()}>
            <ContextProvider<SharedGateway> context={(*gateway).clone()}>
                <main class="mpgs-app">{ screen }</main>
            </ContextProvider<SharedGateway>>
        </ContextProvider<ApiLog>>
    }
}
