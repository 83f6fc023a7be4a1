//! Merchant configuration screen.

use std::time::Duration;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::app::Route;
use crate::components::{Banner, BannerKind, Button, TextInput};
use crate::config::{ConfigStore, MerchantConfig};
use crate::gateway::SharedGateway;
use crate::retry::browser_sleep;

const SAVED_BANNER: Duration = Duration::from_secs(3);

#[derive(Properties, PartialEq)]
pub struct ConfigPageProps {
    pub store: ConfigStore,
    pub on_navigate: Callback<Route>,
}

fn load_saved(store: &ConfigStore) -> Option<MerchantConfig> {
    store.load().unwrap_or_else(|err| {
        log::error!("could not read merchant configuration: {}", err);
        None
    })
}

#[function_component(ConfigPage)]
pub fn config_page(props: &ConfigPageProps) -> Html {
    let gateway = use_context::<SharedGateway>();
    let saved = use_state(|| load_saved(&props.store));
    let config = use_state(|| (*saved).clone().unwrap_or_default());
    let show_password = use_state(|| false);
    let show_saved = use_state(|| false);
    let notice = use_state(|| None::<(BannerKind, String)>);

    let field = |update: fn(&mut MerchantConfig, String)| {
        let config = config.clone();
        Callback::from(move |value: String| {
            let mut next = (*config).clone();
            update(&mut next, value);
            config.set(next);
        })
    };

    let on_save = {
        let store = props.store.clone();
        let config = config.clone();
        let saved = saved.clone();
        let show_saved = show_saved.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| match store.save(&config) {
            Ok(()) => {
                saved.set(Some((*config).clone()));
                notice.set(None);
                show_saved.set(true);
                let show_saved = show_saved.clone();
                spawn_local(async move {
                    browser_sleep(SAVED_BANNER).await;
                    show_saved.set(false);
                });
            }
            Err(err) => {
                log::error!("Please fill in all required fields: {}", err);
                notice.set(Some((BannerKind::Error, err.to_string())));
            }
        })
    };

    let on_test = {
        let saved = saved.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            if saved.is_none() {
                notice.set(Some((BannerKind::Info, "Please save configuration first".into())));
                return;
            }
            let Some(gateway) = gateway.clone() else {
                return;
            };
            let notice = notice.clone();
            spawn_local(async move {
                let shown = match gateway.api().health().await {
                    Ok(health) => (
                        BannerKind::Success,
                        format!("Backend connection successful! Status: {}", health.status),
                    ),
                    Err(err) => (BannerKind::Error, format!("Backend connection failed: {}", err)),
                };
                log::info!("{}", shown.1);
                notice.set(Some(shown));
            });
        })
    };

    let on_defaults = {
        let config = config.clone();
        Callback::from(move |_: MouseEvent| config.set(MerchantConfig::test_credentials()))
    };

    let on_clear = {
        let store = props.store.clone();
        let config = config.clone();
        let saved = saved.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            let confirmed = web_sys::window()
                .and_then(|win| {
                    win.confirm_with_message("Are you sure you want to clear the configuration?")
                        .ok()
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            if let Err(err) = store.clear() {
                notice.set(Some((BannerKind::Error, err.to_string())));
                return;
            }
            config.set(MerchantConfig::default());
            saved.set(None);
        })
    };

    let on_continue = {
        let saved = saved.clone();
        let notice = notice.clone();
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| {
            if saved.is_some() {
                on_navigate.emit(Route::Checkout);
            } else {
                notice.set(Some((
                    BannerKind::Info,
                    "Please save configuration before continuing".into(),
                )));
            }
        })
    };

    let toggle_password = {
        let show_password = show_password.clone();
        Callback::from(move |_: MouseEvent| show_password.set(!*show_password))
    };

    html! {
        <div class="mpgs-card">
            <h1>{ "Merchant Configuration" }</h1>
            <p class="mpgs-muted">{ "Configure your Mastercard Payment Gateway credentials" }</p>

            if *show_saved {
                <Banner kind={BannerKind::Success} message="Configuration saved successfully!" />
            }
            if let Some((kind, message)) = &*notice {
                <Banner kind={*kind} message={message.clone()} />
            }

            <TextInput label="Merchant ID *" value={config.merchant_id.clone()}
                placeholder="TESTMERCHANT01" oninput={field(|c, v| c.merchant_id = v)} />
            <TextInput label="API Username *" value={config.username.clone()}
                placeholder="merchant.TESTMERCHANT01" oninput={field(|c, v| c.username = v)} />
            <div class="mpgs-password-row">
                <TextInput label="API Password *" value={config.password.clone()}
                    input_type={if *show_password { "text" } else { "password" }}
                    oninput={field(|c, v| c.password = v)} />
                <Button label={if *show_password { "Hide" } else { "Show" }} onclick={toggle_password}
                    class={classes!("mpgs-button-link")} />
            </div>
            <TextInput label="Gateway URL" value={config.gateway_url.clone()} input_type="url"
                hint="Test: https://mtf.gateway.mastercard.com"
                oninput={field(|c, v| c.gateway_url = v)} />
            <TextInput label="API Version" value={config.api_version.clone()}
                oninput={field(|c, v| c.api_version = v)} />
            <TextInput label="Currency" value={config.currency.clone()}
                oninput={field(|c, v| c.currency = v)} />
            <TextInput label="Merchant Name" value={config.merchant_name.clone()}
                oninput={field(|c, v| c.merchant_name = v)} />
            <TextInput label="Merchant URL" value={config.merchant_url.clone()} input_type="url"
                oninput={field(|c, v| c.merchant_url = v)} />

            <div class="mpgs-actions">
                <Button label="Save Configuration" onclick={on_save} />
                <Button label="Load Test Credentials" onclick={on_defaults} class={classes!("mpgs-button-secondary")} />
                <Button label="Test Connection" onclick={on_test} disabled={saved.is_none()}
                    class={classes!("mpgs-button-secondary")} />
                <Button label="Clear" onclick={on_clear} class={classes!("mpgs-button-danger")} />
            </div>

            if let Some(current) = &*saved {
                <div class="mpgs-saved-config">
                    <h3>{ "Saved Configuration" }</h3>
                    <p>{ format!("Merchant: {} ({})", current.merchant_name, current.merchant_id) }</p>
                    <p>{ format!("Gateway: {} · API v{} · {}", current.gateway_url, current.api_version, current.currency) }</p>
                </div>
            }

            <Button label="Continue to Checkout →" onclick={on_continue} disabled={saved.is_none()} />
        </div>
    }
}
