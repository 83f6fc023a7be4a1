//! Checkout cart screen.

use yew::prelude::*;

use crate::app::Route;
use crate::cart::{format_minor, Cart, CartError};
use crate::components::{Banner, BannerKind, Button};
use crate::config::ConfigStore;

#[derive(Properties, PartialEq)]
pub struct CartPageProps {
    pub store: ConfigStore,
    pub on_navigate: Callback<Route>,
}

#[function_component(CartPage)]
pub fn cart_page(props: &CartPageProps) -> Html {
    let cart = use_state(Cart::default);
    let notice = use_state(|| None::<String>);
    let currency = use_memo(props.store.clone(), |store| {
        store.load().ok().flatten().map(|config| config.currency)
    });

    // Nothing to pay with until the merchant is configured.
    {
        let on_navigate = props.on_navigate.clone();
        let configured = currency.is_some();
        use_effect_with(configured, move |configured| {
            if !*configured {
                log::info!("no merchant configuration, redirecting to config");
                on_navigate.emit(Route::Config);
            }
            || ()
        });
    }
    let currency = (*currency).clone().unwrap_or_default();

    let update = |id: u32, change: fn(&mut Cart, u32) -> Result<(), CartError>| {
        let cart = cart.clone();
        Callback::from(move |_: MouseEvent| {
            let mut next = (*cart).clone();
            match change(&mut next, id) {
                Ok(()) => cart.set(next),
                Err(err) => log::debug!("cart unchanged: {}", err),
            }
        })
    };

    let on_proceed = {
        let cart = cart.clone();
        let notice = notice.clone();
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| match cart.checkout_amount() {
            Ok(amount) => on_navigate.emit(Route::Payment { amount }),
            Err(err) => {
                log::info!("{}", err);
                notice.set(Some(err.to_string()));
            }
        })
    };

    let on_config = {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(Route::Config))
    };

    let total = format_minor(cart.total());

    html! {
        <div class="mpgs-card">
            <h1>{ "Checkout" }</h1>
            if let Some(message) = &*notice {
                <Banner kind={BannerKind::Error} message={message.clone()} />
            }
            if cart.is_empty() {
                <p class="mpgs-muted">{ "Your cart is empty." }</p>
            }
            <ul class="mpgs-cart">
                { for cart.items().iter().map(|item| html! {
                    <li key={item.id} class="mpgs-cart-item">
                        <span class="mpgs-cart-icon">{ item.icon.clone() }</span>
                        <span class="mpgs-cart-name">{ item.name.clone() }</span>
                        <span class="mpgs-muted">{ format!("{} {}", currency, format_minor(item.unit_price)) }</span>
                        <div class="mpgs-qty">
                            <Button label="−" onclick={update(item.id, |c, id| c.adjust(id, -1))}
                                disabled={item.quantity <= 1} class={classes!("mpgs-button-small")} />
                            <span>{ item.quantity }</span>
                            <Button label="+" onclick={update(item.id, |c, id| c.adjust(id, 1))}
                                class={classes!("mpgs-button-small")} />
                        </div>
                        <span class="mpgs-cart-line">{ format!("{} {}", currency, format_minor(item.line_total())) }</span>
                        <Button label="Remove" onclick={update(item.id, |c, id| { c.remove(id); Ok(()) })}
                            class={classes!("mpgs-button-link")} />
                    </li>
                }) }
            </ul>
            <div class="mpgs-summary">
                <p>{ format!("Subtotal: {} {}", currency, total) }</p>
                <p>{ format!("Tax: {} 0.00", currency) }</p>
                <p class="mpgs-total">{ format!("Total: {} {}", currency, total) }</p>
            </div>
            <div class="mpgs-actions">
                <Button label="Proceed to Payment" onclick={on_proceed} />
                <Button label="Back to Configuration" onclick={on_config} class={classes!("mpgs-button-secondary")} />
            </div>
        </div>
    }
}
