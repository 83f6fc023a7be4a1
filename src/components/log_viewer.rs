//! Collapsible inspector over the [`ApiLog`] provided in context.

use wasm_bindgen::JsCast;
use web_sys::js_sys::encode_uri_component;
use web_sys::HtmlAnchorElement;
use yew::prelude::*;

use super::Button;
use crate::api_log::{ApiLog, ApiLogEntry, SectionKind};

#[derive(Properties, PartialEq)]
pub struct ApiLogViewerProps {
    #[prop_or(AttrValue::Static("API Request/Response Logs"))]
    pub title: AttrValue,
    /// Only show calls made for this order.
    #[prop_or_default]
    pub order_id: Option<String>,
    /// Offer export and clear actions.
    #[prop_or_default]
    pub manage: bool,
    /// The ledger's [`ApiLog::revision`] as the parent last saw it. Pass it
    /// wherever calls are recorded while the viewer stays mounted.
    #[prop_or_default]
    pub revision: u64,
}

#[function_component(ApiLogViewer)]
pub fn api_log_viewer(props: &ApiLogViewerProps) -> Html {
    let api_log = use_context::<ApiLog>();
    let expanded = use_state(|| false);
    let selected = use_state(|| None::<String>);
    // Bumped after `clear()` so the panel re-reads the ledger.
    let revision = use_state(|| 0u32);
    let Some(api_log) = api_log else {
        return Html::default();
    };

    let entries = match &props.order_id {
        Some(order_id) => api_log.by_order_id(order_id),
        None => api_log.entries(),
    };
    if entries.is_empty() {
        return Html::default();
    }
    let stats = api_log.stats();

    let toggle = {
        let expanded = expanded.clone();
        Callback::from(move |_: MouseEvent| expanded.set(!*expanded))
    };

    let on_export = {
        let api_log = api_log.clone();
        Callback::from(move |_: MouseEvent| download_export(&api_log))
    };

    let on_clear = {
        let api_log = api_log.clone();
        let revision = revision.clone();
        let selected = selected.clone();
        Callback::from(move |_: MouseEvent| {
            api_log.clear();
            selected.set(None);
            revision.set(revision.wrapping_add(1));
        })
    };

    let details = selected
        .as_ref()
        .and_then(|id| entries.iter().find(|entry| &entry.id == id))
        .map(|entry| {
            let close = {
                let selected = selected.clone();
                Callback::from(move |_: MouseEvent| selected.set(None))
            };
            render_details(entry, close)
        })
        .unwrap_or_default();

    html! {
        <section class="mpgs-log-viewer">
            <header class="mpgs-log-header" onclick={toggle}>
                <h3>{ props.title.clone() }{ format!(" ({})", entries.len()) }</h3>
                <span>{ if *expanded { "▲" } else { "▼" } }</span>
            </header>
            if *expanded {
                <div class="mpgs-log-stats">
                    <span>{ format!("Total: {}", stats.total) }</span>
                    <span class="mpgs-ok">{ format!("Successful: {}", stats.successful) }</span>
                    <span class="mpgs-err">{ format!("Failed: {}", stats.failed) }</span>
                    { for stats.endpoints.iter().map(|(endpoint, count)| html! {
                        <span class="mpgs-log-endpoint-count">{ format!("{}: {}", endpoint, count) }</span>
                    }) }
                </div>
                if props.manage {
                    <div class="mpgs-log-actions">
                        <Button label="Export Logs" onclick={on_export} class={classes!("mpgs-button-secondary")} />
                        <Button label="Clear Logs" onclick={on_clear} class={classes!("mpgs-button-danger")} />
                    </div>
                }
                <ul class="mpgs-log-list">
                    { for entries.iter().rev().map(|entry| render_entry(entry, selected.clone())) }
                </ul>
                { details }
            }
        </section>
    }
}

fn render_entry(entry: &ApiLogEntry, selected: UseStateHandle<Option<String>>) -> Html {
    let failed = entry.call.is_error();
    let id = entry.id.clone();
    let view = Callback::from(move |_: MouseEvent| selected.set(Some(id.clone())));
    html! {
        <li key={entry.id.clone()} class={classes!("mpgs-log-entry", failed.then_some("mpgs-log-entry-error"))}>
            <span class="mpgs-badge">{ entry.call.method.as_deref().unwrap_or("N/A") }</span>
            <span class="mpgs-log-endpoint">{ entry.call.endpoint.as_deref().unwrap_or("unknown") }</span>
            if failed {
                <span class="mpgs-badge mpgs-badge-error">{ "ERROR" }</span>
            }
            <span class="mpgs-muted">{ entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string() }</span>
            <span class="mpgs-muted">{ entry.duration_label() }</span>
            <Button label="View Details" onclick={view} class={classes!("mpgs-button-link")} />
        </li>
    }
}

fn render_details(entry: &ApiLogEntry, close: Callback<MouseEvent>) -> Html {
    html! {
        <div class="mpgs-log-details">
            <h4>{ "API Call Details" }</h4>
            <p class="mpgs-muted">
                { entry.call.endpoint.as_deref().unwrap_or("unknown") }{ " " }{ entry.duration_label() }
            </p>
            { for entry.sections().into_iter().map(|section| {
                let class = match section.kind {
                    SectionKind::Request => "mpgs-section-request",
                    SectionKind::Response => "mpgs-section-response",
                    SectionKind::Error => "mpgs-section-error",
                    SectionKind::Other => "mpgs-section-other",
                };
                html! {
                    <div class={classes!("mpgs-log-section", class)}>
                        <h5>{ section.title }</h5>
                        <pre>{ serde_json::to_string_pretty(section.data).unwrap_or_default() }</pre>
                    </div>
                }
            }) }
            <Button label="Close" onclick={close} class={classes!("mpgs-button-secondary")} />
        </div>
    }
}

/// Offer the ledger as a JSON download through a throwaway anchor.
fn download_export(api_log: &ApiLog) {
    let Some(document) = web_sys::window().and_then(|win| win.document()) else {
        return;
    };
    let href = format!(
        "data:application/json;charset=utf-8,{}",
        String::from(encode_uri_component(&api_log.export_json()))
    );
    let anchor = document
        .create_element("a")
        .ok()
        .and_then(|el| el.dyn_into::<HtmlAnchorElement>().ok());
    match anchor {
        Some(anchor) => {
            anchor.set_href(&href);
            anchor.set_download(&api_log.export_file_name());
            anchor.click();
        }
        None => log::error!("could not create download link for API logs"),
    }
}
