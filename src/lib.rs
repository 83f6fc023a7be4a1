//! Hosted-session card checkout with 3-D Secure, as a Yew application.
//!
//! The orchestration modules (`cart`, `session`, `sequencer`, `challenge`,
//! `api_log`, `config`) are plain Rust over the [`gateway::GatewayApi`] seam;
//! `bindings`, `interop` and `client` wrap the gateway's browser script;
//! `components`, `pages` and `app` are the UI.

mod bindings;
mod interop;
mod client;
mod components;
mod pages;

pub mod api_log;
pub mod app;
pub mod cart;
pub mod challenge;
pub mod config;
pub mod error;
pub mod gateway;
pub mod outcome;
pub mod retry;
pub mod sequencer;
pub mod session;
pub mod storage;

pub use app::{App, Route};
pub use client::*;
pub use components::*;
pub use error::{CheckoutError, GatewayError};
pub use interop::*;
pub use pages::*;

use wasm_bindgen::prelude::*;

/// Browser entry point: console logging plus the mounted [`App`].
#[wasm_bindgen(start)]
pub fn start() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
    log::info!("yew_mpgs starting");
    yew::Renderer::<App>::new().render();
}
