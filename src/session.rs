//! Payment session creation.
//!
//! A payment form creates exactly one gateway session per mount. Re-renders
//! and duplicate effects can ask again; [`SessionGuard`] turns every request
//! after the first into a logged no-op.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::api_log::ApiLog;
use crate::config::MerchantConfig;
use crate::error::CheckoutError;
use crate::gateway::GatewayApi;

/// Opaque identifiers returned by the gateway, threaded through every step.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub session_id: String,
    pub order_id: String,
    pub transaction_id: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    NotStarted,
    InFlight,
    Done,
}

/// One-shot guard around session creation. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct SessionGuard {
    state: Rc<Cell<SessionState>>,
}

impl PartialEq for SessionGuard {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Move NotStarted → InFlight. Returns `false` if creation already began.
    pub fn try_begin(&self) -> bool {
        if self.state.get() != SessionState::NotStarted {
            return false;
        }
        self.state.set(SessionState::InFlight);
        true
    }

    pub fn finish(&self) {
        self.state.set(SessionState::Done);
    }
}

/// Create the gateway session for `amount`, at most once per guard.
///
/// Returns `Ok(None)` when the guard has already been used. Failures are not
/// retried; the guard stays closed.
pub async fn create_session<A>(
    api: &A,
    log: &ApiLog,
    guard: &SessionGuard,
    config: &MerchantConfig,
    amount: &str,
) -> Result<Option<PaymentSession>, CheckoutError>
where
    A: GatewayApi + ?Sized,
{
    if !guard.try_begin() {
        log::info!("Session already created, skipping...");
        return Ok(None);
    }

    let result = api.create_session(config, amount, &config.currency).await;
    guard.finish();

    match result {
        Ok(mut response) => {
            log.record_opt(response.api_log.take());
            let session = PaymentSession {
                session_id: response.session_id,
                order_id: response.order_id,
                transaction_id: response.transaction_id,
            };
            log::info!("Session created: {}", session.session_id);
            Ok(Some(session))
        }
        Err(mut err) => {
            log::error!("Failed to create session: {}", err);
            log.record_opt(err.take_api_log());
            Err(err.into())
        }
    }
}
