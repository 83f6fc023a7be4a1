//! Resolution of a 3DS issuer challenge.
//!
//! The challenge page runs inside a sandboxed frame and never reports back
//! directly. After [`CHALLENGE_TIMEOUT`], or when the payer says they are
//! done, the transaction is retrieved and its authentication status decides
//! the outcome. Whichever trigger comes first wins; the resolver runs the
//! retrieval once.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::api_log::ApiLog;
use crate::config::MerchantConfig;
use crate::gateway::{AuthenticationStatus, GatewayApi};
use crate::outcome::PaymentOutcome;
use crate::sequencer::Challenge;

pub const CHALLENGE_TIMEOUT: Duration = Duration::from_secs(15);

/// One-shot resolver for a challenge. Clones share the guard.
#[derive(Clone, Debug)]
pub struct ChallengeResolver {
    challenge: Rc<Challenge>,
    processed: Rc<Cell<bool>>,
}

impl PartialEq for ChallengeResolver {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.processed, &other.processed)
    }
}

impl ChallengeResolver {
    pub fn new(challenge: Challenge) -> Self {
        Self {
            challenge: Rc::new(challenge),
            processed: Rc::new(Cell::new(false)),
        }
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn is_processed(&self) -> bool {
        self.processed.get()
    }

    /// Take the right to resolve. `true` exactly once.
    pub fn claim(&self) -> bool {
        !self.processed.replace(true)
    }

    /// Retrieve the transaction and settle the outcome.
    ///
    /// Returns `None` when another trigger already resolved this challenge.
    pub async fn resolve<A>(&self, api: &A, log: &ApiLog, config: &MerchantConfig) -> Option<PaymentOutcome>
    where
        A: GatewayApi + ?Sized,
    {
        if !self.claim() {
            log::debug!(target: "three_ds", "[3DS] Challenge already processed");
            return None;
        }

        let session = &self.challenge.session;
        let order_id = session.order_id.as_str();
        let transaction_id = session.transaction_id.as_str();
        log::info!(target: "three_ds", "[3DS] Retrieving authentication status for {}", transaction_id);

        let mut retrieval = match api.retrieve_transaction(config, order_id, transaction_id).await {
            Ok(retrieval) => retrieval,
            Err(mut err) => {
                log::error!(target: "three_ds", "[3DS] Error: {}", err);
                log.record_opt(err.take_api_log());
                return Some(PaymentOutcome::failed(order_id, transaction_id, err.message));
            }
        };
        log.record_opt(retrieval.api_log.take());

        match retrieval.authentication_status() {
            Some(AuthenticationStatus::Successful) => {
                log::info!(target: "three_ds", "[3DS] Authentication successful, calling PAY");
                match api.authorize_pay(config, session, None).await {
                    Ok(mut pay) => {
                        log.record_opt(pay.api_log.take());
                        let mut outcome = PaymentOutcome::from_payment(session, &pay);
                        if let Some(payment_transaction) = pay.transaction_id.filter(|id| !id.is_empty()) {
                            outcome.transaction_id = payment_transaction;
                        }
                        Some(outcome)
                    }
                    Err(mut err) => {
                        log::error!(target: "three_ds", "[3DS] Error: {}", err);
                        log.record_opt(err.take_api_log());
                        Some(PaymentOutcome::failed(order_id, transaction_id, err.message))
                    }
                }
            }
            status => {
                let status = status.map_or("Unknown", AuthenticationStatus::as_str);
                log::warn!(target: "three_ds", "[3DS] Authentication not successful: {}", status);
                let error = format!("Authentication status: {}", status);
                Some(PaymentOutcome::from_retrieval(order_id, transaction_id, &retrieval, error))
            }
        }
    }
}
