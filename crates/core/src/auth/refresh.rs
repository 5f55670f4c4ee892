//! Single-flight API key refresh
//!
//! When the upstream answers 401, every affected caller funnels through
//! [`TokenRefreshCoordinator::ensure_fresh_auth`]. The first caller starts a
//! refresh on a detached tokio task and parks a shared handle to it; callers
//! arriving while it runs await the same handle. The task clears the handle
//! when it finishes, panics included, so the next 401 starts a new cycle.
//!
//! The refresh runs detached so a caller that is cancelled while waiting
//! cannot cancel the refresh other callers depend on.
//!
//! State machine: `Idle -> Refreshing -> Idle`, whatever the outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use console_domain::AuthError;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::store::AuthContextStore;
use crate::ports::CredentialRefresher;

type RefreshOutcome = Result<String, AuthError>;

struct InFlight {
    id: u64,
    epoch: u64,
    outcome: Shared<BoxFuture<'static, RefreshOutcome>>,
    abort: AbortHandle,
}

/// Empties the slot on drop if it still holds refresh `id`.
struct SlotRelease {
    slot: Arc<Mutex<Option<InFlight>>>,
    id: u64,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|flight| flight.id == self.id) {
            *slot = None;
        }
    }
}

/// Coordinates API key refreshes across concurrent callers
pub struct TokenRefreshCoordinator {
    store: Arc<AuthContextStore>,
    refresher: Arc<dyn CredentialRefresher>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    next_id: AtomicU64,
    refreshes: Arc<AtomicU64>,
}

impl TokenRefreshCoordinator {
    pub fn new(store: Arc<AuthContextStore>, refresher: Arc<dyn CredentialRefresher>) -> Self {
        Self {
            store,
            refresher,
            in_flight: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
            refreshes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Obtain a usable API key after `failed_api_key` was rejected with 401.
    ///
    /// Joins a refresh already in flight for the current session. If none is
    /// running and the store already holds a different key, another caller
    /// refreshed in the meantime and that key is returned as-is.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// `MISSING_API_KEY` if there is no session, `EXPIRED_TOKEN` if the
    /// credential provider fails or returns an unusable key.
    pub async fn ensure_fresh_auth(&self, failed_api_key: &str) -> Result<String, AuthError> {
        let (outcome, stale) = {
            let mut slot = self.in_flight.lock();
            let (context, epoch) = self.store.snapshot();
            let context = context.ok_or_else(AuthError::missing_api_key)?;

            match slot.as_ref() {
                Some(flight) if flight.epoch == epoch => {
                    debug!(refresh_id = flight.id, "joining in-flight api key refresh");
                    (flight.outcome.clone(), None)
                }
                _ => {
                    if context.api_key != failed_api_key {
                        debug!("api key already rotated, skipping refresh");
                        return Ok(context.api_key);
                    }

                    let flight = self.spawn_refresh(epoch);
                    let outcome = flight.outcome.clone();
                    (outcome, slot.replace(flight))
                }
            }
        };

        if let Some(stale) = stale {
            stale.abort.abort();
        }
        outcome.await
    }

    /// Abort and forget any in-flight refresh.
    pub fn reset(&self) {
        let flight = self.in_flight.lock().take();
        if let Some(flight) = flight {
            debug!(refresh_id = flight.id, "dropping in-flight api key refresh");
            flight.abort.abort();
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Number of refresh cycles started so far.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Acquire)
    }

    fn spawn_refresh(&self, epoch: u64) -> InFlight {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let refresher = Arc::clone(&self.refresher);
        let store = Arc::clone(&self.store);
        let slot = Arc::clone(&self.in_flight);
        let refreshes = Arc::clone(&self.refreshes);

        let handle = tokio::spawn(async move {
            let _release = SlotRelease { slot, id };
            refreshes.fetch_add(1, Ordering::AcqRel);
            info!(refresh_id = id, "refreshing api key");

            let outcome = match refresher.refresh().await {
                Ok(new_key) => match store.replace_api_key_in_epoch(epoch, &new_key) {
                    Ok(true) => {
                        info!(refresh_id = id, "api key refreshed");
                        Ok(new_key)
                    }
                    Ok(false) => Err(AuthError::expired_token("session changed during refresh")),
                    Err(err) => {
                        warn!(refresh_id = id, error = %err, "refreshed api key rejected");
                        Err(AuthError::expired_token(format!(
                            "refreshed api key rejected: {}",
                            err.message
                        )))
                    }
                },
                Err(err) => {
                    warn!(refresh_id = id, error = %err, "api key refresh failed");
                    Err(AuthError::expired_token(err.to_string()))
                }
            };

            outcome
        });

        let abort = handle.abort_handle();
        let outcome = handle
            .map(|joined| {
                joined.unwrap_or_else(|err| {
                    Err(AuthError::expired_token(format!("api key refresh did not complete: {err}")))
                })
            })
            .boxed()
            .shared();

        InFlight { id, epoch, outcome, abort }
    }
}

impl Drop for TokenRefreshCoordinator {
    fn drop(&mut self) {
        self.reset();
    }
}
