//! Stateful stores driving the services.
//!
//! Every store action follows the same envelope:
//!
//! ```text
//! action() ──► loading = true, error = None
//!                 │
//!                 ▼
//!            service call ──► Ok  ──► update state ──► return Ok(data)
//!                 │
//!                 └─────────► Err ──► error = server message or fallback
//!                                     └─► return Err(original error)
//!
//! (always) loading = false
//! ```
//!
//! `loading` is cleared by a [`LoadingGuard`] when the action's scope ends,
//! so a dropped action future also clears it. Watchers obtained through
//! `subscribe()` see each transition.

pub mod order;
pub mod product;
pub mod user;

pub use order::OrderStore;
pub use product::ProductStore;
pub use user::{SessionState, UserStore};

use tokio::sync::watch;
use tracing::warn;

use crate::error::ApiError;
use crate::telemetry;

/// Transient state shared by every store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStatus {
    /// An action is in flight.
    pub loading: bool,
    /// User-facing message from the last failed action.
    pub error: Option<String>,
}

/// Publishes a store's [`ActionStatus`] to any number of watchers.
#[derive(Debug)]
pub struct StatusTracker {
    store: &'static str,
    tx: watch::Sender<ActionStatus>,
}

impl StatusTracker {
    #[must_use]
    pub fn new(store: &'static str) -> Self {
        let (tx, _rx) = watch::channel(ActionStatus::default());
        Self { store, tx }
    }

    /// Current status.
    #[must_use]
    pub fn snapshot(&self) -> ActionStatus {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ActionStatus> {
        self.tx.subscribe()
    }

    /// Start an action: set loading and clear the previous error.
    #[must_use = "loading is cleared when the guard is dropped"]
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.tx.send_modify(|status| {
            status.loading = true;
            status.error = None;
        });
        LoadingGuard { tx: &self.tx }
    }

    /// Start an action that leaves the previous error in place.
    #[must_use = "loading is cleared when the guard is dropped"]
    pub fn begin_quiet(&self) -> LoadingGuard<'_> {
        self.tx.send_modify(|status| status.loading = true);
        LoadingGuard { tx: &self.tx }
    }

    /// Record a failed action and hand the error back for propagation.
    pub fn fail(&self, action: &str, fallback: &str, err: ApiError) -> ApiError {
        let message = err.display_message(fallback);
        warn!(
            store = self.store,
            action,
            error = %err,
            message = %message,
            "Store action failed"
        );
        telemetry::action_breadcrumb(self.store, action, Some(&message));
        self.tx.send_modify(|status| status.error = Some(message));
        err
    }

    /// Record a successful action.
    pub fn succeed(&self, action: &str) {
        telemetry::action_breadcrumb(self.store, action, None);
    }
}

/// Clears `loading` on drop.
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    tx: &'a watch::Sender<ActionStatus>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.tx.send_modify(|status| status.loading = false);
    }
}
