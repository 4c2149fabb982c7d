//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use ad_replacement_core::ports::{AdSelector, AdStore};
use std::future::Future;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AdStore>,
    pub selector: Arc<dyn AdSelector>,
    pub config: Arc<Config>,
    /// Detached bookkeeping writes. Closed and drained on shutdown.
    pub background: TaskTracker,
}

impl AppState {
    pub fn new(store: Arc<dyn AdStore>, selector: Arc<dyn AdSelector>, config: Arc<Config>) -> Self {
        Self {
            store,
            selector,
            config,
            background: TaskTracker::new(),
        }
    }

    /// Runs a write the client never waits on. The task must log its own
    /// failures.
    pub fn spawn_detached<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.background.spawn(task);
    }
}
