//! crates/ad_replacement_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The document store and the ad selector are external collaborators; the
//! HTTP handlers only ever see them through these traits.

use crate::domain::{AdCandidate, AdUnit, IndexSpec, Intents, NewAdUnit};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AdStore: Send + Sync {
    // --- Users ---
    /// Bumps `stat_ad_replace_count` and returns how many users matched.
    /// Never creates a user.
    async fn increment_user_ad_replace_count(&self, user_id: Uuid) -> PortResult<u64>;

    async fn get_user_intents(&self, user_id: Uuid) -> PortResult<Option<Intents>>;

    // --- Sessions ---
    async fn get_session_intents(&self, session_id: Uuid) -> PortResult<Option<Intents>>;

    /// Intents of every session owned by `user_id` that has any.
    async fn get_user_session_intents(&self, user_id: Uuid) -> PortResult<Vec<Intents>>;

    /// Upserts the session, setting its activity label and timestamp and
    /// bumping its counter. `user_id` is only recorded on insert.
    async fn record_session_activity(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        activity: &str,
    ) -> PortResult<()>;

    // --- Ad units ---
    async fn insert_ad_unit(&self, ad_unit: NewAdUnit) -> PortResult<AdUnit>;

    /// Fails with `PortError::NotFound` when no unit has this id.
    async fn get_ad_unit(&self, ad_unit_id: &str) -> PortResult<AdUnit>;

    async fn mark_ad_unit_clicked(&self, ad_unit_id: &str) -> PortResult<()>;

    // --- Bootstrap ---
    /// Idempotently creates the given secondary indices.
    async fn ensure_indices(&self, indices: &[IndexSpec]) -> PortResult<()>;
}

/// Picks an ad for a set of intents. Pure: no I/O, no side effects.
pub trait AdSelector: Send + Sync {
    fn ad_unit_for_intents(&self, intents: &Intents, width: f64, height: f64)
        -> Option<AdCandidate>;
}
