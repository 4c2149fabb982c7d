//! services/api/src/bootstrap.rs
//!
//! One-off startup work against the store.

use ad_replacement_core::domain::IndexSpec;
use ad_replacement_core::ports::AdStore;
use tracing::{info, warn};

/// Secondary indices backing analytical queries over served ads.
pub const INDICES: &[IndexSpec] = &[IndexSpec {
    collection: "ad_units",
    property: "session_id",
}];

/// Ensures `INDICES` exist. A failure is logged and startup carries on.
pub async fn initialize(store: &dyn AdStore) {
    match store.ensure_indices(INDICES).await {
        Ok(()) => info!(count = INDICES.len(), "indices ensured"),
        Err(e) => warn!(error = %e, "failed to ensure indices"),
    }
}
