//! services/api/src/web/clicks.rs
//!
//! Click-through for ads served by the versioned replacement endpoint.
//!
//! Possession of an ad unit id is the only credential checked here; the id is
//! not tied back to the session or user it was served to.

use crate::error::{ApiError, ApiResult};
use crate::web::extract::ValidatedPath;
use crate::web::params::AdClickPath;
use crate::web::replacement::redirect;
use crate::web::state::AppState;
use ad_replacement_core::ports::PortError;
use axum::{extract::State, response::Response};
use std::sync::Arc;
use tracing::{debug, warn};

/// Performs an ad replacement click-through
///
/// Redirects to the landing page of the ad served under `adUnitId`.
#[utoipa::path(
    get,
    path = "/v1/ad-clicks/{adUnitId}",
    params(AdClickPath),
    responses(
        (status = 302, description = "Redirect to the advertiser's landing page"),
        (status = 400, description = "adUnitId is not a hex string"),
        (status = 404, description = "adUnitId does not refer to a replacement ad")
    )
)]
pub async fn ad_click_handler(
    State(state): State<Arc<AppState>>,
    ValidatedPath(AdClickPath { ad_unit_id }): ValidatedPath<AdClickPath>,
) -> ApiResult<Response> {
    let id = ad_unit_id.to_ascii_lowercase();

    let ad_unit = match state.store.get_ad_unit(&id).await {
        Ok(ad_unit) => ad_unit,
        Err(PortError::NotFound(_)) => {
            return Err(ApiError::not_found("ad unit does not exist", "adUnitId", &ad_unit_id))
        }
        Err(e) => return Err(e.into()),
    };
    debug!(ad_unit_id = %id, href = %ad_unit.href, "click-through");

    let response = redirect(&ad_unit.href)?;

    let store = state.store.clone();
    state.spawn_detached(async move {
        if let Err(e) = store.mark_ad_unit_clicked(&id).await {
            warn!(ad_unit_id = %id, error = %e, "click timestamp update failed");
        }
    });

    Ok(response)
}
