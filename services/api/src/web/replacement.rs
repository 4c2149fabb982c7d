//! services/api/src/web/replacement.rs
//!
//! Ad replacement endpoints. Both answer with a redirect to a `data:` URL that
//! renders the chosen creative in place of the original ad slot.

use crate::error::{ApiError, ApiResult};
use crate::web::extract::{ValidatedPath, ValidatedQuery};
use crate::web::params::{LegacyReplacementQuery, ReplacementQuery, UserPath};
use crate::web::state::AppState;
use ad_replacement_core::creative::{data_url, legacy_creative, Creative};
use ad_replacement_core::domain::{union_intents, Intents, NewAdUnit};
use ad_replacement_core::ports::{AdStore, PortResult};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Debugging aid: carries the click-through URL embedded in the creative.
pub const X_BRAVE: HeaderName = HeaderName::from_static("x-brave");

pub(crate) fn redirect(location: &str) -> ApiResult<Response> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| ApiError::Internal(format!("Unusable redirect target: {}", e)))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

async fn count_replacement(store: &dyn AdStore, user_id: Uuid) -> ApiResult<()> {
    if store.increment_user_ad_replace_count(user_id).await? == 0 {
        return Err(ApiError::not_found("user entry does not exist", "braveUserId", user_id));
    }
    Ok(())
}

/// The session's own intents, or else everything known across the user's
/// sessions.
async fn resolve_intents(
    store: &dyn AdStore,
    session_id: Uuid,
    user_id: Uuid,
) -> PortResult<Option<Intents>> {
    if let Some(intents) = store.get_session_intents(session_id).await? {
        return Ok(Some(intents));
    }
    Ok(union_intents(store.get_user_session_intents(user_id).await?))
}

fn click_base_url(headers: &HeaderMap, uri: &Uri, state: &AppState) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| *v == "http" || *v == "https")
        .unwrap_or(state.config.default_scheme.as_str())
        .to_string();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| state.config.bind_address.to_string());
    format!("{}://{}", scheme, host)
}

/// Performs an ad replacement (deprecated)
///
/// Superseded by `GET /v1/users/{userId}/replacement`; clicks on ads served
/// here cannot be tracked.
#[utoipa::path(
    get,
    path = "/replacement",
    params(LegacyReplacementQuery),
    responses(
        (status = 302, description = "Redirect to a data:text/html document holding the ad"),
        (status = 400, description = "Missing or malformed parameter"),
        (status = 404, description = "braveUserId does not refer to an existing user")
    )
)]
pub async fn legacy_replacement_handler(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<LegacyReplacementQuery>,
) -> ApiResult<Response> {
    let user_id = query.brave_user_id;
    let (width, height) = (query.width, query.height);

    count_replacement(state.store.as_ref(), user_id).await?;

    let intents = state.store.get_user_intents(user_id).await?;
    debug!(%user_id, ?intents, "user intents");

    let ad = intents
        .as_ref()
        .and_then(|intents| state.selector.ad_unit_for_intents(intents, width, height));
    if ad.is_none() {
        debug!(%user_id, "default ad returned");
    }

    let (body, caption) = legacy_creative(ad.as_ref(), width, height);
    let url = data_url(width, height, &body, &caption);
    debug!(?query, %url, "serving ad");
    redirect(&url)
}

/// Retrieve an ad replacement
///
/// Returns a redirect to `data:text/html,<html>...<a href="https://.../v1/ad-clicks/{adUnitId}"><img src="..." /></a>...</html>`.
#[utoipa::path(
    get,
    path = "/v1/users/{userId}/replacement",
    params(UserPath, ReplacementQuery),
    responses(
        (status = 302, description = "Redirect to a data:text/html document holding the ad",
         headers(("x-brave" = String, description = "The click-through URL, for debugging"))),
        (status = 400, description = "Missing or malformed parameter"),
        (status = 404, description = "userId does not refer to an existing user")
    )
)]
pub async fn replacement_handler(
    State(state): State<Arc<AppState>>,
    ValidatedPath(UserPath { user_id }): ValidatedPath<UserPath>,
    ValidatedQuery(query): ValidatedQuery<ReplacementQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Response> {
    let session_id = query.session_id;
    let (width, height) = (query.width, query.height);
    let store = state.store.as_ref();

    count_replacement(store, user_id).await?;

    let intents = resolve_intents(store, session_id, user_id).await?;
    debug!(%user_id, %session_id, ?intents, "intents");

    let ad = intents
        .as_ref()
        .and_then(|intents| state.selector.ad_unit_for_intents(intents, width, height));
    match &ad {
        Some(ad) => info!(category = %ad.category, name = %ad.name, ?intents, "serving ad"),
        None => debug!(%session_id, "default ad returned"),
    }

    let creative = Creative::for_candidate(ad.as_ref(), width, height);
    let ad_unit = store
        .insert_ad_unit(NewAdUnit {
            session_id,
            tag_name: query.tag_name,
            width,
            height,
            href: creative.href.clone(),
            img: creative.img.clone(),
            name: ad.as_ref().map(|a| a.name.clone()),
            category: ad.as_ref().map(|a| a.category.clone()),
        })
        .await?;

    let click_url = format!(
        "{}/v1/ad-clicks/{}",
        click_base_url(&headers, &uri, &state),
        ad_unit.id
    );
    let url = data_url(width, height, &creative.linked_through(&click_url), &creative.caption);

    let mut response = redirect(&url)?;
    let debug_header = HeaderValue::from_str(&click_url)
        .map_err(|e| ApiError::Internal(format!("Unusable click URL: {}", e)))?;
    response.headers_mut().insert(X_BRAVE, debug_header);

    let store = state.store.clone();
    state.spawn_detached(async move {
        if let Err(e) = store.record_session_activity(session_id, user_id, "ad").await {
            warn!(%session_id, %user_id, error = %e, "session update failed");
        }
    });

    Ok(response)
}
