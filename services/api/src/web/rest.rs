//! services/api/src/web/rest.rs
//!
//! The route table for the HTTP surface and the master definition for the
//! OpenAPI specification.

use crate::web::clicks::{self, ad_click_handler};
use crate::web::replacement::{self, legacy_replacement_handler, replacement_handler};
use crate::web::state::AppState;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ad Replacement API",
        description = "Replaces ad slots with inline creatives and redirects their clicks."
    ),
    paths(
        replacement::legacy_replacement_handler,
        replacement::replacement_handler,
        clicks::ad_click_handler,
    ),
    tags(
        (name = "Ad Replacement API", description = "Serves replacement ads and tracks their click-throughs.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Route Table
//=========================================================================================

/// One endpoint of the service.
pub struct RouteSpec {
    pub method: MethodFilter,
    pub path: &'static str,
    pub description: &'static str,
    pub deprecated: bool,
    pub handler: fn(MethodFilter) -> MethodRouter<Arc<AppState>>,
}

fn legacy_replacement_route(method: MethodFilter) -> MethodRouter<Arc<AppState>> {
    on(method, legacy_replacement_handler)
}

fn replacement_route(method: MethodFilter) -> MethodRouter<Arc<AppState>> {
    on(method, replacement_handler)
}

fn ad_click_route(method: MethodFilter) -> MethodRouter<Arc<AppState>> {
    on(method, ad_click_handler)
}

pub static ROUTES: &[RouteSpec] = &[
    RouteSpec {
        method: MethodFilter::GET,
        path: "/replacement",
        description: "Performs an ad replacement (deprecated)",
        deprecated: true,
        handler: legacy_replacement_route,
    },
    RouteSpec {
        method: MethodFilter::GET,
        path: "/v1/users/{userId}/replacement",
        description: "Retrieve an ad replacement",
        deprecated: false,
        handler: replacement_route,
    },
    RouteSpec {
        method: MethodFilter::GET,
        path: "/v1/ad-clicks/{adUnitId}",
        description: "Performs an ad replacement click-through",
        deprecated: false,
        handler: ad_click_route,
    },
];

/// Builds the application router from `ROUTES`.
pub fn router(state: Arc<AppState>) -> Router {
    ROUTES
        .iter()
        .fold(Router::new(), |router, route| {
            router.route(route.path, (route.handler)(route.method))
        })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
