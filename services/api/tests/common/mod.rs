#![allow(dead_code)]

use ad_replacement_core::domain::{AdCandidate, AdUnit, IndexSpec, Intents, NewAdUnit};
use ad_replacement_core::ports::{AdSelector, AdStore, PortError, PortResult};
use api_lib::adapters::catalog::{CatalogAdSelector, CatalogEntry};
use api_lib::adapters::MemoryStore;
use api_lib::config::Config;
use api_lib::web::{router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const HOST: &str = "ads.test";

/// The full application router plus a handle on its state, so tests can wait
/// for detached writes to land.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new(store: Arc<dyn AdStore>, selector: Arc<dyn AdSelector>) -> Self {
        let state = Arc::new(AppState::new(store, selector, Arc::new(Config::default())));
        Self {
            router: router(state.clone()),
            state,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::get(uri).header(header::HOST, HOST)).await
    }

    pub async fn request(&self, builder: axum::http::request::Builder) -> Response<Body> {
        let request = builder.body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Waits for every detached write spawned so far.
    pub async fn drain(&self) {
        self.state.background.close();
        self.state.background.wait().await;
        self.state.background.reopen();
    }
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect carries a location")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn click_url(response: &Response<Body>) -> String {
    response
        .headers()
        .get("x-brave")
        .expect("x-brave header")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn ad_unit_id(response: &Response<Body>) -> String {
    click_url(response).rsplit('/').next().unwrap().to_string()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn tags(list: &[&str]) -> Intents {
    list.iter().map(|t| t.to_string()).collect()
}

pub fn boat_ad() -> AdCandidate {
    AdCandidate {
        name: "Sail Away".to_string(),
        category: "boating".to_string(),
        url: "https://cdn.test/boat.png".to_string(),
        lp: "https://boats.test/landing".to_string(),
    }
}

/// A catalog holding only `boat_ad()`, matched by the `boating` intent.
pub fn boat_catalog() -> Arc<CatalogAdSelector> {
    Arc::new(CatalogAdSelector::new(vec![CatalogEntry {
        ad: boat_ad(),
        width: None,
        height: None,
    }]))
}

/// Remembers the intents it was asked about and never matches.
#[derive(Default)]
pub struct RecordingSelector {
    pub seen: Mutex<Vec<Intents>>,
}

impl AdSelector for RecordingSelector {
    fn ad_unit_for_intents(&self, intents: &Intents, _: f64, _: f64) -> Option<AdCandidate> {
        self.seen.lock().unwrap().push(intents.clone());
        None
    }
}

/// Delegates to a `MemoryStore` but fails every detached bookkeeping write.
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl AdStore for FlakyStore {
    async fn increment_user_ad_replace_count(&self, user_id: Uuid) -> PortResult<u64> {
        self.inner.increment_user_ad_replace_count(user_id).await
    }

    async fn get_user_intents(&self, user_id: Uuid) -> PortResult<Option<Intents>> {
        self.inner.get_user_intents(user_id).await
    }

    async fn get_session_intents(&self, session_id: Uuid) -> PortResult<Option<Intents>> {
        self.inner.get_session_intents(session_id).await
    }

    async fn get_user_session_intents(&self, user_id: Uuid) -> PortResult<Vec<Intents>> {
        self.inner.get_user_session_intents(user_id).await
    }

    async fn record_session_activity(&self, _: Uuid, _: Uuid, _: &str) -> PortResult<()> {
        Err(PortError::Unexpected("store unavailable".to_string()))
    }

    async fn insert_ad_unit(&self, ad_unit: NewAdUnit) -> PortResult<AdUnit> {
        self.inner.insert_ad_unit(ad_unit).await
    }

    async fn get_ad_unit(&self, ad_unit_id: &str) -> PortResult<AdUnit> {
        self.inner.get_ad_unit(ad_unit_id).await
    }

    async fn mark_ad_unit_clicked(&self, _: &str) -> PortResult<()> {
        Err(PortError::Unexpected("store unavailable".to_string()))
    }

    async fn ensure_indices(&self, indices: &[IndexSpec]) -> PortResult<()> {
        self.inner.ensure_indices(indices).await
    }
}
