//! Integration tests for the legacy and versioned replacement endpoints.

mod common;

use api_lib::adapters::{CatalogAdSelector, MemoryStore};
use axum::http::{header, Request, StatusCode};
use common::{
    ad_unit_id, boat_ad, boat_catalog, body_json, click_url, location, tags, FlakyStore,
    RecordingSelector, TestApp, HOST,
};
use std::sync::Arc;
use uuid::Uuid;

fn v1_uri(user_id: Uuid, session_id: Uuid, width: u32, height: u32) -> String {
    format!(
        "/v1/users/{user_id}/replacement?sessionId={session_id}&tagName=IFRAME&width={width}&height={height}"
    )
}

fn legacy_uri(user_id: Uuid, width: u32, height: u32) -> String {
    format!(
        "/replacement?braveUserId={user_id}&intentHost=www.example.com&tagName=IFRAME&width={width}&height={height}"
    )
}

// ---------------------------------------------------------------------------
// Versioned endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_candidate_serves_placeholder_and_records_the_impression() {
    let store = Arc::new(MemoryStore::new());
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert_user(user_id, None).await;
    let app = TestApp::new(store.clone(), Arc::new(CatalogAdSelector::default()));

    let response = app.get(&v1_uri(user_id, session_id, 300, 250)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let url = location(&response);
    assert!(url.starts_with("data:text/html,<html>"));
    assert!(url.contains(r#"<body style="width: 300px; height: 250px; padding: 0; margin: 0;">"#));
    assert!(url.contains(r#"<img src="https://placeimg.com/300/250/any" />"#));
    assert!(url.contains(">Use Brave</div>"));

    let click = click_url(&response);
    assert!(click.starts_with("http://ads.test/v1/ad-clicks/"));
    assert!(url.contains(&format!(r#"<a href="{click}" target="_blank">"#)));

    let units = store.ad_units().await;
    assert_eq!(units.len(), 1);
    let unit = &units[0];
    assert_eq!(unit.id, ad_unit_id(&response));
    assert_eq!(unit.session_id, session_id);
    assert_eq!(unit.tag_name, "IFRAME");
    assert_eq!((unit.width, unit.height), (300.0, 250.0));
    assert_eq!(unit.href, "https://brave.com/");
    assert_eq!(unit.name, None);
    assert_eq!(unit.timestamp, None);

    assert_eq!(store.user(user_id).await.unwrap().stat_ad_replace_count, 1);

    app.drain().await;
    let session = store.session(session_id).await.expect("session upserted");
    assert_eq!(session.activity.as_deref(), Some("ad"));
    assert_eq!(session.stat_ad_replace_count, 1);
    assert_eq!(session.user_id, Some(user_id));
    assert!(session.timestamp.is_some());
}

#[tokio::test]
async fn candidate_is_served_through_the_click_endpoint() {
    let store = Arc::new(MemoryStore::new());
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert_user(user_id, None).await;
    store.insert_session(session_id, user_id, Some(tags(&["boating"]))).await;
    let app = TestApp::new(store.clone(), boat_catalog());

    let response = app.get(&v1_uri(user_id, session_id, 728, 90)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let ad = boat_ad();
    let url = location(&response);
    assert!(url.contains("width: 728px; height: 90px;"));
    assert!(url.contains(&format!(">{}</div>", ad.name)));
    assert!(url.contains(&format!(r#"<img src="{}" />"#, ad.url)));
    assert!(url.contains(&format!(r#"<a href="{}" target="_blank">"#, click_url(&response))));
    assert!(!url.contains(&ad.lp));

    let unit = store.ad_units().await.pop().unwrap();
    assert_eq!(unit.href, ad.lp);
    assert_eq!(unit.name.as_deref(), Some("Sail Away"));
    assert_eq!(unit.category.as_deref(), Some("boating"));
}

#[tokio::test]
async fn session_without_intents_falls_back_to_the_union_over_user_sessions() {
    let store = Arc::new(MemoryStore::new());
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert_user(user_id, None).await;
    store.insert_session(session_id, user_id, None).await;
    store.insert_session(Uuid::new_v4(), user_id, Some(tags(&["golf", "travel"]))).await;
    store.insert_session(Uuid::new_v4(), user_id, Some(tags(&["boating", "golf"]))).await;
    store.insert_session(Uuid::new_v4(), Uuid::new_v4(), Some(tags(&["cars"]))).await;
    let selector = Arc::new(RecordingSelector::default());
    let app = TestApp::new(store.clone(), selector.clone());

    let response = app.get(&v1_uri(user_id, session_id, 300, 250)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let seen = selector.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![tags(&["boating", "golf", "travel"])]);
}

#[tokio::test]
async fn no_intents_anywhere_skips_selection() {
    let store = Arc::new(MemoryStore::new());
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert_user(user_id, Some(tags(&["boating"]))).await;
    let selector = Arc::new(RecordingSelector::default());
    let app = TestApp::new(store.clone(), selector.clone());

    let response = app.get(&v1_uri(user_id, session_id, 300, 250)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(selector.seen.lock().unwrap().is_empty());
    assert!(location(&response).contains(">Use Brave</div>"));
}

#[tokio::test]
async fn unknown_user_is_not_found_and_nothing_is_written() {
    let store = Arc::new(MemoryStore::new());
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let app = TestApp::new(store.clone(), boat_catalog());

    let response = app.get(&v1_uri(user_id, session_id, 300, 250)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["data"]["braveUserId"], user_id.to_string());

    app.drain().await;
    assert!(store.user(user_id).await.is_none());
    assert!(store.session(session_id).await.is_none());
    assert!(store.ad_units().await.is_empty());
}

#[tokio::test]
async fn invalid_parameters_are_rejected_before_touching_the_store() {
    let store = Arc::new(MemoryStore::new());
    let user_id = Uuid::new_v4();
    store.insert_user(user_id, None).await;
    let app = TestApp::new(store.clone(), boat_catalog());
    let session_id = Uuid::new_v4();

    let bad = [
        format!("/v1/users/not-a-guid/replacement?sessionId={session_id}&tagName=IFRAME&width=1&height=1"),
        format!("/v1/users/{user_id}/replacement?sessionId=nope&tagName=IFRAME&width=1&height=1"),
        format!("/v1/users/{user_id}/replacement?sessionId={session_id}&tagName=IFRAME&width=0&height=1"),
        format!("/v1/users/{user_id}/replacement?sessionId={session_id}&tagName=IFRAME&width=1&height=-5"),
        format!("/v1/users/{user_id}/replacement?sessionId={session_id}&tagName=IFRAME&width=wide&height=1"),
        format!("/v1/users/{user_id}/replacement?sessionId={session_id}&tagName=&width=1&height=1"),
        format!("/v1/users/{user_id}/replacement?sessionId={session_id}&width=1&height=1"),
        format!("/v1/users/{user_id}/replacement?sessionId={session_id}&tagName=IFRAME&width=300&height=250&bogus=1"),
    ];
    for uri in bad {
        let response = app.get(&uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR", "{uri}");
    }

    assert_eq!(store.user(user_id).await.unwrap().stat_ad_replace_count, 0);
    assert!(store.ad_units().await.is_empty());
}

#[tokio::test]
async fn forwarded_proto_selects_the_click_scheme() {
    let store = Arc::new(MemoryStore::new());
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert_user(user_id, None).await;
    let app = TestApp::new(store, boat_catalog());

    let response = app
        .request(
            Request::get(v1_uri(user_id, session_id, 300, 250))
                .header(header::HOST, HOST)
                .header("x-forwarded-proto", "https"),
        )
        .await;

    assert!(click_url(&response).starts_with("https://ads.test/v1/ad-clicks/"));
}

#[tokio::test]
async fn failed_session_update_does_not_change_the_response() {
    let inner = Arc::new(MemoryStore::new());
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    inner.insert_user(user_id, None).await;
    inner.insert_session(session_id, user_id, Some(tags(&["boating"]))).await;
    let app = TestApp::new(Arc::new(FlakyStore { inner: inner.clone() }), boat_catalog());

    let response = app.get(&v1_uri(user_id, session_id, 300, 250)).await;
    app.drain().await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).contains(">Sail Away</div>"));
    assert_eq!(inner.ad_units().await.len(), 1);
    let session = inner.session(session_id).await.unwrap();
    assert_eq!(session.activity, None);
    assert_eq!(session.stat_ad_replace_count, 0);
}

// ---------------------------------------------------------------------------
// Legacy endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn legacy_without_intents_serves_placeholder() {
    let store = Arc::new(MemoryStore::new());
    let user_id = Uuid::new_v4();
    store.insert_user(user_id, None).await;
    let app = TestApp::new(store.clone(), boat_catalog());

    let response = app.get(&legacy_uri(user_id, 160, 600)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let url = location(&response);
    assert!(url.contains("width: 160px; height: 600px;"));
    assert!(url.contains(r#"<img src="https://placeimg.com/160/600"/>"#));
    assert!(url.contains(">Use Brave</div>"));
    assert!(response.headers().get("x-brave").is_none());
    assert_eq!(store.user(user_id).await.unwrap().stat_ad_replace_count, 1);
}

#[tokio::test]
async fn legacy_candidate_links_straight_to_the_advertiser() {
    let store = Arc::new(MemoryStore::new());
    let user_id = Uuid::new_v4();
    store.insert_user(user_id, Some(tags(&["boating", "golf"]))).await;
    let app = TestApp::new(store.clone(), boat_catalog());

    let response = app.get(&legacy_uri(user_id, 300, 250)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let ad = boat_ad();
    let url = location(&response);
    assert!(url.contains(&format!(
        r#"<a href="{}" target="_blank"><img src="{}"/></a>"#,
        ad.lp, ad.url
    )));
    assert!(url.contains(">Sail Away</div>"));

    app.drain().await;
    assert!(store.ad_units().await.is_empty());
}

#[tokio::test]
async fn legacy_unknown_user_is_not_found() {
    let app = TestApp::new(Arc::new(MemoryStore::new()), boat_catalog());
    let user_id = Uuid::new_v4();

    let response = app.get(&legacy_uri(user_id, 300, 250)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["data"]["braveUserId"], user_id.to_string());
}

#[tokio::test]
async fn legacy_requires_a_hostname() {
    let store = Arc::new(MemoryStore::new());
    let user_id = Uuid::new_v4();
    store.insert_user(user_id, None).await;
    let app = TestApp::new(store.clone(), boat_catalog());

    let uri = format!(
        "/replacement?braveUserId={user_id}&intentHost=not_a_host!&tagName=IFRAME&width=300&height=250"
    );
    let response = app.get(&uri).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.user(user_id).await.unwrap().stat_ad_replace_count, 0);
}

#[tokio::test]
async fn legacy_rejects_unknown_parameters() {
    let store = Arc::new(MemoryStore::new());
    let user_id = Uuid::new_v4();
    store.insert_user(user_id, None).await;
    let app = TestApp::new(store.clone(), boat_catalog());

    let response = app.get(&format!("{}&bogus=1", legacy_uri(user_id, 300, 250))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(store.user(user_id).await.unwrap().stat_ad_replace_count, 0);
}
