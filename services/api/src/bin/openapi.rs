//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the Ad Replacement API (the legacy and
//! versioned replacement endpoints plus the ad-click redirect) as pretty JSON.
//!
//! Usage: `openapi [OUTPUT]`, where `OUTPUT` defaults to `openapi.json`.

use api_lib::web::{ApiDoc, ROUTES};
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let doc = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, doc)?;

    println!("Wrote {} routes to {}", ROUTES.len(), path);
    Ok(())
}
