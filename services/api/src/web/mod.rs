pub mod clicks;
pub mod extract;
pub mod params;
pub mod replacement;
pub mod rest;
pub mod state;

// Re-export the router so the binary and the integration tests build the
// same application.
pub use rest::{router, ApiDoc, RouteSpec, ROUTES};
pub use state::AppState;
