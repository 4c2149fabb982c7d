pub mod creative;
pub mod domain;
pub mod ports;

pub use creative::{Creative, FALLBACK_CAPTION, FALLBACK_HREF};
pub use domain::{union_intents, AdCandidate, AdUnit, IndexSpec, Intents, NewAdUnit};
pub use ports::{AdSelector, AdStore, PortError, PortResult};
