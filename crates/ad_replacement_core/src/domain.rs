//! crates/ad_replacement_core/src/domain.rs
//!
//! Defines the pure, core data structures for the ad replacement service.
//! These structs are independent of any database or HTTP framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A set of behavioral tags inferred for a user or session.
pub type Intents = BTreeSet<String>;

/// Merges the intents of several sessions into one set.
///
/// Returns `None` when no session carried any intents at all, so callers can
/// tell "nothing known" apart from "known to be empty".
pub fn union_intents<I>(sets: I) -> Option<Intents>
where
    I: IntoIterator<Item = Intents>,
{
    sets.into_iter().fold(None, |acc: Option<Intents>, set| {
        let mut merged = acc.unwrap_or_default();
        merged.extend(set);
        Some(merged)
    })
}

/// A candidate returned by the ad selector. Never persisted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCandidate {
    pub name: String,
    pub category: String,
    /// Creative (image) URL.
    pub url: String,
    /// Landing page.
    pub lp: String,
}

/// The fields of an ad unit known before the store assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdUnit {
    pub session_id: Uuid,
    pub tag_name: String,
    pub width: f64,
    pub height: f64,
    pub href: String,
    pub img: String,
    pub name: Option<String>,
    pub category: Option<String>,
}

/// A persisted record of one served impression.
#[derive(Debug, Clone, PartialEq)]
pub struct AdUnit {
    /// Lower-case hex identifier, also the click-through credential.
    pub id: String,
    pub session_id: Uuid,
    pub tag_name: String,
    pub width: f64,
    pub height: f64,
    pub href: String,
    pub img: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the unit is clicked.
    pub timestamp: Option<DateTime<Utc>>,
}

impl AdUnit {
    /// Generates a fresh hex identifier for a new ad unit.
    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn from_new(id: String, unit: NewAdUnit, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            session_id: unit.session_id,
            tag_name: unit.tag_name,
            width: unit.width,
            height: unit.height,
            href: unit.href,
            img: unit.img,
            name: unit.name,
            category: unit.category,
            created_at,
            timestamp: None,
        }
    }
}

/// The secondary index the service needs on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub property: &'static str,
}
