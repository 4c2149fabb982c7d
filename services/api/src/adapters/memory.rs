//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `AdStore` port. Used when no
//! `DATABASE_URL` is configured and by the integration tests, which seed it
//! through the inherent helpers below.

use ad_replacement_core::domain::{AdUnit, IndexSpec, Intents, NewAdUnit};
use ad_replacement_core::ports::{AdStore, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct UserEntry {
    pub stat_ad_replace_count: i64,
    pub intents: Option<Intents>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionEntry {
    pub user_id: Option<Uuid>,
    pub intents: Option<Intents>,
    pub activity: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub stat_ad_replace_count: i64,
}

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, UserEntry>,
    sessions: HashMap<Uuid, SessionEntry>,
    ad_units: HashMap<String, AdUnit>,
    indices: Vec<IndexSpec>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user_id: Uuid, intents: Option<Intents>) {
        self.inner.write().await.users.insert(
            user_id,
            UserEntry {
                stat_ad_replace_count: 0,
                intents,
            },
        );
    }

    pub async fn insert_session(&self, session_id: Uuid, user_id: Uuid, intents: Option<Intents>) {
        self.inner.write().await.sessions.insert(
            session_id,
            SessionEntry {
                user_id: Some(user_id),
                intents,
                ..SessionEntry::default()
            },
        );
    }

    pub async fn user(&self, user_id: Uuid) -> Option<UserEntry> {
        self.inner.read().await.users.get(&user_id).cloned()
    }

    pub async fn session(&self, session_id: Uuid) -> Option<SessionEntry> {
        self.inner.read().await.sessions.get(&session_id).cloned()
    }

    pub async fn ad_units(&self) -> Vec<AdUnit> {
        self.inner.read().await.ad_units.values().cloned().collect()
    }

    pub async fn indices(&self) -> Vec<IndexSpec> {
        self.inner.read().await.indices.clone()
    }
}

#[async_trait]
impl AdStore for MemoryStore {
    async fn increment_user_ad_replace_count(&self, user_id: Uuid) -> PortResult<u64> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.stat_ad_replace_count += 1;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn get_user_intents(&self, user_id: Uuid) -> PortResult<Option<Intents>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).and_then(|u| u.intents.clone()))
    }

    async fn get_session_intents(&self, session_id: Uuid) -> PortResult<Option<Intents>> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.get(&session_id).and_then(|s| s.intents.clone()))
    }

    async fn get_user_session_intents(&self, user_id: Uuid) -> PortResult<Vec<Intents>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .values()
            .filter(|s| s.user_id == Some(user_id))
            .filter_map(|s| s.intents.clone())
            .collect())
    }

    async fn record_session_activity(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        activity: &str,
    ) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner.sessions.entry(session_id).or_insert_with(|| SessionEntry {
            user_id: Some(user_id),
            ..SessionEntry::default()
        });
        session.activity = Some(activity.to_string());
        session.timestamp = Some(Utc::now());
        session.stat_ad_replace_count += 1;
        Ok(())
    }

    async fn insert_ad_unit(&self, ad_unit: NewAdUnit) -> PortResult<AdUnit> {
        let mut inner = self.inner.write().await;
        let record = AdUnit::from_new(AdUnit::generate_id(), ad_unit, Utc::now());
        inner.ad_units.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_ad_unit(&self, ad_unit_id: &str) -> PortResult<AdUnit> {
        let inner = self.inner.read().await;
        inner
            .ad_units
            .get(ad_unit_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Ad unit {} not found", ad_unit_id)))
    }

    async fn mark_ad_unit_clicked(&self, ad_unit_id: &str) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let unit = inner
            .ad_units
            .get_mut(ad_unit_id)
            .ok_or_else(|| PortError::NotFound(format!("Ad unit {} not found", ad_unit_id)))?;
        unit.timestamp = Some(Utc::now());
        Ok(())
    }

    async fn ensure_indices(&self, indices: &[IndexSpec]) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        for index in indices {
            if !inner.indices.contains(index) {
                inner.indices.push(*index);
            }
        }
        Ok(())
    }
}
