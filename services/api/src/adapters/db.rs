//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `AdStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use ad_replacement_core::domain::{AdUnit, IndexSpec, Intents, NewAdUnit};
use ad_replacement_core::ports::{AdStore, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `AdStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct IntentsRecord {
    intents: Option<Vec<String>>,
}
impl IntentsRecord {
    fn to_domain(self) -> Option<Intents> {
        self.intents.map(|tags| tags.into_iter().collect())
    }
}

#[derive(FromRow)]
struct AdUnitRecord {
    id: String,
    session_id: Uuid,
    tag_name: String,
    width: f64,
    height: f64,
    href: String,
    img: String,
    name: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
    clicked_at: Option<DateTime<Utc>>,
}
impl AdUnitRecord {
    fn to_domain(self) -> AdUnit {
        AdUnit {
            id: self.id,
            session_id: self.session_id,
            tag_name: self.tag_name,
            width: self.width,
            height: self.height,
            href: self.href,
            img: self.img,
            name: self.name,
            category: self.category,
            created_at: self.created_at,
            timestamp: self.clicked_at,
        }
    }
}

const AD_UNIT_COLUMNS: &str =
    "id, session_id, tag_name, width, height, href, img, name, category, created_at, clicked_at";

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

//=========================================================================================
// `AdStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AdStore for DbAdapter {
    async fn increment_user_ad_replace_count(&self, user_id: Uuid) -> PortResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET stat_ad_replace_count = stat_ad_replace_count + 1 WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn get_user_intents(&self, user_id: Uuid) -> PortResult<Option<Intents>> {
        let record = sqlx::query_as::<_, IntentsRecord>("SELECT intents FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.and_then(IntentsRecord::to_domain))
    }

    async fn get_session_intents(&self, session_id: Uuid) -> PortResult<Option<Intents>> {
        let record =
            sqlx::query_as::<_, IntentsRecord>("SELECT intents FROM sessions WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(record.and_then(IntentsRecord::to_domain))
    }

    async fn get_user_session_intents(&self, user_id: Uuid) -> PortResult<Vec<Intents>> {
        let records = sqlx::query_as::<_, IntentsRecord>(
            "SELECT intents FROM sessions WHERE user_id = $1 AND intents IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().filter_map(IntentsRecord::to_domain).collect())
    }

    async fn record_session_activity(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        activity: &str,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, activity, last_activity_at, stat_ad_replace_count) \
             VALUES ($1, $2, $3, NOW(), 1) \
             ON CONFLICT (session_id) DO UPDATE SET \
                 activity = EXCLUDED.activity, \
                 last_activity_at = EXCLUDED.last_activity_at, \
                 stat_ad_replace_count = sessions.stat_ad_replace_count + 1, \
                 user_id = COALESCE(sessions.user_id, EXCLUDED.user_id)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(activity)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_ad_unit(&self, ad_unit: NewAdUnit) -> PortResult<AdUnit> {
        let sql = format!(
            "INSERT INTO ad_units (id, session_id, tag_name, width, height, href, img, name, category) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            AD_UNIT_COLUMNS
        );
        let record = sqlx::query_as::<_, AdUnitRecord>(&sql)
            .bind(AdUnit::generate_id())
            .bind(ad_unit.session_id)
            .bind(&ad_unit.tag_name)
            .bind(ad_unit.width)
            .bind(ad_unit.height)
            .bind(&ad_unit.href)
            .bind(&ad_unit.img)
            .bind(&ad_unit.name)
            .bind(&ad_unit.category)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_ad_unit(&self, ad_unit_id: &str) -> PortResult<AdUnit> {
        let sql = format!("SELECT {} FROM ad_units WHERE id = $1", AD_UNIT_COLUMNS);
        let record = sqlx::query_as::<_, AdUnitRecord>(&sql)
            .bind(ad_unit_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Ad unit {} not found", ad_unit_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn mark_ad_unit_clicked(&self, ad_unit_id: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE ad_units SET clicked_at = NOW() WHERE id = $1")
            .bind(ad_unit_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Ad unit {} not found", ad_unit_id)));
        }
        Ok(())
    }

    async fn ensure_indices(&self, indices: &[IndexSpec]) -> PortResult<()> {
        for index in indices {
            if !is_identifier(index.collection) || !is_identifier(index.property) {
                return Err(PortError::Unexpected(format!("Invalid index spec {:?}", index)));
            }
            let sql = format!(
                "CREATE INDEX IF NOT EXISTS {0}_{1}_idx ON {0} ({1} ASC)",
                index.collection, index.property
            );
            debug!(%sql, "ensuring index");
            sqlx::query(&sql).execute(&self.pool).await.map_err(unexpected)?;
        }
        Ok(())
    }
}
