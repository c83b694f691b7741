//! Session middleware configuration.
//!
//! Sessions hold the visitor's cart slot and live in memory, so a restart
//! empties every cart. Records sit in a bounded moka cache that drops them
//! after the same inactivity window as the cookie, so abandoned carts do not
//! pile up for the life of the process.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "at_session";

/// Session expiry time in seconds (30 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Most sessions kept at once; the least recently used go first beyond this.
const SESSION_CAPACITY: u64 = 100_000;

/// In-memory session store with idle eviction.
#[derive(Clone, Debug)]
pub struct SessionCache {
    records: Cache<Id, Record>,
}

impl SessionCache {
    /// Create a store evicting records idle for longer than `idle`.
    #[must_use]
    pub fn new(capacity: u64, idle: Duration) -> Self {
        Self {
            records: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(idle)
                .build(),
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(
            SESSION_CAPACITY,
            Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()),
        )
    }
}

#[async_trait]
impl SessionStore for SessionCache {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let Some(record) = self.records.get(session_id).await else {
            return Ok(None);
        };
        if record.expiry_date <= OffsetDateTime::now_utc() {
            self.records.invalidate(session_id).await;
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer over an in-memory [`SessionCache`].
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<SessionCache> {
    SessionManagerLayer::new(SessionCache::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::cookie::time::Duration as TimeDuration;

    use super::*;

    fn record(expires_in: TimeDuration) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = SessionCache::default();
        let mut active = record(TimeDuration::minutes(30));
        store.create(&mut active).await.unwrap();

        let loaded = store.load(&active.id).await.unwrap();
        assert_eq!(loaded.map(|r| r.id), Some(active.id));

        store.delete(&active.id).await.unwrap();
        assert!(store.load(&active.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_record_is_dropped() {
        let store = SessionCache::default();
        let stale = record(TimeDuration::minutes(-1));
        store.save(&stale).await.unwrap();

        assert!(store.load(&stale.id).await.unwrap().is_none());
        assert!(!store.records.contains_key(&stale.id));
    }

    #[tokio::test]
    async fn test_idle_records_are_evicted() {
        let store = SessionCache::new(10, Duration::from_millis(50));
        let idle = record(TimeDuration::minutes(30));
        store.save(&idle).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        store.records.run_pending_tasks().await;

        assert!(store.load(&idle.id).await.unwrap().is_none());
        assert_eq!(store.records.entry_count(), 0);
    }
}
