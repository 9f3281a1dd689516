//! # Submission store
//!
//! Keyed store of accepted-submission timestamps, one sequence per session.
//!
//! ## Slots
//!
//! A submission takes a [`Slot`] before any work is done. Purging, counting and
//! taking the slot happen as one atomic step, so concurrent requests of one
//! session can never overshoot the limit. A slot whose mail never left is
//! released again.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: a mutex guarded map, the default for a single instance
//! - [`RedisStore`]: one sorted set per session, scored by epoch millis, for
//!   deployments with more than one relay instance
//!
//! ## Lifecycle
//!
//! - Created on the first reserved slot of a session
//! - Entries outside the window are purged on every reservation
//! - Memory keys of idle sessions are swept on any reservation, Redis keys
//!   expire after one window
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{
    Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

const KEY_PREFIX: &str = "contact:submissions";

// KEYS[1] session key
// ARGV: cutoff millis, limit, slot millis, slot member, ttl secs
// Returns "1" or "0" for granted, followed by the scores left in the window.
const RESERVE_SCRIPT: &str = r"
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
local stamps = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', '+inf', 'WITHSCORES')
local out = {}
if #stamps / 2 < tonumber(ARGV[2]) then
    redis.call('ZADD', KEYS[1], ARGV[3], ARGV[4])
    redis.call('EXPIRE', KEYS[1], ARGV[5])
    out[1] = '1'
else
    out[1] = '0'
end
for i = 2, #stamps, 2 do
    out[#out + 1] = stamps[i]
end
return out
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected store reply: {0}")]
    Reply(String),
}

/// One counted submission, held from the quota check until its mail is out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub at: DateTime<Utc>,
    pub id: String,
}

impl Slot {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            id: format!("{}:{}", at.timestamp_millis(), Uuid::new_v4()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// Taken. `in_window` counts the new slot.
    Granted { in_window: usize },
    /// Refused. Timestamps still inside the window, oldest first.
    Full(Vec<DateTime<Utc>>),
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Drops entries at or before `cutoff`, then stores `slot` if fewer than
    /// `limit` entries are left.
    async fn reserve(
        &self,
        key: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
        slot: &Slot,
        ttl: Duration,
    ) -> Result<Reservation, StoreError>;

    async fn release(&self, key: &str, slot: &Slot) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, Vec<Slot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn reserve(
        &self,
        key: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
        slot: &Slot,
        _ttl: Duration,
    ) -> Result<Reservation, StoreError> {
        let mut sessions = self.sessions.lock().await;

        // Every session shares the window, so one cutoff expires them all.
        sessions.retain(|_, slots| {
            slots.retain(|held| held.at > cutoff);
            !slots.is_empty()
        });

        let slots = sessions.entry(key.to_string()).or_default();

        if slots.len() >= limit {
            let recent = slots.iter().map(|held| held.at).collect();
            if slots.is_empty() {
                sessions.remove(key);
            }
            return Ok(Reservation::Full(recent));
        }

        slots.push(slot.clone());
        slots.sort_unstable_by_key(|held| held.at);

        Ok(Reservation::Granted {
            in_window: slots.len(),
        })
    }

    async fn release(&self, key: &str, slot: &Slot) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;

        if let Some(slots) = sessions.get_mut(key) {
            slots.retain(|held| held.id != slot.id);
            if slots.is_empty() {
                sessions.remove(key);
            }
        }

        Ok(())
    }
}

pub struct RedisStore {
    connection: ConnectionManager,
    reserve: Script,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            reserve: Script::new(RESERVE_SCRIPT),
        }
    }

    fn key(session: &str) -> String {
        format!("{KEY_PREFIX}:{session}")
    }
}

#[async_trait]
impl SubmissionStore for RedisStore {
    fn backend_tag(&self) -> &'static str {
        "redis"
    }

    async fn reserve(
        &self,
        key: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
        slot: &Slot,
        ttl: Duration,
    ) -> Result<Reservation, StoreError> {
        let mut connection = self.connection.clone();

        let reply: Vec<String> = self
            .reserve
            .key(Self::key(key))
            .arg(cutoff.timestamp_millis())
            .arg(limit)
            .arg(slot.at.timestamp_millis())
            .arg(&slot.id)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut connection)
            .await?;

        let Some((granted, scores)) = reply.split_first() else {
            return Err(StoreError::Reply("empty reserve reply".to_string()));
        };

        let stamps: Vec<DateTime<Utc>> = scores
            .iter()
            .filter_map(|score| score.parse::<f64>().ok())
            .filter_map(|millis| DateTime::from_timestamp_millis(millis as i64))
            .collect();

        match granted.as_str() {
            "1" => Ok(Reservation::Granted {
                in_window: stamps.len() + 1,
            }),
            "0" => Ok(Reservation::Full(stamps)),
            other => Err(StoreError::Reply(format!("reserve flag {other}"))),
        }
    }

    async fn release(&self, key: &str, slot: &Slot) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: () = redis::cmd("ZREM")
            .arg(Self::key(key))
            .arg(&slot.id)
            .query_async(&mut connection)
            .await?;

        Ok(())
    }
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    async fn reserve(store: &MemoryStore, key: &str, at: DateTime<Utc>) -> Reservation {
        let cutoff = at - TimeDelta::seconds(3600);
        store.reserve(key, cutoff, 3, &Slot::new(at), TTL).await.unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_fills_then_refuses() {
        let store = MemoryStore::new();
        let start = Utc::now();

        for i in 1..=3 {
            let at = start + TimeDelta::seconds(i);
            assert_eq!(
                reserve(&store, "s", at).await,
                Reservation::Granted { in_window: i as usize }
            );
        }

        match reserve(&store, "s", start + TimeDelta::seconds(10)).await {
            Reservation::Full(recent) => {
                assert_eq!(recent.len(), 3);
                assert_eq!(recent[0], start + TimeDelta::seconds(1));
            }
            other => panic!("expected a full window, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_memory_store_release_frees_slot() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let cutoff = now - TimeDelta::seconds(3600);

        let slot = Slot::new(now);
        store.reserve("s", cutoff, 1, &slot, TTL).await.unwrap();
        assert!(matches!(
            store.reserve("s", cutoff, 1, &Slot::new(now), TTL).await.unwrap(),
            Reservation::Full(_)
        ));

        store.release("s", &slot).await.unwrap();
        assert!(store.sessions.lock().await.is_empty());
        assert!(matches!(
            store.reserve("s", cutoff, 1, &Slot::new(now), TTL).await.unwrap(),
            Reservation::Granted { in_window: 1 }
        ));
    }

    #[tokio::test]
    async fn test_memory_store_sweeps_idle_sessions() {
        let store = MemoryStore::new();
        let start = Utc::now();

        reserve(&store, "idle", start).await;
        reserve(&store, "busy", start + TimeDelta::seconds(10)).await;
        assert_eq!(store.sessions.lock().await.len(), 2);

        // Another visitor, just past the idle session's window.
        reserve(&store, "other", start + TimeDelta::seconds(3601)).await;

        let sessions = store.sessions.lock().await;
        assert!(!sessions.contains_key("idle"));
        assert!(sessions.contains_key("busy"));
        assert!(sessions.contains_key("other"));
    }

    #[tokio::test]
    async fn test_memory_store_keys_are_isolated() {
        let store = MemoryStore::new();
        let now = Utc::now();

        for _ in 0..3 {
            reserve(&store, "a", now).await;
        }

        assert!(matches!(reserve(&store, "a", now).await, Reservation::Full(_)));
        assert_eq!(
            reserve(&store, "b", now).await,
            Reservation::Granted { in_window: 1 }
        );
    }
}
