//! services/api/src/adapters/usage.rs
//!
//! Usage counter adapters implementing the `UsageLimiter` port.
//!
//! `RedisUsageLimiter` keeps one sorted set per user (score = consumption time
//! in milliseconds) and runs the sliding-window check inside a Lua script so
//! that concurrent requests for the same user are serialised by Redis.
//! `InMemoryUsageLimiter` runs the same algorithm in-process for local runs
//! without a counter service.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use documind_core::domain::{QuotaDecision, UsageSnapshot};
use documind_core::ports::{PortError, PortResult, UsageLimiter};
use documind_core::quota::{QuotaPolicy, SlidingWindowLog};
use redis::aio::ConnectionManager;
use redis::Script;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

const KEY_PREFIX: &str = "documind:usage";

const CONSUME_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local used = redis.call('ZCARD', key)
local allowed = 0
if used < limit then
  redis.call('ZADD', key, now, ARGV[4])
  used = used + 1
  allowed = 1
end
redis.call('PEXPIRE', key, window)
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local oldest_ms = -1
if oldest[2] then oldest_ms = tonumber(oldest[2]) end
return {allowed, used, oldest_ms}
"#;

// Read-only: counts live entries without pruning or adding.
const PEEK_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local floor = '(' .. (now - window)
local used = redis.call('ZCOUNT', key, floor, '+inf')
local oldest = redis.call('ZRANGEBYSCORE', key, floor, '+inf', 'WITHSCORES', 'LIMIT', 0, 1)
local oldest_ms = -1
if oldest[2] then oldest_ms = tonumber(oldest[2]) end
return {used, oldest_ms}
"#;

fn usage_key(user_id: &str) -> String {
    format!("{}:{}", KEY_PREFIX, user_id)
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms < 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms).single()
}

//=========================================================================================
// Redis
//=========================================================================================

/// Sliding-window limiter backed by the hosted Redis counter service.
#[derive(Clone)]
pub struct RedisUsageLimiter {
    connection: ConnectionManager,
    policy: QuotaPolicy,
    consume_script: Script,
    peek_script: Script,
}

impl RedisUsageLimiter {
    pub async fn connect(redis_url: &str, policy: QuotaPolicy) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self::new(connection, policy))
    }

    pub fn new(connection: ConnectionManager, policy: QuotaPolicy) -> Self {
        Self {
            connection,
            policy,
            consume_script: Script::new(CONSUME_SCRIPT),
            peek_script: Script::new(PEEK_SCRIPT),
        }
    }
}

#[async_trait]
impl UsageLimiter for RedisUsageLimiter {
    async fn consume(&self, key: &str) -> PortResult<QuotaDecision> {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();
        let member = format!("{}-{}", now_ms, Uuid::new_v4());
        let mut connection = self.connection.clone();

        let (allowed, used, oldest_ms): (i64, i64, i64) = self
            .consume_script
            .key(usage_key(key))
            .arg(now_ms)
            .arg(self.policy.window.num_milliseconds())
            .arg(self.policy.limit)
            .arg(member)
            .invoke_async(&mut connection)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(QuotaDecision {
            allowed: allowed == 1,
            usage: self
                .policy
                .snapshot(used.max(0) as u32, from_millis(oldest_ms), now),
        })
    }

    async fn remaining(&self, key: &str) -> PortResult<UsageSnapshot> {
        let now = Utc::now();
        let mut connection = self.connection.clone();

        let (used, oldest_ms): (i64, i64) = self
            .peek_script
            .key(usage_key(key))
            .arg(now.timestamp_millis())
            .arg(self.policy.window.num_milliseconds())
            .invoke_async(&mut connection)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(self
            .policy
            .snapshot(used.max(0) as u32, from_millis(oldest_ms), now))
    }
}

//=========================================================================================
// In-memory
//=========================================================================================

/// Process-local limiter. Counts reset when the process restarts.
#[derive(Default)]
pub struct InMemoryUsageLimiter {
    policy: QuotaPolicy,
    logs: Mutex<HashMap<String, SlidingWindowLog>>,
}

impl InMemoryUsageLimiter {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            policy,
            logs: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UsageLimiter for InMemoryUsageLimiter {
    async fn consume(&self, key: &str) -> PortResult<QuotaDecision> {
        let mut logs = self.logs.lock().await;
        let log = logs.entry(key.to_string()).or_default();
        Ok(log.consume(&self.policy, Utc::now()))
    }

    async fn remaining(&self, key: &str) -> PortResult<UsageSnapshot> {
        let logs = self.logs.lock().await;
        let now = Utc::now();
        Ok(match logs.get(key) {
            Some(log) => log.snapshot(&self.policy, now),
            None => self.policy.snapshot(0, None, now),
        })
    }
}
