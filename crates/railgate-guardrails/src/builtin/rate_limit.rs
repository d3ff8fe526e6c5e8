//! Fixed-window rate limiting guardrail
//!
//! One bucket per identifier in a process-wide map. A bucket is created on
//! first use and replaced wholesale when its window elapses; within a
//! window the count just increments. A burst straddling a window boundary
//! can admit up to twice the limit in a short span — accepted tradeoff of
//! the fixed window, not a defect. Traffic with no resolvable identifier
//! fails open.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::ValidationContext;
use crate::guardrail::{Guardrail, GuardrailCategory};
use crate::result::{GuardrailResult, Severity};
use crate::{GuardrailError, Result};

pub const NAME: &str = "ApiRateLimit";

/// Which context fact identifies the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateKey {
    ApiKey,
    User,
    ClientIp,
}

struct WindowBucket {
    count: u32,
    window_start: Instant,
}

/// Process-wide bucket map, shared by every rate-limit guardrail resolved
/// from one registry. `clear` exists for test isolation.
#[derive(Clone, Default)]
pub struct RateLimitStore {
    buckets: Arc<DashMap<String, WindowBucket>>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every bucket.
    pub fn clear(&self) {
        self.buckets.clear();
    }

    /// Number of live buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Outcome of one bucket update
enum WindowDecision {
    Fresh,
    Within { count: u32 },
    Warned { count: u32, remaining: u32 },
    Exceeded { count: u32, retry_after: Duration },
}

/// Configuration for [`ApiRateLimit`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Calls admitted per window
    pub limit: u32,

    /// Window length in milliseconds
    pub window_ms: u64,

    /// Context fact used as the bucket identifier
    #[serde(default = "default_key")]
    pub key: RateKey,

    /// Warn when remaining capacity drops to this many calls
    #[serde(default)]
    pub warn_threshold: u32,
}

fn default_key() -> RateKey {
    RateKey::ApiKey
}

/// Fixed-window limiter over a shared bucket store.
pub struct ApiRateLimit {
    config: RateLimitConfig,
    window: Duration,
    store: RateLimitStore,
}

impl ApiRateLimit {
    pub fn new(config: RateLimitConfig, store: RateLimitStore) -> Result<Self> {
        if config.limit == 0 {
            return Err(GuardrailError::config("limit must be at least 1"));
        }
        if config.window_ms == 0 {
            return Err(GuardrailError::config("window_ms must be at least 1"));
        }
        let window = Duration::from_millis(config.window_ms);
        Ok(Self {
            config,
            window,
            store,
        })
    }

    fn identifier(&self, context: &ValidationContext) -> Option<String> {
        let raw = match self.config.key {
            RateKey::ApiKey => context.api_key_id.as_deref(),
            RateKey::User => context.user_id.as_deref(),
            RateKey::ClientIp => context.client_ip.as_deref(),
        }?;
        Some(format!("{:?}:{raw}", self.config.key))
    }

    /// Update the identifier's bucket under the map's entry lock so
    /// concurrent calls for the same key cannot lose increments.
    fn tick(&self, id: String) -> WindowDecision {
        let now = Instant::now();
        let mut entry = self.store.buckets.entry(id).or_insert(WindowBucket {
            count: 0,
            window_start: now,
        });
        let bucket = entry.value_mut();

        if bucket.count == 0 || now.duration_since(bucket.window_start) >= self.window {
            *bucket = WindowBucket {
                count: 1,
                window_start: now,
            };
            return WindowDecision::Fresh;
        }

        bucket.count += 1;

        if bucket.count > self.config.limit {
            let elapsed = now.duration_since(bucket.window_start);
            return WindowDecision::Exceeded {
                count: bucket.count,
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        let remaining = self.config.limit - bucket.count;
        if self.config.warn_threshold > 0 && remaining <= self.config.warn_threshold {
            return WindowDecision::Warned {
                count: bucket.count,
                remaining,
            };
        }

        WindowDecision::Within {
            count: bucket.count,
        }
    }
}

#[async_trait]
impl Guardrail for ApiRateLimit {
    fn name(&self) -> &str {
        NAME
    }

    fn category(&self) -> GuardrailCategory {
        GuardrailCategory::Input
    }

    async fn execute(
        &self,
        _content: &str,
        context: &ValidationContext,
    ) -> Result<GuardrailResult> {
        let Some(id) = self.identifier(context) else {
            // Unidentified traffic fails open rather than blocking.
            return Ok(GuardrailResult::allow(NAME, "no rate-limit identifier in context")
                .with_metadata("fail_open", json!(true)));
        };

        let result = match self.tick(id) {
            WindowDecision::Fresh => GuardrailResult::allow(NAME, "new rate window")
                .with_metadata("count", json!(1)),
            WindowDecision::Within { count } => {
                GuardrailResult::allow(NAME, "within rate limit")
                    .with_metadata("count", json!(count))
            }
            WindowDecision::Warned { count, remaining } => GuardrailResult::warn(
                NAME,
                Severity::Warning,
                format!("approaching rate limit: {remaining} call(s) remaining"),
            )
            .with_metadata("count", json!(count))
            .with_metadata("remaining", json!(remaining)),
            WindowDecision::Exceeded { count, retry_after } => GuardrailResult::block(
                NAME,
                Severity::Error,
                format!(
                    "rate limit of {} per {}ms exceeded",
                    self.config.limit, self.config.window_ms
                ),
            )
            .with_metadata("count", json!(count))
            .with_metadata("retry_after_ms", json!(retry_after.as_millis() as u64)),
        };

        Ok(result.with_metadata("limit", json!(self.config.limit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationType;
    use crate::result::GuardrailAction;
    use tokio::time::sleep;

    fn limiter(limit: u32, window_ms: u64, warn_threshold: u32) -> ApiRateLimit {
        ApiRateLimit::new(
            RateLimitConfig {
                limit,
                window_ms,
                key: RateKey::ApiKey,
                warn_threshold,
            },
            RateLimitStore::new(),
        )
        .unwrap()
    }

    fn ctx(key: &str) -> ValidationContext {
        ValidationContext::new(ValidationType::Input).with_api_key_id(key)
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = ApiRateLimit::new(
            RateLimitConfig {
                limit: 0,
                window_ms: 1000,
                key: RateKey::ApiKey,
                warn_threshold: 0,
            },
            RateLimitStore::new(),
        );
        assert!(matches!(result, Err(GuardrailError::Config(_))));
    }

    #[tokio::test]
    async fn test_allow_allow_block() {
        let limiter = limiter(2, 1000, 0);
        let ctx = ctx("k1");

        let first = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(first.action, GuardrailAction::Allow);

        let second = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(second.action, GuardrailAction::Allow);

        let third = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(third.action, GuardrailAction::Block);
        let retry = third.metadata.get("retry_after_ms").unwrap().as_u64().unwrap();
        assert!(retry > 0);
    }

    #[tokio::test]
    async fn test_window_elapse_resets_count() {
        let limiter = limiter(1, 50, 0);
        let ctx = ctx("k1");

        limiter.execute("", &ctx).await.unwrap();
        let blocked = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(blocked.action, GuardrailAction::Block);

        sleep(Duration::from_millis(80)).await;

        let fresh = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(fresh.action, GuardrailAction::Allow);
        assert_eq!(fresh.metadata.get("count").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_warn_threshold() {
        let limiter = limiter(3, 1000, 1);
        let ctx = ctx("k1");

        let first = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(first.action, GuardrailAction::Allow);

        // Second call leaves one remaining: warn
        let second = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(second.action, GuardrailAction::Warn);
        assert_eq!(second.metadata.get("remaining").unwrap(), 1);

        let third = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(third.action, GuardrailAction::Warn);

        let fourth = limiter.execute("", &ctx).await.unwrap();
        assert_eq!(fourth.action, GuardrailAction::Block);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = limiter(1, 1000, 0);

        assert_eq!(
            limiter.execute("", &ctx("a")).await.unwrap().action,
            GuardrailAction::Allow
        );
        assert_eq!(
            limiter.execute("", &ctx("b")).await.unwrap().action,
            GuardrailAction::Allow
        );
        assert_eq!(
            limiter.execute("", &ctx("a")).await.unwrap().action,
            GuardrailAction::Block
        );
    }

    #[tokio::test]
    async fn test_missing_identifier_fails_open() {
        let limiter = limiter(1, 1000, 0);
        let anonymous = ValidationContext::new(ValidationType::Input);

        for _ in 0..5 {
            let result = limiter.execute("", &anonymous).await.unwrap();
            assert_eq!(result.action, GuardrailAction::Allow);
            assert_eq!(result.metadata.get("fail_open").unwrap(), true);
        }
    }

    #[tokio::test]
    async fn test_user_key_selection() {
        let limiter = ApiRateLimit::new(
            RateLimitConfig {
                limit: 1,
                window_ms: 1000,
                key: RateKey::User,
                warn_threshold: 0,
            },
            RateLimitStore::new(),
        )
        .unwrap();

        // api_key_id present but the configured key is user_id: fails open
        let keyed_only = ValidationContext::new(ValidationType::Input).with_api_key_id("k");
        let result = limiter.execute("", &keyed_only).await.unwrap();
        assert_eq!(result.metadata.get("fail_open").unwrap(), true);

        let user_ctx = ValidationContext::new(ValidationType::Input).with_user_id("u1");
        limiter.execute("", &user_ctx).await.unwrap();
        let second = limiter.execute("", &user_ctx).await.unwrap();
        assert_eq!(second.action, GuardrailAction::Block);
    }

    #[tokio::test]
    async fn test_store_shared_between_instances() {
        let store = RateLimitStore::new();
        let config = RateLimitConfig {
            limit: 1,
            window_ms: 1000,
            key: RateKey::ApiKey,
            warn_threshold: 0,
        };
        let a = ApiRateLimit::new(config.clone(), store.clone()).unwrap();
        let b = ApiRateLimit::new(config, store.clone()).unwrap();

        let ctx = ctx("shared");
        a.execute("", &ctx).await.unwrap();
        let result = b.execute("", &ctx).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Block);

        store.clear();
        assert!(store.is_empty());
        let fresh = b.execute("", &ctx).await.unwrap();
        assert_eq!(fresh.action, GuardrailAction::Allow);
    }
}
