use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::core::config::RateLimitConfig;
use crate::core::error::{AppError, Result};
use crate::shared::clock::Clock;

/// Independent limiter buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitScope {
    /// Anonymous report creation
    ReportCreation,
    /// Anonymous thread messages and uploads
    AnonymousThread,
}

struct Limit {
    max: usize,
    window: chrono::Duration,
}

/// Sliding-window request log keyed by `(scope, client address)`
pub struct RateLimitService {
    hits: DashMap<(RateLimitScope, String), VecDeque<DateTime<Utc>>>,
    reports: Limit,
    messages: Limit,
    clock: Arc<dyn Clock>,
}

impl RateLimitService {
    pub fn new(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            hits: DashMap::new(),
            reports: Limit {
                max: config.reports_max,
                window: to_chrono(config.reports_window),
            },
            messages: Limit {
                max: config.messages_max,
                window: to_chrono(config.messages_window),
            },
            clock,
        }
    }

    fn limit(&self, scope: RateLimitScope) -> &Limit {
        match scope {
            RateLimitScope::ReportCreation => &self.reports,
            RateLimitScope::AnonymousThread => &self.messages,
        }
    }

    /// Record one request, failing with `RateLimitExceeded` once the window is full
    pub fn check(&self, scope: RateLimitScope, client_ip: &str) -> Result<()> {
        let now = self.clock.now();
        let limit = self.limit(scope);
        let cutoff = now - limit.window;

        let mut entry = self
            .hits
            .entry((scope, client_ip.to_string()))
            .or_default();
        let log = entry.value_mut();

        while log.front().is_some_and(|t| *t <= cutoff) {
            log.pop_front();
        }

        if log.len() >= limit.max {
            let retry_after = log
                .front()
                .map(|oldest| (*oldest + limit.window - now).num_seconds().max(1))
                .unwrap_or(1);
            tracing::warn!(?scope, "Rate limit exceeded");
            return Err(AppError::RateLimitExceeded(format!(
                "Too many requests. Try again in {} seconds",
                retry_after
            )));
        }

        log.push_back(now);
        Ok(())
    }

    /// Drop logs whose entries have all expired
    pub fn prune(&self) {
        let now = self.clock.now();
        self.hits.retain(|(scope, _), log| {
            let cutoff = now - self.limit(*scope).window;
            log.back().is_some_and(|t| *t > cutoff)
        });
    }

    /// Prune on a fixed interval for the lifetime of the process
    pub fn spawn_pruner(self: Arc<Self>, every: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.prune();
            }
        });
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.hits.len()
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
