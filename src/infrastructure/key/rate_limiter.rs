//! Per-key rate limiting with per-class budgets
//!
//! Sliding one-minute window per key string. Runs after the
//! authorization gate as an optional extension; the gate itself never
//! consults it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::key::KeyClass;

const WINDOW: Duration = Duration::from_secs(60);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Requests-per-minute budgets for the two key classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassBudgets {
    pub dev_rpm: u32,
    pub prod_rpm: u32,
}

impl Default for ClassBudgets {
    fn default() -> Self {
        Self {
            dev_rpm: 100,
            prod_rpm: 1000,
        }
    }
}

impl ClassBudgets {
    pub fn budget_for(&self, class: KeyClass) -> u32 {
        match class {
            KeyClass::Dev => self.dev_rpm,
            KeyClass::Prod => self.prod_rpm,
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in_seconds: u64,
}

/// Sliding-window limiter keyed by the full key string
#[derive(Debug)]
pub struct RateLimiter {
    budgets: ClassBudgets,
    windows: RwLock<HashMap<String, Vec<Instant>>>,
    last_cleanup: RwLock<Instant>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_budgets(ClassBudgets::default())
    }

    pub fn with_budgets(budgets: ClassBudgets) -> Self {
        Self {
            budgets,
            windows: RwLock::new(HashMap::new()),
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    /// Checks the budget for the key and records the request when it
    /// is allowed. Denied requests do not consume budget.
    pub async fn check_and_record(&self, key: &str, class: KeyClass) -> RateLimitResult {
        self.maybe_cleanup().await;

        let limit = self.budgets.budget_for(class);
        let now = Instant::now();

        let mut windows = self.windows.write().await;
        let timestamps = windows.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < WINDOW);

        let used = timestamps.len() as u32;
        let reset_in_seconds = timestamps
            .first()
            .map(|oldest| {
                WINDOW
                    .saturating_sub(now.duration_since(*oldest))
                    .as_secs()
            })
            .unwrap_or(0);

        if used >= limit {
            debug!(class = %class, used, limit, "Rate limit exceeded");
            return RateLimitResult {
                allowed: false,
                limit,
                remaining: 0,
                reset_in_seconds,
            };
        }

        timestamps.push(now);
        RateLimitResult {
            allowed: true,
            limit,
            remaining: limit - used - 1,
            reset_in_seconds,
        }
    }

    /// Forgets all requests recorded for the key
    pub async fn reset(&self, key: &str) {
        self.windows.write().await.remove(key);
    }

    async fn maybe_cleanup(&self) {
        let now = Instant::now();
        {
            let last = self.last_cleanup.read().await;
            if now.duration_since(*last) < CLEANUP_INTERVAL {
                return;
            }
        }

        let mut last = self.last_cleanup.write().await;
        if now.duration_since(*last) < CLEANUP_INTERVAL {
            return;
        }
        *last = now;

        let mut windows = self.windows.write().await;
        windows.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < WINDOW);
            !timestamps.is_empty()
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
