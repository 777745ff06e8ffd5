//! Per-actor creation rate limit
//!
//! A fixed trailing window evaluated fresh on every call: count the actor's
//! recorded actions of one kind inside the window and reject once the count
//! reaches the ceiling. There is no token bucket and no in-process state.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::InteractionStore;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::InteractionKind;

pub const DEFAULT_WINDOW_HOURS: i64 = 1;

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn InteractionStore>,
    kind: InteractionKind,
    max_actions: i64,
    window: ChronoDuration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn InteractionStore>,
        kind: InteractionKind,
        max_actions: i64,
        window: ChronoDuration,
    ) -> Self {
        Self {
            store,
            kind,
            max_actions,
            window,
        }
    }

    /// Limiter applied to fork creation: twists per trailing hour
    pub fn for_creation(store: Arc<dyn InteractionStore>, max_per_hour: i64) -> Self {
        Self::new(
            store,
            InteractionKind::Twist,
            max_per_hour,
            ChronoDuration::hours(DEFAULT_WINDOW_HOURS),
        )
    }

    pub async fn count_since(&self, actor_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        self.store.count_actions(actor_id, self.kind, since).await
    }

    /// Ok when the actor may act again at `now`; store errors propagate
    pub async fn check(&self, actor_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        let count = self.count_since(actor_id, now - self.window).await?;

        if count >= self.max_actions {
            warn!(
                actor_id = %actor_id,
                kind = %self.kind,
                count = count,
                max = self.max_actions,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited("create_fork");
            return Err(AppError::RateLimited(format!(
                "rate limit exceeded: max {} per {} hour(s)",
                self.max_actions,
                self.window.num_hours()
            )));
        }

        debug!(actor_id = %actor_id, count = count, "Rate limit check passed");
        Ok(())
    }
}
