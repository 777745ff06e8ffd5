//! Fork creation, lookup, interactions and reports
//!
//! Everything outside feed generation that writes to the store goes through
//! here. Creation is rate limited; plain reads and interaction writes are not.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{ForkStore, InteractionStore};
use crate::error::{AppError, Result};
use crate::models::{
    CreateForkInput, Fork, Interaction, InteractionKind, Report, ReportReason,
    REPORT_STATE_PENDING,
};
use crate::services::rate_limit::RateLimiter;

pub const DEFAULT_AGE_GATE: &str = "all";
pub const DEFAULT_SENSITIVITY: &str = "normal";

#[derive(Clone)]
pub struct ForkService {
    forks: Arc<dyn ForkStore>,
    interactions: Arc<dyn InteractionStore>,
    limiter: RateLimiter,
}

impl ForkService {
    pub fn new(
        forks: Arc<dyn ForkStore>,
        interactions: Arc<dyn InteractionStore>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            forks,
            interactions,
            limiter,
        }
    }

    /// Validate, rate limit, then persist a new fork owned by `actor_id`
    pub async fn create_fork(&self, actor_id: Uuid, input: CreateForkInput) -> Result<Fork> {
        input.validate()?;
        let mutation = input.mutation()?;

        if let Some(parent_id) = input.parent_fork_id {
            if self.forks.get_fork(parent_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "parent fork {} does not exist",
                    parent_id
                )));
            }
        }

        let now = Utc::now();
        self.limiter.check(actor_id, now).await?;

        let fork = Fork {
            id: Uuid::new_v4(),
            prompt: input.prompt,
            left_label: input.left_label,
            right_label: input.right_label,
            left_asset_id: None,
            right_asset_id: None,
            intent_lane: input.intent_lane,
            mood: input.mood.filter(|m| !m.is_empty()),
            energy: input.energy.filter(|e| !e.is_empty()),
            time_fit_s: None,
            cognitive_load: None,
            parent_fork_id: input.parent_fork_id,
            mutation_type: mutation.map(|m| m.as_str().to_string()),
            safety_age_gate: DEFAULT_AGE_GATE.to_string(),
            safety_sensitivity: DEFAULT_SENSITIVITY.to_string(),
            safety_flags: Vec::new(),
            created_by_actor_id: actor_id,
            created_by_mask_id: None,
            created_at: now,
            left_count: 0,
            right_count: 0,
            skip_count: 0,
            twist_count: 0,
        };

        self.forks.insert_fork(&fork).await?;

        info!(
            fork_id = %fork.id,
            actor_id = %actor_id,
            lane = %fork.intent_lane,
            parent_fork_id = ?fork.parent_fork_id,
            "Fork created"
        );
        Ok(fork)
    }

    pub async fn get_fork(&self, id: Uuid) -> Result<Fork> {
        self.forks
            .get_fork(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("fork {} not found", id)))
    }

    /// Direct children, newest first
    pub async fn get_children(&self, parent_id: Uuid) -> Result<Vec<Fork>> {
        self.forks.get_children(parent_id).await
    }

    /// Record one interaction on an existing fork
    pub async fn record_interaction(
        &self,
        actor_id: Uuid,
        fork_id: Uuid,
        kind: &str,
        dwell_ms: Option<i32>,
    ) -> Result<Interaction> {
        let kind: InteractionKind = kind.parse()?;
        if matches!(dwell_ms, Some(ms) if ms < 0) {
            return Err(AppError::Validation(
                "dwell_ms must not be negative".to_string(),
            ));
        }
        if self.forks.get_fork(fork_id).await?.is_none() {
            return Err(AppError::NotFound(format!("fork {} not found", fork_id)));
        }

        let interaction = Interaction {
            id: Uuid::new_v4(),
            actor_id,
            fork_id,
            interaction_type: kind.as_str().to_string(),
            dwell_ms,
            created_at: Utc::now(),
        };
        self.interactions.insert_interaction(&interaction).await?;

        debug!(
            actor_id = %actor_id,
            fork_id = %fork_id,
            kind = %kind,
            "Interaction recorded"
        );
        Ok(interaction)
    }

    pub async fn report_fork(&self, actor_id: Uuid, fork_id: Uuid, reason: &str) -> Result<Report> {
        let reason: ReportReason = reason.parse()?;

        let report = Report {
            id: Uuid::new_v4(),
            actor_id,
            fork_id,
            reason: reason.as_str().to_string(),
            state: REPORT_STATE_PENDING.to_string(),
            created_at: Utc::now(),
        };
        self.forks.insert_report(&report).await?;

        info!(
            report_id = %report.id,
            fork_id = %fork_id,
            reason = reason.as_str(),
            "Fork reported"
        );
        Ok(report)
    }
}
