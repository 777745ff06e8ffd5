/// Fork Repository
///
/// Postgres access for forks, their aggregated counters and reports.
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::error;
use uuid::Uuid;

use super::{CandidateSource, ForkStore};
use crate::error::Result;
use crate::models::{CandidateFilter, Fork, Report};

/// Per-fork tallies computed from the interactions table at read time.
const FORK_COLUMNS_WITH_STATS: &str = r#"
    f.id, f.prompt, f.left_label, f.right_label, f.left_asset_id, f.right_asset_id,
    f.intent_lane, f.mood, f.energy, f.time_fit_s, f.cognitive_load,
    f.parent_fork_id, f.mutation_type, f.safety_age_gate, f.safety_sensitivity,
    f.safety_flags, f.created_by_actor_id, f.created_by_mask_id, f.created_at,
    stats.left_count, stats.right_count, stats.skip_count, stats.twist_count
"#;

const STATS_JOIN: &str = r#"
    LEFT JOIN LATERAL (
        SELECT
            COUNT(*) FILTER (WHERE i.interaction_type = 'swipe_left')  AS left_count,
            COUNT(*) FILTER (WHERE i.interaction_type = 'swipe_right') AS right_count,
            COUNT(*) FILTER (WHERE i.interaction_type = 'skip')        AS skip_count,
            COUNT(*) FILTER (WHERE i.interaction_type = 'twist')       AS twist_count
        FROM interactions i
        WHERE i.fork_id = f.id
    ) stats ON TRUE
"#;

#[derive(Clone)]
pub struct ForkRepository {
    pool: PgPool,
}

impl ForkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateSource for ForkRepository {
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        exclude: &HashSet<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Fork>> {
        let exclude_ids: Vec<Uuid> = exclude.iter().copied().collect();

        let query = format!(
            r#"
            SELECT {columns}
            FROM forks f
            {stats}
            WHERE ($1::text IS NULL OR f.intent_lane = $1)
              AND ($2::text IS NULL OR f.energy = $2)
              AND NOT (f.id = ANY($3::uuid[]))
            ORDER BY f.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            columns = FORK_COLUMNS_WITH_STATS,
            stats = STATS_JOIN,
        );

        let forks = sqlx::query_as::<_, Fork>(&query)
            .bind(filter.lane.as_deref())
            .bind(filter.energy.as_deref())
            .bind(&exclude_ids)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch feed candidates: {}", e);
                e
            })?;

        Ok(forks)
    }
}

#[async_trait]
impl ForkStore for ForkRepository {
    async fn insert_fork(&self, fork: &Fork) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO forks (
                id, prompt, left_label, right_label, left_asset_id, right_asset_id,
                intent_lane, mood, energy, time_fit_s, cognitive_load,
                parent_fork_id, mutation_type, safety_age_gate, safety_sensitivity,
                safety_flags, created_by_actor_id, created_by_mask_id, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19
            )
            "#,
        )
        .bind(fork.id)
        .bind(&fork.prompt)
        .bind(&fork.left_label)
        .bind(&fork.right_label)
        .bind(fork.left_asset_id)
        .bind(fork.right_asset_id)
        .bind(&fork.intent_lane)
        .bind(&fork.mood)
        .bind(&fork.energy)
        .bind(fork.time_fit_s)
        .bind(&fork.cognitive_load)
        .bind(fork.parent_fork_id)
        .bind(&fork.mutation_type)
        .bind(&fork.safety_age_gate)
        .bind(&fork.safety_sensitivity)
        .bind(&fork.safety_flags)
        .bind(fork.created_by_actor_id)
        .bind(fork.created_by_mask_id)
        .bind(fork.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_fork(&self, id: Uuid) -> Result<Option<Fork>> {
        let query = format!(
            r#"
            SELECT {columns}
            FROM forks f
            {stats}
            WHERE f.id = $1
            "#,
            columns = FORK_COLUMNS_WITH_STATS,
            stats = STATS_JOIN,
        );

        let fork = sqlx::query_as::<_, Fork>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(fork)
    }

    async fn get_children(&self, parent_id: Uuid) -> Result<Vec<Fork>> {
        let query = format!(
            r#"
            SELECT {columns}
            FROM forks f
            {stats}
            WHERE f.parent_fork_id = $1
            ORDER BY f.created_at DESC
            "#,
            columns = FORK_COLUMNS_WITH_STATS,
            stats = STATS_JOIN,
        );

        let forks = sqlx::query_as::<_, Fork>(&query)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(forks)
    }

    async fn insert_report(&self, report: &Report) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reports (id, actor_id, fork_id, reason, state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(report.id)
        .bind(report.actor_id)
        .bind(report.fork_id)
        .bind(&report.reason)
        .bind(&report.state)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
