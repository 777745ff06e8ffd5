use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use super::InteractionStore;
use crate::error::Result;
use crate::models::{Interaction, InteractionKind};

/// Repository for the append-only interactions table
#[derive(Clone)]
pub struct InteractionRepository {
    pool: PgPool,
}

impl InteractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionStore for InteractionRepository {
    async fn seen_ids(&self, actor_id: Uuid, since: DateTime<Utc>) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT fork_id
            FROM interactions
            WHERE actor_id = $1 AND created_at >= $2
            "#,
        )
        .bind(actor_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn recent_interactions(&self, actor_id: Uuid, limit: i64) -> Result<Vec<Interaction>> {
        let interactions = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT id, actor_id, fork_id, interaction_type, dwell_ms, created_at
            FROM interactions
            WHERE actor_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(actor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(interactions)
    }

    async fn count_actions(
        &self,
        actor_id: Uuid,
        kind: InteractionKind,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM interactions
            WHERE actor_id = $1 AND interaction_type = $2 AND created_at >= $3
            "#,
        )
        .bind(actor_id)
        .bind(kind.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interactions (id, actor_id, fork_id, interaction_type, dwell_ms, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(interaction.id)
        .bind(interaction.actor_id)
        .bind(interaction.fork_id)
        .bind(&interaction.interaction_type)
        .bind(interaction.dwell_ms)
        .bind(interaction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
