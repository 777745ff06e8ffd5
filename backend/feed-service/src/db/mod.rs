//! Persistent store seams
//!
//! The feed engine only talks to these traits. `ForkRepository` and
//! `InteractionRepository` are the Postgres implementations; tests plug in
//! mocks or in-memory fakes.

pub mod fork_repo;
pub mod interaction_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CandidateFilter, Fork, Interaction, InteractionKind, Report};

pub use fork_repo::ForkRepository;
pub use interaction_repo::InteractionRepository;

/// Supplies ranking candidates in recency order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Forks matching `filter`, minus `exclude`, newest first, with counters
    /// aggregated over every interaction recorded against each fork.
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        exclude: &HashSet<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Fork>>;
}

/// Fork reads and writes outside of feed generation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForkStore: Send + Sync {
    async fn insert_fork(&self, fork: &Fork) -> Result<()>;
    async fn get_fork(&self, id: Uuid) -> Result<Option<Fork>>;
    async fn get_children(&self, parent_id: Uuid) -> Result<Vec<Fork>>;
    async fn insert_report(&self, report: &Report) -> Result<()>;
}

/// Reads and appends over the interactions table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Distinct fork ids the actor interacted with at or after `since`
    async fn seen_ids(&self, actor_id: Uuid, since: DateTime<Utc>) -> Result<HashSet<Uuid>>;

    /// Most recent interactions first
    async fn recent_interactions(&self, actor_id: Uuid, limit: i64) -> Result<Vec<Interaction>>;

    /// Number of `kind` actions by the actor at or after `since`
    async fn count_actions(
        &self,
        actor_id: Uuid,
        kind: InteractionKind,
        since: DateTime<Utc>,
    ) -> Result<i64>;

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()>;
}
