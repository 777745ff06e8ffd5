//! Fork ranking
//!
//! Every candidate is scored independently. All terms are additive and start
//! from zero:
//! - Intent match: +40 when the session lane equals the fork lane
//! - Energy match: +20 when the session energy equals the fork energy
//! - Freshness: up to +15, decaying linearly to 0 over 24 hours
//! - Skip penalty: up to -10, proportional to the skip share of decisions
//! - Engagement bonus: up to +5 once a fork has more than 10 decisions
//! - Diversity bonus: +10 while the history frequency for the fork lane is below 5
//! - Twist bonus: +5 per twist, capped at 5 twists
//!
//! The diversity map is keyed by interaction kind ("skip", "twist") but is
//! looked up with the fork's lane ("debate"). The two vocabularies never
//! overlap in practice, so the bonus is close to universal.
//!
//! Sorting is stable: equal scores keep the store's recency order.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

use crate::metrics;
use crate::models::{Fork, Session};

pub const LANE_MATCH_WEIGHT: f64 = 40.0;
pub const ENERGY_MATCH_WEIGHT: f64 = 20.0;
pub const FRESHNESS_MAX: f64 = 15.0;
pub const FRESHNESS_DECAY_HOURS: f64 = 24.0;
pub const SKIP_PENALTY_MAX: f64 = 10.0;
pub const ENGAGEMENT_BONUS_MAX: f64 = 5.0;
pub const ENGAGEMENT_MIN_DECISIONS: i64 = 10;
pub const DIVERSITY_BONUS: f64 = 10.0;
pub const DIVERSITY_SEEN_THRESHOLD: usize = 5;
pub const TWIST_BONUS_PER: f64 = 5.0;
pub const TWIST_BONUS_CAP: i64 = 5;

/// Score and sort candidates, highest first
pub fn rank_forks(
    forks: Vec<Fork>,
    session: &Session,
    kind_freq: &HashMap<String, usize>,
    now: DateTime<Utc>,
) -> Vec<Fork> {
    let started = Instant::now();

    let mut scored: Vec<(Fork, f64)> = forks
        .into_iter()
        .map(|fork| {
            let score = score_fork(&fork, session, kind_freq, now);
            (fork, score)
        })
        .collect();

    // sort_by is stable, so ties keep recency order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    metrics::observe_ranking_duration(started.elapsed());
    debug!("Ranked {} candidates", scored.len());

    scored.into_iter().map(|(fork, _)| fork).collect()
}

/// Total score for one candidate (higher is better)
pub fn score_fork(
    fork: &Fork,
    session: &Session,
    kind_freq: &HashMap<String, usize>,
    now: DateTime<Utc>,
) -> f64 {
    intent_match(fork, session)
        + energy_match(fork, session)
        + freshness(fork.created_at, now)
        - skip_penalty(fork)
        + engagement_bonus(fork)
        + diversity_bonus(fork, kind_freq)
        + twist_bonus(fork)
}

fn intent_match(fork: &Fork, session: &Session) -> f64 {
    match session.lane.as_deref() {
        Some(lane) if lane == fork.intent_lane => LANE_MATCH_WEIGHT,
        _ => 0.0,
    }
}

fn energy_match(fork: &Fork, session: &Session) -> f64 {
    match (session.energy.as_deref(), fork.energy.as_deref()) {
        (Some(wanted), Some(actual)) if wanted == actual => ENERGY_MATCH_WEIGHT,
        _ => 0.0,
    }
}

/// Linear decay in [0, 15]; future timestamps count as brand new
pub fn freshness(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = ((now - created_at).num_milliseconds().max(0) as f64) / 3_600_000.0;
    FRESHNESS_MAX * (1.0 - age_hours / FRESHNESS_DECAY_HOURS).max(0.0)
}

/// In [0, 10]; zero when the fork has no decisions yet
pub fn skip_penalty(fork: &Fork) -> f64 {
    let total = fork.decision_total();
    if total <= 0 {
        return 0.0;
    }
    SKIP_PENALTY_MAX * (fork.skip_count as f64 / total as f64)
}

pub fn engagement_bonus(fork: &Fork) -> f64 {
    let total = fork.decision_total();
    if total <= ENGAGEMENT_MIN_DECISIONS {
        return 0.0;
    }
    ENGAGEMENT_BONUS_MAX * ((fork.left_count + fork.right_count) as f64 / total as f64)
}

fn diversity_bonus(fork: &Fork, kind_freq: &HashMap<String, usize>) -> f64 {
    let seen = kind_freq.get(&fork.intent_lane).copied().unwrap_or(0);
    if seen < DIVERSITY_SEEN_THRESHOLD {
        DIVERSITY_BONUS
    } else {
        0.0
    }
}

fn twist_bonus(fork: &Fork) -> f64 {
    TWIST_BONUS_PER * fork.twist_count.clamp(0, TWIST_BONUS_CAP) as f64
}
