use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A binary-choice prompt with aggregated engagement counters.
///
/// Counters are computed from the interactions table on every read and are
/// never written back to the fork row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fork {
    pub id: Uuid,
    pub prompt: String,
    pub left_label: String,
    pub right_label: String,
    pub left_asset_id: Option<Uuid>,
    pub right_asset_id: Option<Uuid>,
    pub intent_lane: String,
    pub mood: Option<String>,
    pub energy: Option<String>,
    pub time_fit_s: Option<i32>,
    pub cognitive_load: Option<String>,
    pub parent_fork_id: Option<Uuid>,
    pub mutation_type: Option<String>,
    pub safety_age_gate: String,
    pub safety_sensitivity: String,
    pub safety_flags: Vec<String>,
    pub created_by_actor_id: Uuid,
    pub created_by_mask_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub left_count: i64,
    #[sqlx(default)]
    pub right_count: i64,
    #[sqlx(default)]
    pub skip_count: i64,
    #[sqlx(default)]
    pub twist_count: i64,
}

impl Fork {
    /// Left + right + skip; twists are tracked separately.
    pub fn decision_total(&self) -> i64 {
        self.left_count + self.right_count + self.skip_count
    }
}

/// Interaction kinds an actor can record against a fork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    SwipeLeft,
    SwipeRight,
    Skip,
    Twist,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::Skip => "skip",
            Self::Twist => "twist",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swipe_left" => Ok(Self::SwipeLeft),
            "swipe_right" => Ok(Self::SwipeRight),
            "skip" => Ok(Self::Skip),
            "twist" => Ok(Self::Twist),
            other => Err(AppError::Validation(format!(
                "invalid interaction type: {}",
                other
            ))),
        }
    }
}

/// An append-only record of an actor acting on a fork
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Interaction {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub fork_id: Uuid,
    /// Stored as the kind label; see [`InteractionKind::as_str`]
    pub interaction_type: String,
    pub dwell_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Ephemeral ranking preference for an actor.
///
/// `None` means "no preference" on that dimension, which disables both the
/// candidate filter and the matching bonus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub lane: Option<String>,
    #[serde(default)]
    pub energy: Option<String>,
}

impl Session {
    /// Build a session from raw request values; blank strings mean "unset".
    pub fn from_raw(lane: Option<&str>, energy: Option<&str>) -> Self {
        Self {
            lane: normalize(lane),
            energy: normalize(energy),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lane.is_none() && self.energy.is_none()
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Candidate filter derived from a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub lane: Option<String>,
    pub energy: Option<String>,
}

impl From<&Session> for CandidateFilter {
    fn from(session: &Session) -> Self {
        Self {
            lane: session.lane.clone(),
            energy: session.energy.clone(),
        }
    }
}

/// One page of ranked forks
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub forks: Vec<Fork>,
    pub next_cursor: Option<String>,
}

/// Lineage mutation applied when deriving a fork from its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationType {
    Flip,
    Reframe,
    Escalate,
    Specific,
    Opposite,
}

impl MutationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flip => "flip",
            Self::Reframe => "reframe",
            Self::Escalate => "escalate",
            Self::Specific => "specific",
            Self::Opposite => "opposite",
        }
    }
}

impl std::str::FromStr for MutationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flip" => Ok(Self::Flip),
            "reframe" => Ok(Self::Reframe),
            "escalate" => Ok(Self::Escalate),
            "specific" => Ok(Self::Specific),
            "opposite" => Ok(Self::Opposite),
            other => Err(AppError::Validation(format!("invalid mutation type: {}", other))),
        }
    }
}

/// Input for the creation flow
#[derive(Debug, Clone, Deserialize)]
pub struct CreateForkInput {
    pub prompt: String,
    pub left_label: String,
    pub right_label: String,
    pub intent_lane: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub energy: Option<String>,
    #[serde(default)]
    pub parent_fork_id: Option<Uuid>,
    #[serde(default)]
    pub mutation_type: Option<String>,
}

pub const PROMPT_MAX_LENGTH: usize = 90;
pub const LABEL_MAX_LENGTH: usize = 24;

impl CreateForkInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.prompt.trim().is_empty()
            || self.left_label.trim().is_empty()
            || self.right_label.trim().is_empty()
            || self.intent_lane.trim().is_empty()
        {
            return Err(AppError::Validation(
                "prompt, left_label, right_label, and intent_lane are required".to_string(),
            ));
        }
        if self.prompt.chars().count() > PROMPT_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "prompt must be {} characters or less",
                PROMPT_MAX_LENGTH
            )));
        }
        if self.left_label.chars().count() > LABEL_MAX_LENGTH
            || self.right_label.chars().count() > LABEL_MAX_LENGTH
        {
            return Err(AppError::Validation(format!(
                "labels must be {} characters or less",
                LABEL_MAX_LENGTH
            )));
        }
        self.mutation()?;
        Ok(())
    }

    /// Parsed mutation type; a blank value means none
    pub fn mutation(&self) -> Result<Option<MutationType>, AppError> {
        self.mutation_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::parse::<MutationType>)
            .transpose()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Inappropriate,
    Spam,
    Harassment,
    HateSpeech,
    Other,
}

impl ReportReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inappropriate => "inappropriate",
            Self::Spam => "spam",
            Self::Harassment => "harassment",
            Self::HateSpeech => "hate_speech",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for ReportReason {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inappropriate" => Ok(Self::Inappropriate),
            "spam" => Ok(Self::Spam),
            "harassment" => Ok(Self::Harassment),
            "hate_speech" => Ok(Self::HateSpeech),
            "other" => Ok(Self::Other),
            other => Err(AppError::Validation(format!("invalid report reason: {}", other))),
        }
    }
}

/// New reports always start out pending; moderation owns the other states.
pub const REPORT_STATE_PENDING: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Report {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub fork_id: Uuid,
    pub reason: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

/// Fork as rendered to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkResponse {
    pub id: Uuid,
    pub prompt: String,
    pub left_label: String,
    pub right_label: String,
    pub intent_lane: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_fork_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_type: Option<String>,
    pub left_count: i64,
    pub right_count: i64,
    pub skip_count: i64,
    pub twist_count: i64,
    pub safety_age_gate: String,
    pub safety_flags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Fork> for ForkResponse {
    fn from(fork: Fork) -> Self {
        Self {
            id: fork.id,
            prompt: fork.prompt,
            left_label: fork.left_label,
            right_label: fork.right_label,
            intent_lane: fork.intent_lane,
            mood: fork.mood,
            energy: fork.energy,
            parent_fork_id: fork.parent_fork_id,
            mutation_type: fork.mutation_type.filter(|m| !m.is_empty()),
            left_count: fork.left_count,
            right_count: fork.right_count,
            skip_count: fork.skip_count,
            twist_count: fork.twist_count,
            safety_age_gate: fork.safety_age_gate,
            safety_flags: fork.safety_flags,
            created_at: fork.created_at,
        }
    }
}

/// `GET /feed` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub forks: Vec<ForkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<FeedPage> for FeedResponse {
    fn from(page: FeedPage) -> Self {
        Self {
            forks: page.forks.into_iter().map(ForkResponse::from).collect(),
            next_cursor: page.next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(prompt: &str, left: &str, right: &str) -> CreateForkInput {
        CreateForkInput {
            prompt: prompt.to_string(),
            left_label: left.to_string(),
            right_label: right.to_string(),
            intent_lane: "debate".to_string(),
            mood: None,
            energy: None,
            parent_fork_id: None,
            mutation_type: None,
        }
    }

    #[test]
    fn test_session_blank_values_are_unset() {
        let session = Session::from_raw(Some(""), Some("  "));
        assert!(session.is_empty());

        let session = Session::from_raw(Some("debate"), None);
        assert_eq!(session.lane.as_deref(), Some("debate"));
        assert_eq!(session.energy, None);
    }

    #[test]
    fn test_interaction_kind_labels() {
        for kind in [
            InteractionKind::SwipeLeft,
            InteractionKind::SwipeRight,
            InteractionKind::Skip,
            InteractionKind::Twist,
        ] {
            assert_eq!(kind.as_str().parse::<InteractionKind>().unwrap(), kind);
        }
        assert!("like".parse::<InteractionKind>().is_err());
    }

    #[test]
    fn test_create_input_validation() {
        assert!(input("Cats or dogs?", "Cats", "Dogs").validate().is_ok());
        assert!(input("", "Cats", "Dogs").validate().is_err());
        assert!(input(&"x".repeat(91), "Cats", "Dogs").validate().is_err());
        assert!(input(&"x".repeat(90), "Cats", "Dogs").validate().is_ok());
        assert!(input("Cats or dogs?", &"y".repeat(25), "Dogs")
            .validate()
            .is_err());

        let mut bad_mutation = input("Cats or dogs?", "Cats", "Dogs");
        bad_mutation.mutation_type = Some("shuffle".to_string());
        assert!(bad_mutation.validate().is_err());
    }

    #[test]
    fn test_mutation_type_parsing() {
        let mut child = input("Cats or dogs?", "Cats", "Dogs");
        assert_eq!(child.mutation().unwrap(), None);

        child.mutation_type = Some(String::new());
        assert_eq!(child.mutation().unwrap(), None);

        child.mutation_type = Some("reframe".to_string());
        assert_eq!(child.mutation().unwrap(), Some(MutationType::Reframe));
        assert_eq!(MutationType::Reframe.as_str(), "reframe");
    }

    #[test]
    fn test_report_reason_parse() {
        assert_eq!(
            "hate_speech".parse::<ReportReason>().unwrap(),
            ReportReason::HateSpeech
        );
        assert!("rude".parse::<ReportReason>().is_err());
    }
}
