//! Service layer for fork-feed-service
//!
//! - feed: page assembly (history, candidates, ranking, cursor)
//! - ranking: pure scoring and ordering
//! - history: best-effort exclusion and frequency lookups
//! - rate_limit: trailing-window action ceiling
//! - fork: creation flow and plain writes

pub mod feed;
pub mod fork;
pub mod history;
pub mod ranking;
pub mod rate_limit;

pub use feed::FeedService;
pub use fork::ForkService;
pub use history::HistoryTracker;
pub use ranking::{rank_forks, score_fork};
pub use rate_limit::RateLimiter;
