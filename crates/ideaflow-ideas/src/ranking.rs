//! Multi-strategy idea ranking.
//!
//! Pure and side-effect free: the same `rank` call serves the API listing
//! path and the CLI. Sorting is stable, so equal keys retain the input
//! (storage) order — the only ordering guarantee the read path makes.

use std::cmp::Reverse;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ranking strategy for idea listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    #[default]
    Trending,
    Newest,
    Pain,
    Validation,
}

impl SortStrategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortStrategy::Trending => "trending",
            SortStrategy::Newest => "newest",
            SortStrategy::Pain => "pain",
            SortStrategy::Validation => "validation",
        }
    }
}

impl std::fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(SortStrategy::Trending),
            "newest" => Ok(SortStrategy::Newest),
            "pain" => Ok(SortStrategy::Pain),
            "validation" => Ok(SortStrategy::Validation),
            other => Err(format!("unknown sort strategy: '{other}'")),
        }
    }
}

/// The fields ranking needs from an idea record.
pub trait Rankable {
    fn pain_score(&self) -> i64;
    fn validation_score(&self) -> i64;
    /// Platform-local engagement, distinct from the originating source's votes.
    fn upvotes(&self) -> i64;
    fn reddit_upvotes(&self) -> i64;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Order `ideas` descending by the strategy's key. Stable: equal keys keep
/// their input order.
///
/// The trending key deliberately re-weights raw engagement ten-fold on top of
/// the validation score's own engagement weighting; that duplication matches
/// the shipped behavior and must not be "harmonized".
pub fn rank<T: Rankable>(ideas: &mut [T], strategy: SortStrategy) {
    match strategy {
        SortStrategy::Trending => ideas.sort_by_key(|i| Reverse(trending_key(i))),
        SortStrategy::Newest => ideas.sort_by_key(|i| Reverse(i.created_at())),
        SortStrategy::Pain => ideas.sort_by_key(|i| Reverse(i.pain_score())),
        SortStrategy::Validation => ideas.sort_by_key(|i| Reverse(i.validation_score())),
    }
}

fn trending_key<T: Rankable>(idea: &T) -> i64 {
    idea.validation_score() + (idea.upvotes() + idea.reddit_upvotes()) * 10
}
