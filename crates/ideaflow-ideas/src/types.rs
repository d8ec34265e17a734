use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A post as fetched from the external source. Ephemeral — never persisted as-is.
#[derive(Debug, Clone)]
pub struct RawPost {
    /// Source-assigned post identifier.
    pub id: String,
    pub title: String,
    /// Post body text. May be empty.
    pub body: String,
    /// Permalink into the source platform. Becomes the idempotency key.
    pub url: String,
    pub upvotes: i64,
    pub comments: i64,
    /// Creation time as a unix timestamp.
    pub created_utc: i64,
    /// Source-category label (subreddit name).
    pub source: String,
}

/// Time window passed to the post source when fetching top posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeWindow {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(TimeWindow::Hour),
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            "year" => Ok(TimeWindow::Year),
            "all" => Ok(TimeWindow::All),
            other => Err(format!("unknown time window: '{other}'")),
        }
    }
}

/// A classified, scored candidate ready for the idempotent insert.
#[derive(Debug, Clone, Serialize)]
pub struct IdeaCandidate {
    /// Problem statement, taken from the post title.
    pub problem: String,
    pub description: Option<String>,
    /// Free-text category label; `"Other"` when the source provides none.
    pub category: String,
    /// Idempotency key: the source permalink.
    pub reddit_url: String,
    pub reddit_post_id: Option<String>,
    pub pain_score: i32,
    pub validation_score: i64,
    pub reddit_upvotes: i64,
    pub reddit_comments: i64,
}

/// Outcome of an insert-if-absent attempt. A conflict on the source URL is
/// an expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Options controlling one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub time_window: TimeWindow,
    /// Max posts requested per source.
    pub post_limit: u32,
    /// Posts below this upvote count are discarded before classification.
    pub min_upvotes: i64,
    /// Posts whose body is this many characters or fewer are discarded.
    pub min_body_len: usize,
    /// Pause between sources, to stay under the source API's rate ceiling.
    pub inter_source_delay: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            time_window: TimeWindow::Week,
            post_limit: 25,
            min_upvotes: 10,
            min_body_len: 50,
            inter_source_delay: Duration::from_secs(2),
        }
    }
}

/// Per-source slice of an ingestion report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    /// Candidates that survived filtering and classification.
    pub found: usize,
    /// Newly inserted ideas (conflicts are skips, not failures).
    pub succeeded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Best-effort summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub created: usize,
    pub per_source: Vec<SourceReport>,
}

/// External post source (e.g. the Reddit API client).
pub trait PostSource {
    /// Fetch up to `limit` top posts for `source` over `window`.
    fn top_posts(
        &self,
        source: &str,
        window: TimeWindow,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<RawPost>, PipelineError>> + Send;
}

/// Idea persistence with an atomic insert-if-absent contract keyed on the
/// source URL. Implementations must treat a uniqueness conflict as
/// [`InsertOutcome::AlreadyExists`], never as an error.
pub trait IdeaStore {
    fn insert_if_absent(
        &self,
        candidate: &IdeaCandidate,
    ) -> impl Future<Output = Result<InsertOutcome, PipelineError>> + Send;
}
