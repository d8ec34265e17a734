//! Ingestion orchestration.
//!
//! Walks the configured sources strictly in sequence — the source API is
//! rate-limited, so the loop trades latency for a bounded request rate — and
//! runs each post through filter → classifier → scorer → insert-if-absent.
//! A fetch failure is recorded in that source's report entry and never aborts
//! the remaining sources; a store failure is fatal to the run.

use crate::classifier::ProblemLexicon;
use crate::error::PipelineError;
use crate::scorer::{pain_score, validation_score};
use crate::types::{
    IdeaCandidate, IdeaStore, IngestOptions, IngestReport, InsertOutcome, PostSource, RawPost,
    SourceReport,
};

/// Run one ingestion pass over `sources`.
///
/// Returns a best-effort summary: per-source fetch failures are folded into
/// the report, never raised.
///
/// # Errors
///
/// Returns [`PipelineError::Store`] if persistence fails — storage
/// unavailability ends the run; any retry belongs to the caller's scheduler.
pub async fn ingest<S, R>(
    source_client: &S,
    store: &R,
    lexicon: &ProblemLexicon,
    sources: &[String],
    options: &IngestOptions,
) -> Result<IngestReport, PipelineError>
where
    S: PostSource,
    R: IdeaStore,
{
    let mut created = 0usize;
    let mut per_source = Vec::with_capacity(sources.len());

    for (index, source) in sources.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(options.inter_source_delay).await;
        }

        let posts = match source_client
            .top_posts(source, options.time_window, options.post_limit)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(source, error = %e, "post fetch failed; continuing with next source");
                per_source.push(SourceReport {
                    source: source.clone(),
                    found: 0,
                    succeeded: 0,
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let mut found = 0usize;
        let mut succeeded = 0usize;

        for post in &posts {
            if !is_candidate(post, lexicon, options) {
                continue;
            }
            found += 1;

            let candidate = build_candidate(post);
            match store.insert_if_absent(&candidate).await? {
                InsertOutcome::Inserted => {
                    succeeded += 1;
                    created += 1;
                }
                InsertOutcome::AlreadyExists => {
                    tracing::debug!(url = %candidate.reddit_url, "idea already stored; skipping");
                }
            }
        }

        tracing::info!(source, found, succeeded, "source ingested");
        per_source.push(SourceReport {
            source: source.clone(),
            found,
            succeeded,
            error: None,
        });
    }

    Ok(IngestReport {
        created,
        per_source,
    })
}

/// Filter + classification gate.
///
/// A post survives when it clears the upvote floor, carries a non-trivial
/// body, has the fields a candidate needs, and reads like a problem.
fn is_candidate(post: &RawPost, lexicon: &ProblemLexicon, options: &IngestOptions) -> bool {
    if post.title.trim().is_empty() || post.url.trim().is_empty() {
        // Malformed post; dropped silently and counted as not inserted.
        tracing::debug!(id = %post.id, "dropping post with missing title or permalink");
        return false;
    }

    post.upvotes >= options.min_upvotes
        && post.body.chars().count() > options.min_body_len
        && lexicon.is_problem(&post.title, &post.body)
}

fn build_candidate(post: &RawPost) -> IdeaCandidate {
    IdeaCandidate {
        problem: post.title.clone(),
        description: if post.body.is_empty() {
            None
        } else {
            Some(post.body.clone())
        },
        category: "Other".to_string(),
        reddit_url: post.url.clone(),
        reddit_post_id: Some(post.id.clone()),
        pain_score: pain_score(post),
        validation_score: validation_score(post),
        reddit_upvotes: post.upvotes,
        reddit_comments: post.comments,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::types::TimeWindow;

    struct StubSource {
        posts: HashMap<String, Vec<RawPost>>,
        failing: HashSet<String>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                posts: HashMap::new(),
                failing: HashSet::new(),
            }
        }

        fn with_posts(mut self, source: &str, posts: Vec<RawPost>) -> Self {
            self.posts.insert(source.to_string(), posts);
            self
        }

        fn with_failure(mut self, source: &str) -> Self {
            self.failing.insert(source.to_string());
            self
        }
    }

    impl PostSource for StubSource {
        async fn top_posts(
            &self,
            source: &str,
            _window: TimeWindow,
            _limit: u32,
        ) -> Result<Vec<RawPost>, PipelineError> {
            if self.failing.contains(source) {
                return Err(PipelineError::Source(format!("{source}: 503 unavailable")));
            }
            Ok(self.posts.get(source).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        ideas: Mutex<Vec<IdeaCandidate>>,
    }

    impl MemoryStore {
        fn urls(&self) -> Vec<String> {
            self.ideas
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.reddit_url.clone())
                .collect()
        }

        fn len(&self) -> usize {
            self.ideas.lock().unwrap().len()
        }
    }

    impl IdeaStore for MemoryStore {
        async fn insert_if_absent(
            &self,
            candidate: &IdeaCandidate,
        ) -> Result<InsertOutcome, PipelineError> {
            let mut ideas = self.ideas.lock().unwrap();
            if ideas.iter().any(|i| i.reddit_url == candidate.reddit_url) {
                return Ok(InsertOutcome::AlreadyExists);
            }
            ideas.push(candidate.clone());
            Ok(InsertOutcome::Inserted)
        }
    }

    struct BrokenStore;

    impl IdeaStore for BrokenStore {
        async fn insert_if_absent(
            &self,
            _candidate: &IdeaCandidate,
        ) -> Result<InsertOutcome, PipelineError> {
            Err(PipelineError::Store("connection refused".to_string()))
        }
    }

    fn problem_post(id: &str, upvotes: i64, comments: i64) -> RawPost {
        RawPost {
            id: id.to_string(),
            title: "I can't find a tool that tracks invoices".to_string(),
            body: "Every month I waste hours chasing unpaid invoices across three different apps."
                .to_string(),
            url: format!("https://reddit.com/r/test/comments/{id}"),
            upvotes,
            comments,
            created_utc: 1_700_000_000,
            source: "test".to_string(),
        }
    }

    fn options() -> IngestOptions {
        IngestOptions {
            inter_source_delay: Duration::ZERO,
            ..IngestOptions::default()
        }
    }

    fn sources(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn ingest_filters_then_inserts_survivors() {
        let below_floor = problem_post("low", 2, 0);
        let short_body = RawPost {
            body: "too short".to_string(),
            ..problem_post("short", 50, 5)
        };
        let off_topic = RawPost {
            title: "Show off your logo designs".to_string(),
            body: "Here are some brand refreshes we shipped this quarter for happy clients."
                .to_string(),
            ..problem_post("logo", 50, 5)
        };
        let keeper = problem_post("keeper", 50, 5);

        let source = StubSource::new().with_posts(
            "Entrepreneur",
            vec![below_floor, short_body, off_topic, keeper],
        );
        let store = MemoryStore::default();

        let report = ingest(
            &source,
            &store,
            &ProblemLexicon::default(),
            &sources(&["Entrepreneur"]),
            &options(),
        )
        .await
        .expect("run should succeed");

        assert_eq!(report.created, 1);
        assert_eq!(report.per_source.len(), 1);
        assert_eq!(report.per_source[0].found, 1);
        assert_eq!(report.per_source[0].succeeded, 1);
        assert!(report.per_source[0].error.is_none());
        assert_eq!(
            store.urls(),
            vec!["https://reddit.com/r/test/comments/keeper"]
        );
    }

    #[tokio::test]
    async fn ingest_twice_creates_nothing_new() {
        let source =
            StubSource::new().with_posts("SaaS", vec![problem_post("a", 40, 3), problem_post("b", 90, 12)]);
        let store = MemoryStore::default();
        let lexicon = ProblemLexicon::default();
        let srcs = sources(&["SaaS"]);

        let first = ingest(&source, &store, &lexicon, &srcs, &options())
            .await
            .expect("first run");
        assert_eq!(first.created, 2);

        let second = ingest(&source, &store, &lexicon, &srcs, &options())
            .await
            .expect("second run");
        assert_eq!(second.created, 0, "re-ingest must not create duplicates");
        assert_eq!(second.per_source[0].found, 2);
        assert_eq!(second.per_source[0].succeeded, 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_recorded_and_later_sources_still_run() {
        let source = StubSource::new()
            .with_failure("Entrepreneur")
            .with_posts("SideProject", vec![problem_post("ok", 40, 3)]);
        let store = MemoryStore::default();

        let report = ingest(
            &source,
            &store,
            &ProblemLexicon::default(),
            &sources(&["Entrepreneur", "SideProject"]),
            &options(),
        )
        .await
        .expect("partial failure must not abort the run");

        assert_eq!(report.created, 1);
        assert_eq!(report.per_source.len(), 2);
        let failed = &report.per_source[0];
        assert_eq!(failed.source, "Entrepreneur");
        assert_eq!(failed.found, 0);
        assert!(failed.error.as_deref().unwrap().contains("503"));
        let ok = &report.per_source[1];
        assert_eq!(ok.source, "SideProject");
        assert_eq!(ok.succeeded, 1);
    }

    #[tokio::test]
    async fn store_failure_is_fatal() {
        let source = StubSource::new().with_posts("SaaS", vec![problem_post("a", 40, 3)]);

        let result = ingest(
            &source,
            &BrokenStore,
            &ProblemLexicon::default(),
            &sources(&["SaaS"]),
            &options(),
        )
        .await;

        assert!(matches!(result, Err(PipelineError::Store(_))));
    }

    #[tokio::test]
    async fn concurrent_runs_store_a_single_record_per_url() {
        let source = StubSource::new().with_posts("SaaS", vec![problem_post("same", 40, 3)]);
        let store = MemoryStore::default();
        let lexicon = ProblemLexicon::default();
        let srcs = sources(&["SaaS"]);
        let opts = options();

        let (a, b) = tokio::join!(
            ingest(&source, &store, &lexicon, &srcs, &opts),
            ingest(&source, &store, &lexicon, &srcs, &opts),
        );

        assert_eq!(
            a.expect("run a").created + b.expect("run b").created,
            1,
            "exactly one run may win the insert"
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sources_are_paced_by_the_inter_source_delay() {
        let source = StubSource::new()
            .with_posts("a", vec![])
            .with_posts("b", vec![])
            .with_posts("c", vec![]);
        let store = MemoryStore::default();
        let opts = IngestOptions {
            inter_source_delay: Duration::from_secs(2),
            ..IngestOptions::default()
        };

        let started = tokio::time::Instant::now();
        ingest(
            &source,
            &store,
            &ProblemLexicon::default(),
            &sources(&["a", "b", "c"]),
            &opts,
        )
        .await
        .expect("run");

        // Two gaps between three sources; no delay after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn malformed_posts_are_dropped_silently() {
        let no_title = RawPost {
            title: "  ".to_string(),
            ..problem_post("untitled", 40, 3)
        };
        let no_url = RawPost {
            url: String::new(),
            ..problem_post("unlinked", 40, 3)
        };
        let source = StubSource::new().with_posts("SaaS", vec![no_title, no_url]);
        let store = MemoryStore::default();

        let report = ingest(
            &source,
            &store,
            &ProblemLexicon::default(),
            &sources(&["SaaS"]),
            &options(),
        )
        .await
        .expect("run");

        assert_eq!(report.created, 0);
        assert_eq!(report.per_source[0].found, 0);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn candidate_carries_scores_and_default_category() {
        let source = StubSource::new().with_posts("SaaS", vec![problem_post("a", 150, 40)]);
        let store = MemoryStore::default();

        ingest(
            &source,
            &store,
            &ProblemLexicon::default(),
            &sources(&["SaaS"]),
            &options(),
        )
        .await
        .expect("run");

        let ideas = store.ideas.lock().unwrap();
        let idea = &ideas[0];
        assert_eq!(idea.category, "Other");
        assert_eq!(idea.pain_score, 7);
        assert_eq!(idea.validation_score, 2 * 150 + 3 * 40);
        assert_eq!(idea.reddit_upvotes, 150);
        assert_eq!(idea.reddit_comments, 40);
        assert_eq!(idea.reddit_post_id.as_deref(), Some("a"));
        assert!(idea.description.is_some());
    }
}
