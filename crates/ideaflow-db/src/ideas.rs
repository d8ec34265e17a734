//! Database operations for the `ideas` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ideaflow_ideas::{IdeaCandidate, Rankable};

use crate::DbError;

const IDEA_COLUMNS: &str = "id, public_id, problem, description, category, reddit_url, \
     reddit_post_id, pain_score, validation_score, upvotes, reddit_upvotes, \
     reddit_comments, ai_analysis, analyzed, created_at, updated_at";

/// A row from the `ideas` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeaRow {
    pub id: i64,
    pub public_id: Uuid,
    pub problem: String,
    pub description: Option<String>,
    pub category: String,
    pub reddit_url: String,
    pub reddit_post_id: Option<String>,
    pub pain_score: i32,
    pub validation_score: i64,
    pub upvotes: i64,
    pub reddit_upvotes: i64,
    pub reddit_comments: i64,
    pub ai_analysis: Option<serde_json::Value>,
    pub analyzed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rankable for IdeaRow {
    fn pain_score(&self) -> i64 {
        i64::from(self.pain_score)
    }

    fn validation_score(&self) -> i64 {
        self.validation_score
    }

    fn upvotes(&self) -> i64 {
        self.upvotes
    }

    fn reddit_upvotes(&self) -> i64 {
        self.reddit_upvotes
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Insert a candidate unless its source URL is already stored.
///
/// Returns `Some(row)` for a fresh insert and `None` when the URL conflicts —
/// the uniqueness constraint makes the check-then-insert atomic, so a prior
/// record is always left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn insert_idea_if_absent(
    pool: &PgPool,
    candidate: &IdeaCandidate,
) -> Result<Option<IdeaRow>, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, IdeaRow>(&format!(
        "INSERT INTO ideas \
           (public_id, problem, description, category, reddit_url, reddit_post_id, \
            pain_score, validation_score, reddit_upvotes, reddit_comments) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (reddit_url) DO NOTHING \
         RETURNING {IDEA_COLUMNS}"
    ))
    .bind(public_id)
    .bind(&candidate.problem)
    .bind(candidate.description.as_deref())
    .bind(&candidate.category)
    .bind(&candidate.reddit_url)
    .bind(candidate.reddit_post_id.as_deref())
    .bind(candidate.pain_score)
    .bind(candidate.validation_score)
    .bind(candidate.reddit_upvotes)
    .bind(candidate.reddit_comments)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Whether any idea already claims this source URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn idea_exists(pool: &PgPool, reddit_url: &str) -> Result<bool, DbError> {
    Ok(sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM ideas WHERE reddit_url = $1)",
    )
    .bind(reddit_url)
    .fetch_one(pool)
    .await?)
}

/// List ideas in storage (insertion) order, optionally filtered by category.
///
/// The category filter is case-insensitive. No ranking happens here — ordering
/// by strategy is the engine's job.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_ideas(
    pool: &PgPool,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<IdeaRow>, DbError> {
    let rows = sqlx::query_as::<_, IdeaRow>(&format!(
        "SELECT {IDEA_COLUMNS} FROM ideas \
         WHERE ($1::TEXT IS NULL OR LOWER(category) = LOWER($1)) \
         ORDER BY id LIMIT $2"
    ))
    .bind(category)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch a single idea by its public id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_idea(pool: &PgPool, public_id: Uuid) -> Result<Option<IdeaRow>, DbError> {
    let row = sqlx::query_as::<_, IdeaRow>(&format!(
        "SELECT {IDEA_COLUMNS} FROM ideas WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Store an enrichment result and flag the idea as analyzed.
///
/// `analysis` is `None` when the enrichment attempt failed — the flag still
/// flips so the idea is not retried forever, but any earlier analysis is kept.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no idea has this public id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn set_idea_analysis(
    pool: &PgPool,
    public_id: Uuid,
    analysis: Option<&serde_json::Value>,
) -> Result<IdeaRow, DbError> {
    let row = sqlx::query_as::<_, IdeaRow>(&format!(
        "UPDATE ideas SET \
           ai_analysis = COALESCE($2, ai_analysis), \
           analyzed = TRUE, \
           updated_at = NOW() \
         WHERE public_id = $1 \
         RETURNING {IDEA_COLUMNS}"
    ))
    .bind(public_id)
    .bind(analysis)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str) -> IdeaCandidate {
        IdeaCandidate {
            problem: "I can't find a tool that tracks invoices".to_string(),
            description: Some("Chasing unpaid invoices takes hours every month.".to_string()),
            category: "Other".to_string(),
            reddit_url: url.to_string(),
            reddit_post_id: Some("abc123".to_string()),
            pain_score: 7,
            validation_score: 420,
            reddit_upvotes: 150,
            reddit_comments: 40,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn insert_then_conflict_returns_none(pool: PgPool) {
        let url = "https://reddit.com/r/test/comments/dup";

        let first = insert_idea_if_absent(&pool, &candidate(url))
            .await
            .expect("insert");
        let row = first.expect("first insert should create a row");
        assert_eq!(row.reddit_url, url);
        assert_eq!(row.category, "Other");
        assert_eq!(row.pain_score, 7);
        assert!(!row.analyzed);

        let second = insert_idea_if_absent(&pool, &candidate(url))
            .await
            .expect("conflict is not an error");
        assert!(second.is_none(), "duplicate URL must be a no-op skip");

        assert!(idea_exists(&pool, url).await.expect("exists"));
        let all = list_ideas(&pool, None, 50).await.expect("list");
        assert_eq!(all.len(), 1, "exactly one row per source URL");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_filters_category_case_insensitively(pool: PgPool) {
        let mut saas = candidate("https://reddit.com/r/test/comments/saas");
        saas.category = "SaaS".to_string();
        insert_idea_if_absent(&pool, &saas).await.expect("insert");
        insert_idea_if_absent(&pool, &candidate("https://reddit.com/r/test/comments/other"))
            .await
            .expect("insert");

        let filtered = list_ideas(&pool, Some("saas"), 50).await.expect("list");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].category, "SaaS");

        let all = list_ideas(&pool, None, 50).await.expect("list");
        assert_eq!(all.len(), 2);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_returns_rows_in_insertion_order(pool: PgPool) {
        for name in ["a", "b", "c"] {
            insert_idea_if_absent(
                &pool,
                &candidate(&format!("https://reddit.com/r/test/comments/{name}")),
            )
            .await
            .expect("insert");
        }

        let rows = list_ideas(&pool, None, 50).await.expect("list");
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted, "storage order is insertion order");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn set_idea_analysis_flags_and_stores_json(pool: PgPool) {
        let row = insert_idea_if_absent(&pool, &candidate("https://reddit.com/r/test/comments/x"))
            .await
            .expect("insert")
            .expect("created");

        let analysis = serde_json::json!({ "painLevel": 8, "marketSize": "Large" });
        let updated = set_idea_analysis(&pool, row.public_id, Some(&analysis))
            .await
            .expect("update");

        assert!(updated.analyzed);
        assert_eq!(updated.ai_analysis.expect("json")["painLevel"], 8);
        assert!(updated.updated_at >= row.updated_at);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn failed_enrichment_still_marks_analyzed(pool: PgPool) {
        let row = insert_idea_if_absent(&pool, &candidate("https://reddit.com/r/test/comments/y"))
            .await
            .expect("insert")
            .expect("created");

        let updated = set_idea_analysis(&pool, row.public_id, None)
            .await
            .expect("update");
        assert!(updated.analyzed);
        assert!(updated.ai_analysis.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn set_idea_analysis_unknown_id_is_not_found(pool: PgPool) {
        let result = set_idea_analysis(&pool, Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
