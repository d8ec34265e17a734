//! Postgres-backed implementation of the engine's store contract.

use sqlx::PgPool;

use ideaflow_ideas::{IdeaCandidate, IdeaStore, InsertOutcome, PipelineError};

use crate::ideas::insert_idea_if_absent;

/// Adapts a [`PgPool`] to [`IdeaStore`] for the ingestion pipeline.
#[derive(Clone)]
pub struct PgIdeaStore {
    pool: PgPool,
}

impl PgIdeaStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IdeaStore for PgIdeaStore {
    async fn insert_if_absent(
        &self,
        candidate: &IdeaCandidate,
    ) -> Result<InsertOutcome, PipelineError> {
        match insert_idea_if_absent(&self.pool, candidate).await {
            Ok(Some(_)) => Ok(InsertOutcome::Inserted),
            Ok(None) => Ok(InsertOutcome::AlreadyExists),
            Err(e) => Err(PipelineError::Store(e.to_string())),
        }
    }
}
