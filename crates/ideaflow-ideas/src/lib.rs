//! Idea-scoring and deduplication engine for IdeaFlow.
//!
//! Turns raw scraped social posts into scored idea candidates: keyword-based
//! problem detection, pain/validation scoring heuristics, stable multi-strategy
//! ranking, and a sequential per-source ingestion orchestrator that dedupes
//! through the store's insert-if-absent contract.
//!
//! The engine owns no I/O of its own — post fetching and persistence sit
//! behind the [`PostSource`] and [`IdeaStore`] traits.

pub mod classifier;
pub mod error;
pub mod pipeline;
pub mod ranking;
pub mod scorer;
pub mod types;

pub use classifier::ProblemLexicon;
pub use error::PipelineError;
pub use pipeline::ingest;
pub use ranking::{rank, Rankable, SortStrategy};
pub use scorer::{pain_score, validation_score};
pub use types::{
    IdeaCandidate, IdeaStore, IngestOptions, IngestReport, InsertOutcome, PostSource, RawPost,
    SourceReport, TimeWindow,
};
