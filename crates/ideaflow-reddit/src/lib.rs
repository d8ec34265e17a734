//! Reddit post source for IdeaFlow.
//!
//! Exchanges client credentials for an OAuth token, fetches top posts per
//! subreddit with bounded retries on transient failures, and adapts the
//! listing payload into the engine's [`ideaflow_ideas::RawPost`].

mod client;
mod error;
mod retry;

pub use client::{RedditClient, RedditCredentials};
pub use error::RedditError;
