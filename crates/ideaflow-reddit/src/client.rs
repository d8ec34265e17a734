//! Reddit API client (client-credentials OAuth).

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use ideaflow_ideas::{PipelineError, PostSource, RawPost, TimeWindow};

use crate::error::RedditError;
use crate::retry::retry_with_backoff;

const AUTH_BASE_URL: &str = "https://www.reddit.com/";
const API_BASE_URL: &str = "https://oauth.reddit.com/";

/// Client-credentials for the Reddit script app.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

/// Raw post payload. Numeric fields default to zero when absent — a missing
/// count is never an error.
#[derive(Debug, Deserialize)]
struct PostData {
    #[serde(default)]
    id: String,
    title: Option<String>,
    #[serde(default)]
    selftext: String,
    permalink: Option<String>,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: f64,
    subreddit: Option<String>,
}

/// Reddit API client with a valid access token.
pub struct RedditClient {
    client: reqwest::Client,
    token: String,
    user_agent: String,
    api_base: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RedditClient {
    /// Create a client against the production Reddit endpoints, exchanging
    /// client credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`RedditError::Auth`] if the token exchange is rejected, or
    /// [`RedditError::Http`] on transport failure.
    pub async fn new(
        credentials: &RedditCredentials,
        timeout_secs: u64,
    ) -> Result<Self, RedditError> {
        Self::with_base_urls(credentials, timeout_secs, AUTH_BASE_URL, API_BASE_URL).await
    }

    /// Create a client with custom auth/API base URLs (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`RedditClient::new`], plus
    /// [`RedditError::Auth`] if a base URL does not parse.
    pub async fn with_base_urls(
        credentials: &RedditCredentials,
        timeout_secs: u64,
        auth_base: &str,
        api_base: &str,
    ) -> Result<Self, RedditError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        // Normalise: exactly one trailing slash so path joins land under the
        // root rather than replacing the last segment.
        let auth_base = parse_base(auth_base)?;
        let api_base = parse_base(api_base)?;

        let token = Self::fetch_token(&client, credentials, &auth_base).await?;

        Ok(Self {
            client,
            token,
            user_agent: credentials.user_agent.clone(),
            api_base,
            max_retries: 3,
            backoff_base_ms: 1_000,
        })
    }

    /// Override the retry policy (defaults: 3 retries, 1 s base back-off).
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    async fn fetch_token(
        client: &reqwest::Client,
        credentials: &RedditCredentials,
        auth_base: &Url,
    ) -> Result<String, RedditError> {
        let url = auth_base
            .join("api/v1/access_token")
            .map_err(|e| RedditError::Auth(format!("invalid token URL: {e}")))?;

        let response = client
            .post(url)
            .header("User-Agent", &credentials.user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RedditError::Auth(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| RedditError::Auth(format!("token parse error: {e}")))?;

        Ok(token_resp.access_token)
    }

    /// Fetch up to `limit` top posts for a subreddit over `window`.
    ///
    /// Transient failures (network, 429, 5xx) are retried with back-off;
    /// posts missing a title or permalink are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RedditError`] once retries are exhausted or on a
    /// non-retriable failure.
    pub async fn fetch_top_posts(
        &self,
        subreddit: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<RawPost>, RedditError> {
        let listing = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.fetch_top_listing(subreddit, window, limit)
        })
        .await?;

        let posts = listing
            .data
            .children
            .iter()
            .filter_map(|post| to_raw_post(&post.data, subreddit))
            .collect::<Vec<_>>();

        tracing::debug!(
            subreddit,
            window = %window,
            fetched = posts.len(),
            "collected top posts"
        );

        Ok(posts)
    }

    async fn fetch_top_listing(
        &self,
        subreddit: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Listing, RedditError> {
        let context = format!("r/{subreddit} top");
        let url = self
            .api_base
            .join(&format!("r/{subreddit}/top"))
            .map_err(|e| RedditError::Auth(format!("invalid subreddit '{subreddit}': {e}")))?;

        let params: Vec<(&str, String)> = vec![
            ("t", window.as_str().to_string()),
            ("limit", limit.to_string()),
        ];

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", &self.user_agent)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RedditError::UnexpectedStatus { status, context });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| RedditError::Deserialize {
            context,
            source: e,
        })
    }
}

fn parse_base(base: &str) -> Result<Url, RedditError> {
    let normalised = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| RedditError::Auth(format!("invalid base URL '{base}': {e}")))
}

/// Adapt one listing entry into the engine's post shape.
///
/// Returns `None` when the entry is unusable: missing title or permalink.
/// `[deleted]`/`[removed]` bodies are blanked rather than dropped — the title
/// may still describe a problem.
#[allow(clippy::cast_possible_truncation)]
fn to_raw_post(post: &PostData, fallback_source: &str) -> Option<RawPost> {
    let title = post
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();
    let permalink = post.permalink.as_deref().filter(|p| !p.is_empty())?;

    let body = match post.selftext.as_str() {
        "[deleted]" | "[removed]" => String::new(),
        text => text.to_string(),
    };

    Some(RawPost {
        id: post.id.clone(),
        title,
        body,
        url: format!("https://reddit.com{permalink}"),
        upvotes: post.ups,
        comments: post.num_comments,
        created_utc: post.created_utc as i64,
        source: post
            .subreddit
            .clone()
            .unwrap_or_else(|| fallback_source.to_string()),
    })
}

impl PostSource for RedditClient {
    async fn top_posts(
        &self,
        source: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<RawPost>, PipelineError> {
        self.fetch_top_posts(source, window, limit)
            .await
            .map_err(|e| PipelineError::Source(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_data(json: serde_json::Value) -> PostData {
        serde_json::from_value(json).expect("post data should deserialize")
    }

    #[test]
    fn missing_numeric_fields_default_to_zero() {
        let post = post_data(serde_json::json!({
            "id": "abc",
            "title": "A title",
            "permalink": "/r/test/comments/abc"
        }));
        let raw = to_raw_post(&post, "test").expect("usable post");
        assert_eq!(raw.upvotes, 0);
        assert_eq!(raw.comments, 0);
        assert_eq!(raw.created_utc, 0);
    }

    #[test]
    fn post_without_title_is_skipped() {
        let post = post_data(serde_json::json!({
            "id": "abc",
            "permalink": "/r/test/comments/abc"
        }));
        assert!(to_raw_post(&post, "test").is_none());
    }

    #[test]
    fn post_without_permalink_is_skipped() {
        let post = post_data(serde_json::json!({
            "id": "abc",
            "title": "A title"
        }));
        assert!(to_raw_post(&post, "test").is_none());
    }

    #[test]
    fn removed_body_is_blanked_not_dropped() {
        let post = post_data(serde_json::json!({
            "id": "abc",
            "title": "A title",
            "selftext": "[removed]",
            "permalink": "/r/test/comments/abc"
        }));
        let raw = to_raw_post(&post, "test").expect("usable post");
        assert!(raw.body.is_empty());
    }

    #[test]
    fn permalink_becomes_full_reddit_url() {
        let post = post_data(serde_json::json!({
            "id": "abc",
            "title": "A title",
            "permalink": "/r/SaaS/comments/abc/slug/",
            "subreddit": "SaaS"
        }));
        let raw = to_raw_post(&post, "fallback").expect("usable post");
        assert_eq!(raw.url, "https://reddit.com/r/SaaS/comments/abc/slug/");
        assert_eq!(raw.source, "SaaS");
    }
}
