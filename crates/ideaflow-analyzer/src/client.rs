//! HTTP client for the Anthropic Messages API.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::AnalyzerError;
use crate::types::AiAnalysis;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/";
const MODEL: &str = "claude-3-5-sonnet-20241022";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2_000;

/// Messages API response envelope — only the pieces we read.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for idea enrichment calls.
pub struct AnalyzerClient {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl AnalyzerClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, AnalyzerError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] on client construction failure or
    /// [`AnalyzerError::UnexpectedResponse`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnalyzerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            AnalyzerError::UnexpectedResponse(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Ask the model for a structured business analysis of one idea.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError`] on transport failure, a non-2xx status, a
    /// reply without a text block, or a reply whose JSON does not match
    /// [`AiAnalysis`].
    pub async fn analyze_idea(
        &self,
        problem: &str,
        description: Option<&str>,
        reddit_upvotes: i64,
        reddit_comments: i64,
    ) -> Result<AiAnalysis, AnalyzerError> {
        let prompt = build_prompt(problem, description, reddit_upvotes, reddit_comments);

        let url = self.base_url.join("v1/messages").map_err(|e| {
            AnalyzerError::UnexpectedResponse(format!("invalid messages URL: {e}"))
        })?;

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&serde_json::json!({
                "model": MODEL,
                "max_tokens": MAX_TOKENS,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::UnexpectedStatus { status });
        }

        let body = response.bytes().await?;
        let envelope: MessagesResponse =
            serde_json::from_slice(&body).map_err(|e| AnalyzerError::Deserialize {
                context: "messages envelope".to_owned(),
                source: e,
            })?;

        let text = envelope
            .content
            .iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .ok_or_else(|| {
                AnalyzerError::UnexpectedResponse("reply contains no text block".to_owned())
            })?;

        let analysis = parse_analysis(text)?;
        tracing::debug!(
            pain_level = analysis.pain_level,
            market_size = ?analysis.market_size,
            "idea analysis parsed"
        );
        Ok(analysis)
    }
}

/// Extract and parse the first `{...}` JSON object embedded in the reply text.
fn parse_analysis(text: &str) -> Result<AiAnalysis, AnalyzerError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(AnalyzerError::UnexpectedResponse(
            "reply text contains no JSON object".to_owned(),
        ));
    };
    if end < start {
        return Err(AnalyzerError::UnexpectedResponse(
            "reply text contains no JSON object".to_owned(),
        ));
    }

    serde_json::from_str(&text[start..=end]).map_err(|e| AnalyzerError::Deserialize {
        context: "analysis JSON".to_owned(),
        source: e,
    })
}

fn build_prompt(
    problem: &str,
    description: Option<&str>,
    reddit_upvotes: i64,
    reddit_comments: i64,
) -> String {
    let description_line = description
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!("Description: {d}\n"))
        .unwrap_or_default();

    format!(
        "You are an expert startup advisor analyzing potential business opportunities.\n\n\
         Analyze this problem statement and provide detailed insights:\n\n\
         Problem: {problem}\n\
         {description_line}\
         Community Engagement: {reddit_upvotes} upvotes, {reddit_comments} comments\n\n\
         Provide a comprehensive analysis in JSON format with the following structure:\n\
         {{\n\
         \x20 \"problem\": \"Refined problem statement\",\n\
         \x20 \"painLevel\": 1-10 (how severe is this pain point),\n\
         \x20 \"targetCustomer\": \"Detailed description of who has this problem\",\n\
         \x20 \"marketSize\": \"Small/Medium/Large\",\n\
         \x20 \"competitionLevel\": \"Low/Medium/High\",\n\
         \x20 \"monetizationIdeas\": [\"idea 1\", \"idea 2\", \"idea 3\"],\n\
         \x20 \"techStack\": [\"tech1\", \"tech2\", \"tech3\", \"tech4\"],\n\
         \x20 \"buildTimeEstimate\": \"X weeks/months for MVP\",\n\
         \x20 \"keyInsights\": [\"insight 1\", \"insight 2\", \"insight 3\"]\n\
         }}\n\n\
         Be specific, actionable, and realistic. Focus on practical business insights."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_analysis_extracts_embedded_json() {
        let text = r#"Here is my analysis:
{
  "problem": "p",
  "painLevel": 6,
  "targetCustomer": "c",
  "marketSize": "Large",
  "competitionLevel": "Low",
  "monetizationIdeas": ["a"],
  "techStack": ["rust"],
  "buildTimeEstimate": "4 weeks",
  "keyInsights": ["i"]
}
Hope this helps!"#;

        let analysis = parse_analysis(text).expect("should parse");
        assert_eq!(analysis.pain_level, 6);
        assert_eq!(analysis.problem, "p");
    }

    #[test]
    fn parse_analysis_rejects_text_without_json() {
        let result = parse_analysis("no structured data here");
        assert!(matches!(result, Err(AnalyzerError::UnexpectedResponse(_))));
    }

    #[test]
    fn parse_analysis_rejects_mismatched_shape() {
        let result = parse_analysis(r#"{"unexpected": true}"#);
        assert!(matches!(result, Err(AnalyzerError::Deserialize { .. })));
    }

    #[test]
    fn prompt_includes_engagement_and_optional_description() {
        let with = build_prompt("P", Some("D"), 10, 3);
        assert!(with.contains("Problem: P"));
        assert!(with.contains("Description: D"));
        assert!(with.contains("10 upvotes, 3 comments"));

        let without = build_prompt("P", None, 0, 0);
        assert!(!without.contains("Description:"));
    }
}
