//! README summarization through an OpenAI-compatible chat API
//!
//! Uses the structured-output response format so the model is forced
//! to return the summary schema instead of free-form prose.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::DomainError;
use crate::infrastructure::github::RepoRef;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_SUMMARIZER_BASE_URL: &str = "https://api.openai.com";

const SYSTEM_PROMPT: &str =
    "You summarize GitHub repositories from their README files. Be concise and factual.";

// Bounds the completion request payload for very large READMEs.
const MAX_README_CHARS: usize = 32_000;

/// Structured summary of a repository README
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub summary: String,
    pub cool_facts: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
}

/// Produces a [`RepoSummary`] from README content
#[async_trait]
pub trait Summarizer: Send + Sync + Debug {
    async fn summarize(&self, repo: &RepoRef, readme: &str) -> Result<RepoSummary, DomainError>;
}

/// Chat-completions-backed summarizer
#[derive(Debug)]
pub struct ChatCompletionSummarizer<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
}

impl<C: HttpClientTrait> ChatCompletionSummarizer<C> {
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_SUMMARIZER_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: model.into(),
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, repo: &RepoRef, readme: &str) -> serde_json::Value {
        let prompt = format!(
            "Summarize the {} repository based on its README file.\n\n<readme>\n{}\n</readme>",
            repo,
            truncate_readme(readme)
        );

        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "repo_summary",
                    "strict": true,
                    "schema": summary_schema()
                }
            }
        })
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<RepoSummary, DomainError> {
        let response: CompletionResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("summarizer", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("summarizer", "No choices in response"))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| DomainError::provider("summarizer", "No content in response"))?;

        serde_json::from_str(&content).map_err(|e| {
            DomainError::provider(
                "summarizer",
                format!("Model returned malformed summary JSON: {}", e),
            )
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> Summarizer for ChatCompletionSummarizer<C> {
    async fn summarize(&self, repo: &RepoRef, readme: &str) -> Result<RepoSummary, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(repo, readme);
        debug!(repo = %repo, model = %self.model, "Requesting README summary");

        let response = self.client.post_json(&url, self.headers(), &body).await?;
        self.parse_response(response)
    }
}

fn summary_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "cool_facts": { "type": "array", "items": { "type": "string" } },
            "tech_stack": { "type": "array", "items": { "type": "string" } },
            "target_audience": { "type": "string" }
        },
        "required": ["summary", "cool_facts", "tech_stack", "target_audience"],
        "additionalProperties": false
    })
}

fn truncate_readme(readme: &str) -> &str {
    if readme.len() <= MAX_README_CHARS {
        return readme;
    }

    let mut end = MAX_README_CHARS;
    while !readme.is_char_boundary(end) {
        end -= 1;
    }
    &readme[..end]
}

// Chat completion API types

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}
