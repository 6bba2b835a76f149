//! GitHub repository access
//!
//! Fetches README content through the GitHub REST API. The endpoint
//! returns the file base64-encoded with embedded newlines, so the
//! payload is stripped of whitespace before decoding.

use std::fmt;
use std::fmt::Debug;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";

const DEFAULT_USER_AGENT: &str = "keymzanzi-gateway";
const API_VERSION: &str = "2022-11-28";

/// Owner and repository name extracted from a github.com URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    owner: String,
    repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parses a repository URL. Accepts http/https, an optional
    /// `www.` prefix, a trailing `.git` suffix, and extra path
    /// segments such as `/tree/main`.
    pub fn parse(url: &str) -> Result<Self, DomainError> {
        let trimmed = url.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let rest = rest.strip_prefix("www.").unwrap_or(rest);
        let rest = rest.strip_prefix("github.com/").ok_or_else(|| {
            DomainError::validation("Only github.com repository URLs are supported")
        })?;
        let rest = match rest.find(['?', '#']) {
            Some(idx) => &rest[..idx],
            None => rest,
        };

        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        let owner = segments.next().ok_or_else(|| {
            DomainError::validation("Repository URL is missing the owner segment")
        })?;
        let repo = segments.next().ok_or_else(|| {
            DomainError::validation("Repository URL is missing the repository segment")
        })?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        if repo.is_empty() {
            return Err(DomainError::validation(
                "Repository URL is missing the repository segment",
            ));
        }

        Ok(Self::new(owner, repo))
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Fetches README content for a repository
#[async_trait]
pub trait GithubReadme: Send + Sync + Debug {
    async fn fetch_readme(&self, repo: &RepoRef) -> Result<String, DomainError>;
}

/// GitHub REST API client
#[derive(Debug)]
pub struct GithubClient<C: HttpClientTrait> {
    client: C,
    auth_header: Option<String>,
    base_url: String,
    user_agent: String,
}

impl<C: HttpClientTrait> GithubClient<C> {
    pub fn new(client: C, token: Option<String>) -> Self {
        Self::with_base_url(client, token, DEFAULT_GITHUB_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        token: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = token.map(|token| format!("Bearer {}", token));
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn readme_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/repos/{}/{}/readme",
            self.base_url,
            repo.owner(),
            repo.repo()
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![
            ("Accept", "application/vnd.github+json"),
            ("X-GitHub-Api-Version", API_VERSION),
            ("User-Agent", self.user_agent.as_str()),
        ];
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }
        headers
    }
}

#[async_trait]
impl<C: HttpClientTrait> GithubReadme for GithubClient<C> {
    async fn fetch_readme(&self, repo: &RepoRef) -> Result<String, DomainError> {
        let url = self.readme_url(repo);
        debug!(repo = %repo, "Fetching repository README");

        let json = self.client.get_json(&url, self.headers()).await?;
        let payload: ReadmePayload = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("github", format!("Failed to parse README response: {}", e))
        })?;

        decode_content(&payload)
    }
}

fn decode_content(payload: &ReadmePayload) -> Result<String, DomainError> {
    if !payload.encoding.is_empty() && payload.encoding != "base64" {
        return Err(DomainError::provider(
            "github",
            format!("Unsupported README encoding: {}", payload.encoding),
        ));
    }

    let compact: String = payload
        .content
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = BASE64.decode(compact.as_bytes()).map_err(|e| {
        DomainError::provider("github", format!("Failed to decode README content: {}", e))
    })?;

    String::from_utf8(bytes)
        .map_err(|e| DomainError::provider("github", format!("README is not valid UTF-8: {}", e)))
}

// GitHub API types

#[derive(Debug, Deserialize)]
struct ReadmePayload {
    content: String,
    #[serde(default)]
    encoding: String,
}

#[cfg(test)]
pub mod mock {
    use std::sync::RwLock;

    use super::*;

    /// Returns a fixed README for any repository
    #[derive(Debug)]
    pub struct MockGithubReadme {
        readme: RwLock<String>,
        should_fail: RwLock<bool>,
    }

    impl MockGithubReadme {
        pub fn new(readme: impl Into<String>) -> Self {
            Self {
                readme: RwLock::new(readme.into()),
                should_fail: RwLock::new(false),
            }
        }

        pub fn set_should_fail(&self, should_fail: bool) {
            *self.should_fail.write().unwrap() = should_fail;
        }
    }

    #[async_trait]
    impl GithubReadme for MockGithubReadme {
        async fn fetch_readme(&self, _repo: &RepoRef) -> Result<String, DomainError> {
            if *self.should_fail.read().unwrap() {
                return Err(DomainError::provider("github", "Mock README failure"));
            }
            Ok(self.readme.read().unwrap().clone())
        }
    }
}
