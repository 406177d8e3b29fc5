//! GitHub client for walking a user's starred list.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::convert::to_starred_repo;
use super::error::{GitHubError, is_transient};
use super::types::StarredEnvelope;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::rate_limit::ApiRateLimiter;
use crate::record::StarredRepo;
use crate::retry::{RetryConfig, retry_page};
use crate::sync::{ProgressCallback, StarredFetch, SyncError, SyncProgress, emit};

/// Public GitHub REST API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Largest page size the starred endpoint accepts.
pub const STARRED_PAGE_SIZE: u32 = 100;

/// Media type that wraps each item as `{starred_at, repo}`.
const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";

const USER_AGENT: &str = "starmirror";

/// One decoded page of the starred list.
#[derive(Debug, Default)]
struct StarredPage {
    repos: Vec<StarredRepo>,
    next: Option<String>,
}

/// Extract the `rel="next"` URL from a Link header.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/user/1/starred?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn next_page_url(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some("next")) = (url, rel) {
            return Some(url.to_string());
        }
    }
    None
}

/// GitHub API client for the starred list of one user.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    username: String,
    token: Option<String>,
    /// Optional rate limiter for pacing API requests.
    rate_limiter: Option<ApiRateLimiter>,
    retry: RetryConfig,
}

impl GitHubClient {
    /// Create a client backed by reqwest.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = GitHubClient::new(DEFAULT_API_BASE, "octocat", Some("ghp_..."))?
    ///     .with_rate_limiter(ApiRateLimiter::new(10));
    /// ```
    pub fn new(api_base: &str, username: &str, token: Option<&str>) -> Result<Self, GitHubError> {
        if username.trim().is_empty() {
            return Err(GitHubError::Config("GitHub username is empty".to_string()));
        }
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            api_base,
            username,
            token,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        api_base: &str,
        username: &str,
        token: Option<&str>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
            username: username.trim().to_string(),
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
            rate_limiter: None,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: ApiRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// The user whose stars are fetched.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// URL of the first starred page.
    pub fn starred_url(&self) -> String {
        format!(
            "{}/users/{}/starred?per_page={}&page=1",
            self.api_base, self.username, STARRED_PAGE_SIZE
        )
    }

    fn request(&self, url: &str) -> HttpRequest {
        let request = HttpRequest::get(url)
            .header("Accept", STAR_MEDIA_TYPE)
            .header("User-Agent", USER_AGENT);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    async fn fetch_page_once(&self, url: &str) -> Result<StarredPage, GitHubError> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let response: HttpResponse = self.transport.send(self.request(url)).await?;
        if !response.is_success() {
            return Err(GitHubError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }

        // Decode items one at a time so a malformed entry only drops itself.
        let items: Vec<serde_json::Value> = serde_json::from_slice(&response.body)?;
        let mut repos = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let envelope = match serde_json::from_value::<StarredEnvelope>(item) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(url, index, error = %e, "Skipping malformed starred item");
                    continue;
                }
            };
            match to_starred_repo(envelope) {
                Some(repo) => repos.push(repo),
                None => tracing::warn!(
                    url,
                    index,
                    "Skipping starred item without a repository full name"
                ),
            }
        }

        Ok(StarredPage {
            repos,
            next: response.header("link").and_then(next_page_url),
        })
    }

    async fn fetch_page(
        &self,
        url: &str,
        page: u32,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<StarredPage, GitHubError> {
        retry_page(
            || self.fetch_page_once(url),
            is_transient,
            &self.retry,
            page,
            on_progress,
        )
        .await
    }

    /// Walk the whole starred list, following `rel="next"` links.
    ///
    /// A failure on the first page is fatal. A failure on any later page
    /// stops paging and returns what was collected with `partial` set.
    pub async fn fetch_all_starred(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<StarredFetch, SyncError> {
        emit(
            on_progress,
            SyncProgress::FetchingStarred {
                username: self.username.clone(),
            },
        );

        let first = self
            .fetch_page(&self.starred_url(), 1, on_progress)
            .await
            .map_err(SyncError::RemoteUnavailable)?;

        let mut page = 1u32;
        let mut repos = first.repos;
        let mut next = first.next;
        let mut partial = None;
        emit(
            on_progress,
            SyncProgress::FetchedPage {
                page,
                count: repos.len(),
                total_so_far: repos.len(),
            },
        );

        while let Some(url) = next.take() {
            page += 1;
            match self.fetch_page(&url, page, on_progress).await {
                Ok(fetched) => {
                    let count = fetched.repos.len();
                    repos.extend(fetched.repos);
                    next = fetched.next;
                    tracing::debug!(page, count, total = repos.len(), "Fetched starred page");
                    emit(
                        on_progress,
                        SyncProgress::FetchedPage {
                            page,
                            count,
                            total_so_far: repos.len(),
                        },
                    );
                }
                Err(source) => {
                    tracing::warn!(
                        page,
                        fetched = repos.len(),
                        error = %source,
                        "Starred list incomplete, stopping pagination"
                    );
                    partial = Some(SyncError::RemotePartial {
                        page,
                        fetched: repos.len(),
                        source,
                    });
                }
            }
        }

        tracing::info!(
            username = %self.username,
            pages = page,
            total = repos.len(),
            partial = partial.is_some(),
            "Fetched starred repositories"
        );
        emit(
            on_progress,
            SyncProgress::FetchComplete {
                total: repos.len(),
                partial: partial.is_some(),
            },
        );

        Ok(StarredFetch { repos, partial })
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("username", &self.username)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}
