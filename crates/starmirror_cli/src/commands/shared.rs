use sea_orm::DatabaseConnection;

use starmirror::ApiRateLimiter;
use starmirror::github::GitHubClient;
use starmirror::sync::{ProgressCallback, SyncCoordinator, SyncOptions};

use crate::config::Config;

const MISSING_USERNAME: &str = "GitHub username is not configured. Set `username` under [github] \
in starmirror.toml or export STARMIRROR_GITHUB__USERNAME.";

/// Build the GitHub client described by the configuration.
pub(crate) fn build_client(config: &Config) -> Result<GitHubClient, Box<dyn std::error::Error>> {
    let username = config
        .github
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(MISSING_USERNAME)?;

    let token = config.github_token();
    if token.is_none() {
        tracing::debug!("No GitHub token configured, using unauthenticated rate limits");
    }

    let client = GitHubClient::new(&config.github.api_base, username, token.as_deref())?;
    Ok(if config.sync.no_rate_limit {
        client
    } else {
        client.with_rate_limiter(ApiRateLimiter::new(config.sync.requests_per_second))
    })
}

/// Build a coordinator over `db` for the configured user.
pub(crate) fn build_coordinator(
    config: &Config,
    db: DatabaseConnection,
    on_progress: Option<ProgressCallback>,
) -> Result<SyncCoordinator, Box<dyn std::error::Error>> {
    let client = build_client(config)?;
    let options = SyncOptions {
        prune_on_partial_fetch: config.sync.prune_on_partial_fetch,
    };
    Ok(SyncCoordinator::new(db, client, options, on_progress))
}
