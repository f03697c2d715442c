//! Octocrab client wrapper scoped to one repository.
//!
//! All hook operations target the repository the notifier watches, so the
//! client carries the `RepoId` alongside the underlying `Octocrab`
//! instance and route construction stays in one place.

use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;

use crate::types::RepoId;

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct GithubClient {
    client: Octocrab,
    repo: RepoId,
}

impl GithubClient {
    fn new(client: Octocrab, repo: RepoId) -> Self {
        GithubClient { client, repo }
    }

    /// Builds a client authenticated with a personal access token.
    ///
    /// Octocrab's transparent retry middleware is disabled: hook calls are
    /// single-attempt, and retry is the operator's to decide by
    /// re-activating.
    pub fn from_token(token: impl Into<String>, repo: RepoId) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .add_retry_config(RetryConfig::None)
            .build()?;
        Ok(Self::new(client, repo))
    }

    /// Builds an unauthenticated client against an alternate API base URL,
    /// with the same middleware settings as [`GithubClient::from_token`].
    #[cfg(test)]
    pub(crate) fn for_base_uri(
        base_uri: impl Into<String>,
        repo: RepoId,
    ) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder()
            .base_uri(base_uri.into())?
            .add_retry_config(RetryConfig::None)
            .build()?;
        Ok(Self::new(client, repo))
    }

    /// The underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// The repository this client is scoped to.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Route to the repository's hooks collection.
    pub(crate) fn hooks_route(&self) -> String {
        format!("/repos/{}/{}/hooks", self.repo.owner, self.repo.repo)
    }

    /// Route to one registered hook.
    pub(crate) fn hook_route(&self, hook_id: crate::types::HookId) -> String {
        format!("{}/{}", self.hooks_route(), hook_id)
    }
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
