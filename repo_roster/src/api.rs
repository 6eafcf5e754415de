use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use std::fmt::Display;
use strum_macros::EnumString;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error: {0}")]
    Error(&'static str),
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Canonical identity of a remote repository.
///
/// Two reference strings that normalize to the same `(owner, repo)` pair are
/// the same remote entity as far as caching is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Constructor)]
pub struct RepoIdentity {
    pub owner: String,
    pub repo: String,
}

impl Display for RepoIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}/{}", self.owner, self.repo))
    }
}

/// Whether a metrics fetch includes the lines-of-code estimate.
///
/// The two modes have different cost, so they are tracked as distinct cache
/// entries; a bundle fetched without the estimate must not satisfy a request
/// that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, EnumString)]
pub enum LocMode {
    #[strum(serialize = "loc")]
    Estimate,
    #[strum(serialize = "noloc")]
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentCommit {
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub sha: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryInfo {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub size: u32,
    pub private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Complete set of metrics for one repository at one point in time.
///
/// Immutable once produced; the unit of cache storage and of merge input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsBundle {
    pub total_commits: u32,
    pub recent_commit: Option<RecentCommit>,
    pub repository_info: Option<RepositoryInfo>,
    pub total_lines_of_code: Option<u64>,
    pub error: Option<String>,
}

impl MetricsBundle {
    pub fn from_error<STR: Into<String>>(message: STR) -> Self {
        MetricsBundle {
            error: Some(message.into()),
            ..MetricsBundle::default()
        }
    }
}

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Resolves `reference` and produces the metrics bundle for it.
    ///
    /// Failures scoped to a single repository (an unresolvable reference, a
    /// failed commit lookup) are reported through the bundle's `error` field;
    /// `Err` is reserved for failures outside a single fetch.
    async fn repository_metrics(&self, reference: &str, mode: LocMode) -> Result<MetricsBundle>;
}

/// Tests

#[test]
fn loc_mode_cache_suffix_test() {
    assert_eq!(LocMode::Estimate.to_string(), "loc");
    assert_eq!(LocMode::Skip.to_string(), "noloc");
}

#[test]
fn loc_mode_from_str_test() {
    use std::str::FromStr;
    assert_eq!(LocMode::from_str("loc").unwrap(), LocMode::Estimate);
    assert_eq!(LocMode::from_str("noloc").unwrap(), LocMode::Skip);
    assert!(LocMode::from_str("exact").is_err());
}

#[test]
fn repo_identity_display_test() {
    let identity = RepoIdentity::new("octocat".to_string(), "hello-world".to_string());
    assert_eq!(identity.to_string(), "octocat/hello-world");
}
