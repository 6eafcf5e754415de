use async_trait::async_trait;
use log::{debug, error, warn};
use repo_roster::api::{LocMode, MetricsBundle, MetricsProvider, RecentCommit, RepoIdentity, RepositoryInfo, Result};
use reqwest::header;
use reqwest::Client;
use reqwest::StatusCode;
use std::time::Duration;

mod builder;
mod cache;
mod identity;
mod link;
mod payload;

pub use builder::{GithubClientBuilder, DEFAULT_API_URL};
pub use cache::{MetricsCache, DEFAULT_CACHE_TTL};
pub use identity::resolve;
pub use payload::{RateLimitResource, RateLimitResources};

pub const INVALID_REFERENCE_ERROR: &str = "Invalid GitHub repository reference";

/// Heuristic: the average source line weighs about this many bytes, across
/// the language mix typically seen in student repositories.
const BYTES_PER_LINE: u64 = 40;

const STATS_MAX_ATTEMPTS: u32 = 6;
const STATS_RETRY_DELAY: Duration = Duration::from_millis(1500);

pub struct GithubMetricsClient {
    client: Client,
    api_url: String,
    cache: MetricsCache,
}

impl GithubMetricsClient {
    /// Commit count and most recent commit, from a single request.
    ///
    /// The commits endpoint is queried with a page size of one; the total
    /// count comes from the `rel="last"` page number of the pagination
    /// header, falling back to the returned item count when the repository
    /// fits on one page.
    async fn commit_summary(&self, identity: &RepoIdentity) -> Result<(u32, Option<RecentCommit>)> {
        let request_url = format!("{}/repos/{}/{}/commits", self.api_url, identity.owner, identity.repo);
        let response = self
            .client
            .get(request_url)
            .query(&[("per_page", "1")])
            .send()
            .await?
            .error_for_status()?;
        let last_page = response
            .headers()
            .get(header::LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(link::last_page);
        let commits = response.json::<Vec<payload::CommitItem>>().await?;
        let total_commits = match last_page {
            Some(pages) => pages,
            None => commits.len() as u32,
        };
        let recent_commit = commits.into_iter().next().map(RecentCommit::from);
        Ok((total_commits, recent_commit))
    }

    async fn repository_info(&self, identity: &RepoIdentity) -> Result<RepositoryInfo> {
        let request_url = format!("{}/repos/{}/{}", self.api_url, identity.owner, identity.repo);
        let response = self.client.get(request_url).send().await?.error_for_status()?;
        Ok(response.json::<payload::RepoBody>().await?.into())
    }

    /// Fast lines-of-code estimate from per-language byte totals.
    ///
    /// One request, no server-side computation to wait for; the price is
    /// precision, which is acceptable for bulk roster loads.
    pub async fn repository_loc_estimate(&self, identity: &RepoIdentity) -> Result<u64> {
        let request_url = format!("{}/repos/{}/{}/languages", self.api_url, identity.owner, identity.repo);
        let response = self.client.get(request_url).send().await?.error_for_status()?;
        let bytes: u64 = response.json::<payload::LanguageBytes>().await?.values().sum();
        Ok(estimate_lines(bytes))
    }

    /// Net line count from the server-computed weekly code-frequency series.
    ///
    /// The endpoint answers 202 while the series is still being computed, so
    /// this polls with a fixed backoff and gives up with `None` after a
    /// bounded number of attempts. `None` means unknown; it is never
    /// conflated with a repository that genuinely has zero lines.
    pub async fn repository_loc_via_stats(&self, identity: &RepoIdentity) -> Option<u64> {
        let request_url = format!(
            "{}/repos/{}/{}/stats/code_frequency",
            self.api_url, identity.owner, identity.repo
        );
        for attempt in 1..=STATS_MAX_ATTEMPTS {
            match self.code_frequency_attempt(&request_url).await {
                Ok(Some(weeks)) => {
                    let net: i64 = weeks.iter().map(payload::CodeFrequencyWeek::net_lines).sum();
                    return Some(net.max(0) as u64);
                }
                Ok(None) => debug!(
                    "Code frequency for {} not ready (attempt {}/{})",
                    identity, attempt, STATS_MAX_ATTEMPTS
                ),
                Err(err) => warn!(
                    "Code frequency request for {} failed (attempt {}/{}): {}",
                    identity, attempt, STATS_MAX_ATTEMPTS, err
                ),
            }
            if attempt < STATS_MAX_ATTEMPTS {
                tokio::time::sleep(STATS_RETRY_DELAY).await;
            }
        }
        None
    }

    /// `Ok(None)` is the endpoint's "still computing" answer.
    async fn code_frequency_attempt(&self, request_url: &str) -> Result<Option<Vec<payload::CodeFrequencyWeek>>> {
        let response = self.client.get(request_url).send().await?;
        if response.status() == StatusCode::ACCEPTED {
            return Ok(None);
        }
        let weeks = response.error_for_status()?.json::<Vec<payload::CodeFrequencyWeek>>().await?;
        if weeks.is_empty() {
            return Ok(None);
        }
        Ok(Some(weeks))
    }

    /// Current API quota, for diagnostics.
    pub async fn rate_limit(&self) -> Result<RateLimitResources> {
        let request_url = format!("{}/rate_limit", self.api_url);
        let response = self.client.get(request_url).send().await?.error_for_status()?;
        Ok(response.json::<payload::RateLimitBody>().await?.resources)
    }

    /// Whether a user with this login exists.
    pub async fn validate_username<STR: AsRef<str>>(&self, login: STR) -> bool {
        let request_url = format!("{}/users/{}", self.api_url, login.as_ref());
        match self.client.get(request_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!("Username validation for {} failed: {}", login.as_ref(), err);
                false
            }
        }
    }

    /// Drops cached metrics for one repository, for a forced refresh.
    pub async fn invalidate(&self, owner: &str, repo: &str) {
        self.cache.invalidate(owner, repo).await;
    }

    /// Drops all cached metrics, for a full roster refresh.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    async fn fetch_bundle(&self, identity: &RepoIdentity, mode: LocMode) -> MetricsBundle {
        let commit_summary = self.commit_summary(identity);
        let repository_info = self.repository_info(identity);
        let lines_of_code = async {
            match mode {
                LocMode::Estimate => match self.repository_loc_estimate(identity).await {
                    Ok(lines) => Some(lines),
                    Err(err) => {
                        warn!("Failed to estimate lines of code for {}: {}", identity, err);
                        None
                    }
                },
                LocMode::Skip => None,
            }
        };
        // The sub-fetches are independent; run them concurrently.
        let (commit_summary, repository_info, total_lines_of_code) =
            tokio::join!(commit_summary, repository_info, lines_of_code);

        let mut bundle = MetricsBundle::default();
        match commit_summary {
            Ok((total_commits, recent_commit)) => {
                bundle.total_commits = total_commits;
                bundle.recent_commit = recent_commit;
            }
            Err(err) => {
                error!("Failed to fetch commit summary for {}: {}", identity, err);
                bundle.error = Some(err.to_string());
            }
        }
        bundle.repository_info = match repository_info {
            Ok(info) => Some(info),
            Err(err) => {
                warn!("Failed to fetch repository info for {}: {}", identity, err);
                None
            }
        };
        bundle.total_lines_of_code = total_lines_of_code;
        bundle
    }
}

#[async_trait]
impl MetricsProvider for GithubMetricsClient {
    async fn repository_metrics(&self, reference: &str, mode: LocMode) -> Result<MetricsBundle> {
        let identity = match identity::resolve(reference) {
            Some(identity) => identity,
            None => return Ok(MetricsBundle::from_error(INVALID_REFERENCE_ERROR)),
        };
        if let Some(bundle) = self.cache.get(&identity, mode).await {
            debug!("Cache hit for {} ({})", identity, mode);
            return Ok(bundle);
        }
        let bundle = self.fetch_bundle(&identity, mode).await;
        self.cache.put(&identity, mode, bundle.clone()).await;
        Ok(bundle)
    }
}

fn estimate_lines(bytes: u64) -> u64 {
    (bytes as f64 / BYTES_PER_LINE as f64).round() as u64
}

/// Tests

#[test]
fn estimate_lines_test() {
    // 4000 bytes of JavaScript plus 800 bytes of CSS.
    assert_eq!(estimate_lines(4800), 120);
    assert_eq!(estimate_lines(0), 0);
    // Rounds to nearest, not down.
    assert_eq!(estimate_lines(60), 2);
}
