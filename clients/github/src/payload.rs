use chrono::{DateTime, Utc};
use repo_roster::api::{RecentCommit, RepositoryInfo};
use serde::Deserialize;
use std::collections::HashMap;

const SHORT_SHA_LEN: usize = 7;

#[derive(Deserialize, Debug)]
pub struct CommitItem {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
}

#[derive(Deserialize, Debug)]
pub struct CommitDetail {
    pub message: String,
    pub author: CommitAuthor,
}

#[derive(Deserialize, Debug)]
pub struct CommitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

impl From<CommitItem> for RecentCommit {
    fn from(item: CommitItem) -> Self {
        let sha = item.sha.chars().take(SHORT_SHA_LEN).collect();
        RecentCommit {
            message: item.commit.message,
            author: item.commit.author.name,
            date: item.commit.author.date,
            sha,
            url: item.html_url,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct RepoBody {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub size: u32,
    pub private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RepoBody> for RepositoryInfo {
    fn from(body: RepoBody) -> Self {
        RepositoryInfo {
            name: body.name,
            description: body.description,
            language: body.language,
            stars: body.stargazers_count,
            forks: body.forks_count,
            size: body.size,
            private: body.private,
            created_at: body.created_at,
            updated_at: body.updated_at,
        }
    }
}

/// Byte totals per language, as returned by the languages endpoint.
pub type LanguageBytes = HashMap<String, u64>;

/// One `[week, additions, deletions]` row of the code-frequency series.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFrequencyWeek(pub i64, pub i64, pub i64);

impl CodeFrequencyWeek {
    pub fn net_lines(&self) -> i64 {
        self.1 - self.2
    }
}

#[derive(Deserialize, Debug)]
pub struct RateLimitBody {
    pub resources: RateLimitResources,
}

#[derive(Deserialize, Debug)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
    pub search: RateLimitResource,
}

#[derive(Deserialize, Debug)]
pub struct RateLimitResource {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
}

/// Tests

#[test]
fn commit_item_to_recent_commit_test() {
    let item: CommitItem = serde_json::from_str(
        r#"{
            "sha": "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3",
            "html_url": "https://github.com/octocat/hello-world/commit/a94a8fe",
            "commit": {
                "message": "Fix grading script",
                "author": { "name": "Mona", "date": "2024-03-05T12:00:00Z" }
            }
        }"#,
    )
    .unwrap();
    let recent = RecentCommit::from(item);
    assert_eq!(recent.sha, "a94a8fe");
    assert_eq!(recent.author, "Mona");
    assert_eq!(recent.message, "Fix grading script");
}

#[test]
fn code_frequency_week_from_array_test() {
    let weeks: Vec<CodeFrequencyWeek> = serde_json::from_str("[[1709510400, 120, 20], [1710115200, 10, 40]]").unwrap();
    assert_eq!(weeks[0].net_lines(), 100);
    assert_eq!(weeks[1].net_lines(), -30);
}
