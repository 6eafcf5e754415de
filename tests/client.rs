use github_client::{GithubClientBuilder, GithubMetricsClient, MetricsCache, INVALID_REFERENCE_ERROR};
use repo_roster::api::{LocMode, MetricsProvider, RepoIdentity};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMITS_BODY: &str = r#"[{
    "sha": "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3",
    "html_url": "https://github.com/octocat/hello-world/commit/a94a8fe",
    "commit": {
        "message": "Initial work",
        "author": { "name": "Mona", "date": "2024-03-05T12:00:00Z" }
    }
}]"#;

const REPO_BODY: &str = r#"{
    "name": "hello-world",
    "description": null,
    "language": "Rust",
    "stargazers_count": 1,
    "forks_count": 0,
    "size": 64,
    "private": false,
    "created_at": "2023-09-01T08:00:00Z",
    "updated_at": "2024-03-05T12:00:00Z"
}"#;

fn client(server: &MockServer) -> GithubMetricsClient {
    GithubClientBuilder::default()
        .with_api_url(server.uri())
        .build()
        .unwrap()
}

fn identity() -> RepoIdentity {
    RepoIdentity::new("octocat".to_string(), "hello-world".to_string())
}

async fn mock_commits(server: &MockServer, expected_calls: u64, link: Option<&str>) {
    let mut response = ResponseTemplate::new(200).set_body_raw(COMMITS_BODY, "application/json");
    if let Some(link) = link {
        response = response.insert_header("Link", link);
    }
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/commits"))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mock_repo_info(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(REPO_BODY, "application/json"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mock_languages(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/languages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{ "JavaScript": 4000, "CSS": 800 }"#, "application/json"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    mock_commits(&server, 1, None).await;
    mock_repo_info(&server, 1).await;
    let client = client(&server);

    let first = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    let second = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.total_commits, 1);
}

#[tokio::test]
async fn equivalent_references_share_a_cache_entry() {
    let server = MockServer::start().await;
    mock_commits(&server, 1, None).await;
    mock_repo_info(&server, 1).await;
    let client = client(&server);

    let first = client
        .repository_metrics("https://github.com/octocat/hello-world.git", LocMode::Skip)
        .await
        .unwrap();
    let second = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn loc_modes_are_cached_separately() {
    let server = MockServer::start().await;
    mock_commits(&server, 2, None).await;
    mock_repo_info(&server, 2).await;
    mock_languages(&server, 1).await;
    let client = client(&server);

    let without = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(without.total_lines_of_code, None);

    // A bundle fetched without the estimate must not satisfy this request.
    let with = client.repository_metrics("octocat/hello-world", LocMode::Estimate).await.unwrap();
    assert_eq!(with.total_lines_of_code, Some(120));
}

#[tokio::test]
async fn invalidate_forces_a_fresh_fetch() {
    let server = MockServer::start().await;
    mock_commits(&server, 2, None).await;
    mock_repo_info(&server, 2).await;
    let client = client(&server);

    client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    client.invalidate("octocat", "hello-world").await;
    client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
}

#[tokio::test]
async fn zero_ttl_cache_never_reuses() {
    let server = MockServer::start().await;
    mock_commits(&server, 2, None).await;
    mock_repo_info(&server, 2).await;
    let client = GithubClientBuilder::default()
        .with_api_url(server.uri())
        .with_cache(MetricsCache::new(Duration::ZERO))
        .build()
        .unwrap();

    client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
}

#[tokio::test]
async fn commit_count_comes_from_pagination_header() {
    let server = MockServer::start().await;
    let link = format!(
        r#"<{uri}/repos/octocat/hello-world/commits?per_page=1&page=2>; rel="next", <{uri}/repos/octocat/hello-world/commits?per_page=1&page=7>; rel="last""#,
        uri = server.uri()
    );
    mock_commits(&server, 1, Some(&link)).await;
    mock_repo_info(&server, 1).await;
    let client = client(&server);

    let bundle = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(bundle.total_commits, 7);
}

#[tokio::test]
async fn commit_count_falls_back_to_item_count() {
    let server = MockServer::start().await;
    // No pagination header, one returned commit.
    mock_commits(&server, 1, None).await;
    mock_repo_info(&server, 1).await;
    let client = client(&server);

    let bundle = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(bundle.total_commits, 1);
    assert!(bundle.recent_commit.is_some());
}

#[tokio::test]
async fn commit_count_zero_for_empty_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .mount(&server)
        .await;
    mock_repo_info(&server, 1).await;
    let client = client(&server);

    let bundle = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(bundle.total_commits, 0);
    assert_eq!(bundle.recent_commit, None);
    assert_eq!(bundle.error, None);
}

#[tokio::test]
async fn commit_failure_is_reported_on_the_bundle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/commits"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mock_repo_info(&server, 1).await;
    let client = client(&server);

    let bundle = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(bundle.total_commits, 0);
    assert_eq!(bundle.recent_commit, None);
    assert!(bundle.error.is_some());
    // Metadata still arrives; the sub-fetches degrade independently.
    assert!(bundle.repository_info.is_some());
}

#[tokio::test]
async fn metadata_and_loc_failures_degrade_to_null() {
    let server = MockServer::start().await;
    mock_commits(&server, 1, None).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/languages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = client(&server);

    let bundle = client.repository_metrics("octocat/hello-world", LocMode::Estimate).await.unwrap();
    assert_eq!(bundle.total_commits, 1);
    assert_eq!(bundle.repository_info, None);
    assert_eq!(bundle.total_lines_of_code, None);
    assert_eq!(bundle.error, None);
}

#[tokio::test]
async fn invalid_reference_is_data_not_an_error() {
    let server = MockServer::start().await;
    let client = client(&server);

    let bundle = client.repository_metrics("owner-only", LocMode::Estimate).await.unwrap();
    assert_eq!(bundle.error.as_deref(), Some(INVALID_REFERENCE_ERROR));
    assert_eq!(bundle.total_commits, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn code_frequency_polls_until_ready() {
    let server = MockServer::start().await;
    // Still computing for the first two attempts, then the series lands.
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/stats/code_frequency"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/stats/code_frequency"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("[[1709510400, 120, 20], [1710115200, 10, 40]]", "application/json"),
        )
        .mount(&server)
        .await;
    let client = client(&server);

    let lines = client.repository_loc_via_stats(&identity()).await;
    assert_eq!(lines, Some(70));
}

#[tokio::test]
async fn code_frequency_clamps_to_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/stats/code_frequency"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("[[1709510400, 10, 500]]", "application/json"),
        )
        .mount(&server)
        .await;
    let client = client(&server);

    assert_eq!(client.repository_loc_via_stats(&identity()).await, Some(0));
}

#[tokio::test]
async fn rate_limit_inspection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
                "resources": {
                    "core": { "limit": 5000, "remaining": 4999, "reset": 1710000000 },
                    "search": { "limit": 30, "remaining": 30, "reset": 1710000000 }
                }
            }"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    let client = client(&server);

    let limits = client.rate_limit().await.unwrap();
    assert_eq!(limits.core.limit, 5000);
    assert_eq!(limits.core.remaining, 4999);
    assert_eq!(limits.search.limit, 30);
}

#[tokio::test]
async fn validate_username_checks_existence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/mona"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = client(&server);

    assert!(client.validate_username("mona").await);
    assert!(!client.validate_username("ghost").await);
}

#[tokio::test]
async fn authorization_header_is_sent_when_token_present() {
    use secrecy::SecretString;
    use wiremock::matchers::header;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/commits"))
        .and(query_param("per_page", "1"))
        .and(header("Authorization", "token sekret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(COMMITS_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;
    mock_repo_info(&server, 1).await;

    let client = GithubClientBuilder::default()
        .with_api_url(server.uri())
        .try_with_token(SecretString::new("sekret".to_string()))
        .unwrap()
        .build()
        .unwrap();
    let bundle = client.repository_metrics("octocat/hello-world", LocMode::Skip).await.unwrap();
    assert_eq!(bundle.error, None);
}
