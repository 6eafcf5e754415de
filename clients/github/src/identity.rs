use repo_roster::api::RepoIdentity;
use url::Url;

const CANONICAL_PREFIX: &str = "https://github.com/";

/// Parses a free-form repository reference into its canonical identity.
///
/// Accepts full URLs, `owner/repo` shorthands and references with a trailing
/// `.git`. Returns `None` when fewer than two path segments are present or
/// the reference does not parse as a URL; an unparsable reference is roster
/// data, not a defect.
pub fn resolve(reference: &str) -> Option<RepoIdentity> {
    let trimmed = reference.trim();
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let canonical = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("{}{}", CANONICAL_PREFIX, trimmed)
    };
    let url = Url::parse(&canonical).ok()?;
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.to_string();
    Some(RepoIdentity::new(owner, repo))
}

/// Tests

#[test]
fn resolve_full_url_test() {
    let identity = resolve("https://github.com/octocat/hello-world").unwrap();
    assert_eq!(identity.owner, "octocat");
    assert_eq!(identity.repo, "hello-world");
}

#[test]
fn resolve_shorthand_test() {
    let identity = resolve("octocat/hello-world").unwrap();
    assert_eq!(identity, RepoIdentity::new("octocat".to_string(), "hello-world".to_string()));
}

#[test]
fn resolve_strips_git_suffix_and_whitespace_test() {
    let identity = resolve("  https://github.com/octocat/hello-world.git  ").unwrap();
    assert_eq!(identity.repo, "hello-world");
}

#[test]
fn resolve_normalizes_equivalent_references_test() {
    assert_eq!(resolve("octocat/hello-world.git"), resolve("https://github.com/octocat/hello-world"));
}

#[test]
fn resolve_ignores_extra_segments_test() {
    let identity = resolve("https://github.com/octocat/hello-world/tree/main/src").unwrap();
    assert_eq!(identity, RepoIdentity::new("octocat".to_string(), "hello-world".to_string()));
}

#[test]
fn resolve_rejects_incomplete_references_test() {
    assert_eq!(resolve("octocat"), None);
    assert_eq!(resolve("https://github.com/octocat"), None);
    assert_eq!(resolve(""), None);
    assert_eq!(resolve("   "), None);
}
