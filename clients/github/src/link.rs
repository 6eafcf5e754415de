use url::Url;

/// Extracts the `rel="last"` page number from a pagination `Link` header.
///
/// Headers look like:
/// `<https://api.github.com/repos/o/r/commits?per_page=1&page=2>; rel="next", <...&page=7>; rel="last"`
pub fn last_page(link_header: &str) -> Option<u32> {
    for part in link_header.split(',') {
        let mut target = None;
        let mut rel = None;
        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                target = Some(&segment[1..segment.len() - 1]);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"'));
            }
        }
        if rel == Some("last") {
            return target.and_then(page_param);
        }
    }
    None
}

fn page_param(target: &str) -> Option<u32> {
    let url = Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// Tests

#[test]
fn last_page_from_full_header_test() {
    let header = r#"<https://api.github.com/repos/o/r/commits?per_page=1&page=2>; rel="next", <https://api.github.com/repos/o/r/commits?per_page=1&page=7>; rel="last""#;
    assert_eq!(last_page(header), Some(7));
}

#[test]
fn last_page_without_last_rel_test() {
    let header = r#"<https://api.github.com/repos/o/r/commits?per_page=1&page=2>; rel="next""#;
    assert_eq!(last_page(header), None);
}

#[test]
fn last_page_ignores_malformed_header_test() {
    assert_eq!(last_page(""), None);
    assert_eq!(last_page("nonsense"), None);
    assert_eq!(last_page(r#"<not a url>; rel="last""#), None);
}
