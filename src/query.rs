use crate::models::Criterion;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://urlscan.io/api/v1/search/";

/// Fields whose values the search API expects as quoted phrases.
const QUOTED_KINDS: [&str; 3] = ["url", "domain", "ip"];

/// `domain:"example.com"` for phrase fields, `page.status:200` otherwise.
/// Embedded double quotes are passed through untouched.
pub fn format_query(kind: &str, value: &str) -> String {
    if QUOTED_KINDS.contains(&kind) {
        format!("{kind}:\"{value}\"")
    } else {
        format!("{kind}:{value}")
    }
}

pub fn criterion_query(criterion: &Criterion) -> String {
    format_query(&criterion.kind, &criterion.value)
}

pub fn build_search_url(
    endpoint: &str,
    query: &str,
    size: u32,
) -> Result<String, serde_urlencoded::ser::Error> {
    let size = size.to_string();
    let qs = serde_urlencoded::to_string([("q", query), ("size", size.as_str())].as_slice())?;
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    Ok(format!("{endpoint}{sep}{qs}"))
}
