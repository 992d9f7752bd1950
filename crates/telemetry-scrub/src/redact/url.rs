//! URL and route helpers for breadcrumbs.

use std::sync::LazyLock;

use regex::Regex;

/// Table segment of a REST resource path, e.g. `/rest/v1/<table>`.
static REST_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/rest/v[0-9]+/([A-Za-z0-9_\-.]+)(?:[/?#]|$)").expect("table pattern is valid")
});

/// Extract the backend table name from a REST resource URL.
///
/// `https://host/rest/v1/messages?select=*` yields `messages`. Absent,
/// malformed, or non-REST URLs yield `None`.
#[must_use]
pub fn extract_table_name(url: Option<&str>) -> Option<String> {
    let captures = REST_TABLE.captures(url?)?;
    captures.get(1).map(|m| m.as_str().to_string())
}

/// Remove the query string (from the first `?` on) from a route or path.
#[must_use]
pub fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(head, _)| head)
}
