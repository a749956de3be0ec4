use url::form_urlencoded;

/// Strips a single trailing slash so endpoint paths can be appended blindly.
pub fn normalize_base_url(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Ensures the token carries the `Bearer ` scheme exactly once,
/// case-insensitive on what the caller already provided.
pub fn normalize_bearer(token: &str) -> String {
    let trimmed = token.trim();
    let has_scheme = trimmed
        .get(..7)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("bearer "));
    if has_scheme {
        trimmed.to_string()
    } else {
        format!("Bearer {}", trimmed)
    }
}

/// Percent-encodes a query-string value.
pub fn url_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
