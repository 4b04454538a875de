//! Joining configured base URLs with endpoint paths.

/// Strip surrounding whitespace and trailing slashes from a configured base URL.
///
/// # Examples
///
/// ```
/// use chatgauge::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://127.0.0.1:5000/"), "http://127.0.0.1:5000");
/// assert_eq!(normalize_base_url(" http://chat.local/api// "), "http://chat.local/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Append `endpoint` to `base_url` with exactly one slash between them.
///
/// # Examples
///
/// ```
/// use chatgauge::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://127.0.0.1:5000", "ask"),
///     "http://127.0.0.1:5000/ask"
/// );
/// assert_eq!(
///     construct_api_url("http://chat.local/api/", "/ask"),
///     "http://chat.local/api/ask"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
