//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello") // -> "/blog/post/hello"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_matches('/');
    let path = path.trim_start_matches('/');

    match (root.is_empty(), path.is_empty()) {
        (true, _) => format!("/{}", path),
        (false, true) => format!("/{}/", root),
        (false, false) => format!("/{}/{}", root, path),
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Percent-encode a value for use as a query parameter
pub fn encode_url(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, percent_encoding::NON_ALPHANUMERIC).to_string()
}

/// Link to the load-more endpoint for a cursor
pub fn load_more_url(config: &SiteConfig, cursor: &str) -> String {
    format!(
        "{}?cursor={}",
        url_for(config, "/api/posts"),
        encode_url(cursor)
    )
}
