//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Environment variable overriding `content_source.access_token`
pub const ENV_ACCESS_TOKEN: &str = "POSTLIST_ACCESS_TOKEN";

/// Environment variable overriding `content_source.endpoint`
pub const ENV_ENDPOINT: &str = "POSTLIST_ENDPOINT";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub languages_dir: String,

    // Date format (Moment.js tokens)
    pub date_format: String,

    // Content source
    #[serde(default)]
    pub content_source: ContentSourceConfig,

    // Seconds a generated listing stays fresh
    pub revalidate: u64,

    #[serde(default)]
    pub preview: PreviewConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: String::new(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            languages_dir: "languages".to_string(),

            date_format: "DD MMM YYYY".to_string(),

            content_source: ContentSourceConfig::default(),

            revalidate: 60 * 60 * 24,

            preview: PreviewConfig::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `POSTLIST_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|t| !t.is_empty()) {
            self.content_source.access_token = Some(token);
            tracing::debug!("Using access token from {}", ENV_ACCESS_TOKEN);
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|e| !e.is_empty()) {
            tracing::debug!("Using endpoint from {}: {}", ENV_ENDPOINT, endpoint);
            self.content_source.endpoint = endpoint;
        }
    }
}

/// Headless content source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSourceConfig {
    /// API root, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type queried for the listing
    pub document_type: String,
    /// Field allowlist sent as `fetch`
    #[serde(default)]
    pub fetch: Vec<String>,
    /// Results per page; kept small so the listing paginates early
    pub page_size: u32,
    pub orderings: Option<String>,
    pub lang: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for ContentSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            fetch: vec![
                "posts.title".to_string(),
                "posts.subtitle".to_string(),
                "posts.author".to_string(),
            ],
            page_size: 1,
            orderings: None,
            lang: None,
            timeout: 30,
        }
    }
}

/// Preview mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Cookie carrying the preview ref
    pub cookie: String,
    /// Lifetime of the preview cookie in seconds
    pub max_age: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cookie: "postlist.preview".to_string(),
            max_age: 60 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.language, "pt-BR");
        assert_eq!(config.revalidate, 86400);
        assert_eq!(config.content_source.page_size, 1);
        assert_eq!(config.content_source.document_type, "posts");
        assert_eq!(config.content_source.fetch.len(), 3);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en
content_source:
  endpoint: https://blog.cdn.prismic.io/api/v2
  page_size: 5
revalidate: 600
github_username: someone
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.language, "en");
        assert_eq!(
            config.content_source.endpoint,
            "https://blog.cdn.prismic.io/api/v2"
        );
        assert_eq!(config.content_source.page_size, 5);
        // Unspecified nested fields keep their defaults
        assert_eq!(config.content_source.document_type, "posts");
        assert_eq!(config.revalidate, 600);
        assert!(config.extra.contains_key("github_username"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.apply_overrides(|key| match key {
            ENV_ACCESS_TOKEN => Some("secret".to_string()),
            ENV_ENDPOINT => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.content_source.access_token.as_deref(), Some("secret"));
        // Empty values are ignored
        assert_eq!(config.content_source.endpoint, "http://localhost:8000/api/v2");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: From File\ndate_format: YYYY-MM-DD\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "From File");
        assert_eq!(config.date_format, "YYYY-MM-DD");
    }
}
