//! postlist: a paginated blog post listing backed by a headless content source
//!
//! The first page of posts is generated ahead of time from the content
//! source; further pages are loaded on demand by following the opaque
//! next-page cursor the source hands out, and appended to the listing.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod loader;
pub mod pager;
pub mod server;
pub mod source;
pub mod templates;

#[cfg(test)]
mod test_helpers;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The main application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Language override directory
    pub languages_dir: PathBuf,
}

impl Blog {
    /// Create a new instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let languages_dir = base_dir.join(&config.languages_dir);

        Self {
            config,
            base_dir,
            public_dir,
            languages_dir,
        }
    }

    /// Template helpers with the site's locale loaded
    pub fn helpers(&self) -> Result<helpers::Helpers> {
        let mut i18n = i18n::I18n::new(&self.config.language);
        i18n.load_languages(&self.languages_dir)?;
        Ok(helpers::Helpers::new(self.config.clone(), i18n))
    }

    /// Renderer for the listing templates
    pub fn renderer(&self) -> Result<templates::TemplateRenderer> {
        templates::TemplateRenderer::new(self.helpers()?)
    }

    /// Site fields exposed to templates
    pub fn site_data(&self) -> templates::SiteData {
        templates::SiteData {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            language: self.config.language.clone(),
        }
    }

    /// HTTP client for the configured content source
    pub fn content_source(&self) -> Result<source::HttpContentSource> {
        Ok(source::HttpContentSource::new(&self.config.content_source)?)
    }

    /// Hash of the effective configuration
    ///
    /// Hashes the YAML form, which can represent anything `_config.yml` can.
    pub fn config_hash(&self) -> u64 {
        let serialized = match serde_yaml::to_string(&self.config) {
            Ok(yaml) => yaml,
            Err(e) => {
                tracing::warn!("Failed to serialize config for hashing: {}", e);
                format!("{:?}", self.config)
            }
        };
        cache::hash_content(&serialized)
    }

    /// Generate the static listing page
    pub async fn generate(&self, force: bool) -> Result<()> {
        commands::generate::run(self, force).await.map(|_| ())
    }

    /// Clean the public directory and build cache
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
