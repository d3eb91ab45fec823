//! Helper functions for templates
//!
//! URL generation and date formatting shared by the HTML templates and the
//! terminal views.

mod date;
mod url;

pub use date::*;
pub use url::*;

use chrono_tz::Tz;

use crate::config::SiteConfig;
use crate::content::PublicationDate;
use crate::i18n::I18n;

/// Collection of helper functions bound to a site configuration
#[derive(Debug, Clone)]
pub struct Helpers {
    config: SiteConfig,
    i18n: I18n,
    tz: Tz,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig, i18n: I18n) -> Self {
        let tz = parse_timezone(&config.timezone);
        Self { config, i18n, tz }
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// Absolute URL including the site origin
    pub fn full_url_for(&self, path: &str) -> String {
        full_url_for(&self.config, path)
    }

    /// Link to the load-more endpoint
    pub fn load_more_url(&self, cursor: &str) -> String {
        load_more_url(&self.config, cursor)
    }

    /// Format a publication date with the site's date format
    pub fn date(&self, date: Option<&PublicationDate>) -> String {
        format_publication_date(date, &self.config.date_format, self.tz, &self.i18n)
    }

    /// Translate an interface string
    pub fn t(&self, key: &str) -> String {
        self.i18n.get(key)
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }
}
