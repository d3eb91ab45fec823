//! Built-in listing templates using the Tera template engine
//!
//! All templates are embedded in the binary. Publication dates reach the
//! templates raw and are formatted by the `pub_date` filter while rendering.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::{Post, PublicationDate};
use crate::helpers::Helpers;
use crate::listing::{Listing, Phase};
use crate::loader::Props;

/// Site fields exposed to templates
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
}

/// Template renderer for the listing page
pub struct TemplateRenderer {
    tera: Tera,
    helpers: Helpers,
}

impl TemplateRenderer {
    /// Create a new renderer with all listing templates loaded
    pub fn new(helpers: Helpers) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("index.html", include_str!("listing/index.html")),
            ("fragment.html", include_str!("listing/fragment.html")),
            // Partials
            (
                "partials/post.html",
                include_str!("listing/partials/post.html"),
            ),
            (
                "partials/load_more.html",
                include_str!("listing/partials/load_more.html"),
            ),
            (
                "partials/preview.html",
                include_str!("listing/partials/preview.html"),
            ),
            (
                "partials/script.html",
                include_str!("listing/partials/script.html"),
            ),
            (
                "partials/style.html",
                include_str!("listing/partials/style.html"),
            ),
        ])?;

        // Register custom filters
        let date_helpers = helpers.clone();
        tera.register_filter(
            "pub_date",
            move |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                pub_date_filter(&date_helpers, value)
            },
        );

        Ok(Self { tera, helpers })
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    /// Render the full listing page
    pub fn render_page(&self, props: &Props, site: &SiteData) -> Result<String> {
        let listing = &props.posts_pagination;

        let mut context = self.base_context();
        context.insert("site", site);
        context.insert("listing", listing);
        context.insert("preview", &props.preview);
        context.insert("load_more_url", &self.load_more_url(listing));
        context.insert("exit_preview_url", &self.helpers.url_for("/api/exit-preview"));
        context.insert("canonical_url", &self.helpers.full_url_for("/"));

        Ok(self.tera.render("index.html", &context)?)
    }

    /// Render list items for posts appended by a load-more request
    pub fn render_posts(&self, posts: &[Post]) -> Result<String> {
        let mut context = self.base_context();
        context.insert("posts", posts);
        Ok(self.tera.render("fragment.html", &context)?)
    }

    /// Endpoint the "load more" control calls; present iff the listing has a cursor
    pub fn load_more_url(&self, listing: &Listing) -> Option<String> {
        listing
            .next_cursor
            .as_ref()
            .map(|cursor| self.helpers.load_more_url(cursor.as_str()))
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("root", &self.helpers.url_for("/"));
        context.insert("t", &self.helpers.i18n().get_all_translations());
        context
    }

    /// Plain-text rendering for terminals
    pub fn render_text(&self, listing: &Listing, phase: Phase, preview: bool) -> String {
        let mut out = String::new();

        if preview {
            out.push_str(&format!("** {} **\n\n", self.helpers.t("exit_preview")));
        }

        if listing.items.is_empty() {
            out.push_str(&self.helpers.t("empty"));
            out.push('\n');
        }

        for post in &listing.items {
            out.push_str(&post.data.title);
            out.push('\n');
            out.push_str(&format!("  {}\n", post.data.subtitle));

            let date = self.helpers.date(post.first_publication_date.as_ref());
            if date.is_empty() {
                out.push_str(&format!("  {}\n\n", post.data.author));
            } else {
                out.push_str(&format!("  {} · {}\n\n", date, post.data.author));
            }
        }

        match phase {
            Phase::Loading => out.push_str(&format!("{}\n", self.helpers.t("loading"))),
            Phase::Error => out.push_str(&format!("{}\n", self.helpers.t("load_failed"))),
            _ => {}
        }

        if listing.has_more() && phase != Phase::Loading {
            out.push_str(&format!("[Enter] {}\n", self.helpers.t("load_more")));
        }

        out
    }
}

/// Tera filter: format a raw publication date for display
fn pub_date_filter(helpers: &Helpers, value: &tera::Value) -> tera::Result<tera::Value> {
    match value {
        tera::Value::Null => Ok(tera::Value::String(String::new())),
        tera::Value::String(raw) => {
            let date = PublicationDate::new(raw.as_str());
            Ok(tera::Value::String(helpers.date(Some(&date))))
        }
        other => Err(tera::Error::msg(format!(
            "Filter `pub_date` expected a date string, got {}",
            other
        ))),
    }
}
