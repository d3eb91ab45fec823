//! Initial loader - builds the first page of the listing
//!
//! Runs once per generation: queries the content source for the first page
//! of posts and returns it as static props, together with the preview flag
//! and the revalidation interval.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SiteConfig;
use crate::content::{normalize_all, ContentError};
use crate::listing::{Cursor, Listing};
use crate::source::{ContentSource, FetchError, Query};

/// Preview state of the request being generated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewContext {
    /// Whether draft content should be shown
    pub preview: bool,
    /// Content ref that exposes the drafts
    pub reference: Option<String>,
}

impl PreviewContext {
    /// Published content only
    pub fn published() -> Self {
        Self::default()
    }

    /// Preview mode for a given ref
    pub fn with_ref(reference: impl Into<String>) -> Self {
        Self {
            preview: true,
            reference: Some(reference.into()),
        }
    }

    /// The ref to query with; none outside preview mode
    fn query_ref(&self) -> Option<String> {
        if self.preview {
            self.reference.clone()
        } else {
            None
        }
    }
}

/// Props handed to the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Props {
    #[serde(rename = "postsPagination")]
    pub posts_pagination: Listing,
    pub preview: bool,
}

/// Output of one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticProps {
    pub props: Props,
    /// Seconds until the listing should be generated again
    pub revalidate: u64,
}

/// Errors that abort generation
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("content source unavailable: {0}")]
    ContentSourceUnavailable(#[source] FetchError),

    #[error(transparent)]
    MalformedRecord(#[from] ContentError),
}

/// Query the first page of posts and build the static props
///
/// Any failure is fatal: no partial listing is ever produced.
pub async fn load_static_props<S: ContentSource>(
    source: &S,
    preview: &PreviewContext,
    config: &SiteConfig,
) -> Result<StaticProps, LoadError> {
    let query = Query::from_config(&config.content_source).with_ref(preview.query_ref());

    let page = source
        .query(&query)
        .await
        .map_err(LoadError::ContentSourceUnavailable)?;

    let posts = normalize_all(page.results)?;
    let listing = Listing::new(posts, page.next_page.map(Cursor::new));

    tracing::info!(
        "Loaded {} posts (preview: {}, more pages: {})",
        listing.items.len(),
        preview.preview,
        listing.has_more()
    );

    Ok(StaticProps {
        props: Props {
            posts_pagination: listing,
            preview: preview.preview,
        },
        revalidate: config.revalidate,
    })
}
