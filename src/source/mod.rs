//! Content source abstraction
//!
//! The headless CMS the listing is read from. [`ContentSource`] runs predicate
//! queries; [`HttpContentSource`] is the implementation that talks to a
//! Prismic-compatible REST API.

mod http;
mod query;

pub use http::HttpContentSource;
pub use query::{Predicate, Query};

use std::future::Future;
use thiserror::Error;

use crate::content::PageResponse;

/// Errors talking to the content source
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("content source has no master ref")]
    NoMasterRef,

    #[error("refusing to follow cursor {0}")]
    ForeignCursor(String),
}

/// A queryable content source
pub trait ContentSource: Send + Sync {
    /// Run a query and return the first matching page
    fn query(&self, query: &Query) -> impl Future<Output = Result<PageResponse, FetchError>> + Send;
}
