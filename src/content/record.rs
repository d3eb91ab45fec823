//! Raw content-source records and page responses

use serde::{Deserialize, Serialize};

/// A document as returned by the content source, before normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source-internal document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Stable, human-readable identifier
    #[serde(default)]
    pub uid: Option<String>,

    /// Custom type of the document ("posts")
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    /// ISO-8601 timestamp, or null for documents never published
    #[serde(default)]
    pub first_publication_date: Option<String>,

    /// ISO-8601 timestamp of the latest publication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_publication_date: Option<String>,

    /// Document fields, restricted by the query's `fetch` allowlist
    #[serde(default)]
    pub data: Option<RawData>,
}

/// The `data` object of a post document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// One page of query results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResponse {
    /// Documents on this page
    #[serde(default)]
    pub results: Vec<RawRecord>,

    /// URL of the next page, null on the last page
    #[serde(default)]
    pub next_page: Option<String>,

    /// URL of the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,

    /// 1-based page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_per_page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl PageResponse {
    /// Parse a page response from a JSON body
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}
