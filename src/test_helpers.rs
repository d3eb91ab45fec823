//! Shared fixtures for unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::content::{PageResponse, RawData, RawRecord};
use crate::listing::Cursor;
use crate::pager::PageFetcher;
use crate::source::{ContentSource, FetchError, Query};

/// Ref that unlocks draft documents in [`FakeSource`]
pub const PREVIEW_REF: &str = "preview-ref";

/// A post record as the content source would return it
pub fn raw_post(uid: &str, date: Option<&str>) -> RawRecord {
    RawRecord {
        id: Some(format!("id-{uid}")),
        uid: Some(uid.to_string()),
        doc_type: Some("posts".to_string()),
        first_publication_date: date.map(String::from),
        last_publication_date: None,
        data: Some(RawData {
            title: Some(format!("Title {uid}")),
            subtitle: Some(format!("Subtitle {uid}")),
            author: Some(format!("Author {uid}")),
        }),
    }
}

/// In-memory content source with published and draft documents
///
/// Pages are cut from the document list by `page`/`pageSize`, and next-page
/// cursors are URLs under [`FakeSource::endpoint`]. Clones share state.
#[derive(Clone)]
pub struct FakeSource {
    pub published: Vec<RawRecord>,
    pub drafts: Vec<RawRecord>,
    unavailable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl FakeSource {
    pub fn new(published: Vec<RawRecord>, drafts: Vec<RawRecord>) -> Self {
        Self {
            published,
            drafts,
            unavailable: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// Published posts with the given uids, dated one day apart
    pub fn with_posts(uids: &[&str]) -> Self {
        let published = uids
            .iter()
            .enumerate()
            .map(|(i, uid)| raw_post(uid, Some(&format!("2021-04-{:02}T12:00:00+0000", i + 1))))
            .collect();
        Self::new(published, Vec::new())
    }

    /// Make every request wait for [`FakeSource::release`]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of requests served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn endpoint(&self) -> &'static str {
        "https://cms.test/api/v2"
    }

    /// Cursor for a page of the published documents
    pub fn cursor(&self, page: u32, page_size: u32) -> Cursor {
        self.cursor_for(page, page_size, "master")
    }

    fn cursor_for(&self, page: u32, page_size: u32, reference: &str) -> Cursor {
        Cursor::new(format!(
            "{}/documents/search?page={}&pageSize={}&ref={}",
            self.endpoint(),
            page,
            page_size,
            reference
        ))
    }

    async fn serve(
        &self,
        doc_type: Option<&str>,
        page: u32,
        page_size: u32,
        reference: &str,
    ) -> Result<PageResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                url: self.endpoint().to_string(),
                status: 503,
            });
        }

        let mut docs: Vec<&RawRecord> = self.published.iter().collect();
        if reference == PREVIEW_REF {
            docs.extend(self.drafts.iter());
        }
        if let Some(doc_type) = doc_type {
            docs.retain(|d| d.doc_type.as_deref() == Some(doc_type));
        }

        let page = page.max(1);
        let size = page_size.max(1) as usize;
        let start = (page as usize - 1) * size;
        let results: Vec<RawRecord> = docs.iter().skip(start).take(size).map(|d| (*d).clone()).collect();
        let total_pages = docs.len().div_ceil(size) as u32;
        let next_page = (start + size < docs.len())
            .then(|| self.cursor_for(page + 1, page_size, reference).as_str().to_string());

        Ok(PageResponse {
            results,
            next_page,
            page: Some(page),
            results_per_page: Some(size as u32),
            total_results_size: Some(docs.len() as u32),
            total_pages: Some(total_pages),
            ..Default::default()
        })
    }
}

impl ContentSource for FakeSource {
    async fn query(&self, query: &Query) -> Result<PageResponse, FetchError> {
        let reference = query.reference.as_deref().unwrap_or("master");
        self.serve(
            query.document_type(),
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(20),
            reference,
        )
        .await
    }
}

impl PageFetcher for FakeSource {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<PageResponse, FetchError> {
        let url = reqwest::Url::parse(cursor.as_str())
            .map_err(|_| FetchError::ForeignCursor(cursor.to_string()))?;

        let mut page = 1;
        let mut page_size = 20;
        let mut reference = "master".to_string();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "page" => page = value.parse().unwrap_or(1),
                "pageSize" => page_size = value.parse().unwrap_or(20),
                "ref" => reference = value.into_owned(),
                _ => {}
            }
        }

        self.serve(Some("posts"), page, page_size, &reference).await
    }
}
