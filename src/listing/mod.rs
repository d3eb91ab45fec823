//! Listing state - the ordered posts loaded so far and the next-page cursor
//!
//! [`ListingState`] is the single owner of a listing for one page view. It is
//! seeded once from the initially generated page, then grows append-only as
//! further pages arrive. [`ListingSession`] wraps it for use across tasks.

mod session;

pub use session::ListingSession;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::content::Post;

/// Opaque token identifying the next page: a fetchable URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the cursor points at the same scheme, host and port as `base`
    pub fn same_origin(&self, base: &str) -> bool {
        match (reqwest::Url::parse(&self.0), reqwest::Url::parse(base)) {
            (Ok(a), Ok(b)) => {
                a.scheme() == b.scheme()
                    && a.host_str() == b.host_str()
                    && a.port_or_known_default() == b.port_or_known_default()
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Posts loaded so far plus the cursor of the next page
///
/// Serializes as `{ "results": [...], "next_page": ... }`, the shape of a
/// content-source page response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "results")]
    pub items: Vec<Post>,
    #[serde(rename = "next_page")]
    pub next_cursor: Option<Cursor>,
}

impl Listing {
    pub fn new(items: Vec<Post>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }

    /// Whether a further page can be requested
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Client-observable phase of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not seeded yet
    Empty,
    /// Seeded with the first page
    Initial,
    /// A next-page fetch is in flight
    Loading,
    /// The latest page was appended
    Loaded,
    /// The latest fetch failed; items and cursor are as before it
    Error,
    /// No cursor left
    Terminal,
}

/// Listing state transition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("listing was already seeded")]
    AlreadySeeded,

    #[error("listing has not been seeded")]
    NotSeeded,

    #[error("a page load is already in flight")]
    LoadInFlight,

    #[error("no further pages")]
    NoMorePages,

    #[error("post {0} is already in the listing")]
    DuplicatePost(String),
}

type Subscriber = Box<dyn Fn(&Listing, Phase) + Send + Sync>;

/// Owner of one listing and its state machine
pub struct ListingState {
    listing: Listing,
    phase: Phase,
    uids: HashSet<String>,
    subscribers: Vec<(usize, Subscriber)>,
    next_subscriber: usize,
}

impl ListingState {
    /// Create an unseeded state
    pub fn new() -> Self {
        Self {
            listing: Listing::default(),
            phase: Phase::Empty,
            uids: HashSet::new(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Create a state seeded with `initial`
    pub fn seeded(initial: Listing) -> Result<Self, ListingError> {
        let mut state = Self::new();
        state.seed(initial)?;
        Ok(state)
    }

    /// Set the initial page; allowed once
    pub fn seed(&mut self, initial: Listing) -> Result<(), ListingError> {
        if self.phase != Phase::Empty {
            return Err(ListingError::AlreadySeeded);
        }

        let uids = unique_uids(&HashSet::new(), &initial.items)?;
        self.uids = uids;
        self.phase = if initial.has_more() {
            Phase::Initial
        } else {
            Phase::Terminal
        };
        self.listing = initial;

        tracing::debug!(
            "Listing seeded with {} posts (more: {})",
            self.listing.items.len(),
            self.listing.has_more()
        );
        self.notify();
        Ok(())
    }

    /// Mark a next-page load as started and hand out the cursor to fetch
    ///
    /// Only one load may be in flight at a time.
    pub fn begin_load(&mut self) -> Result<Cursor, ListingError> {
        match self.phase {
            Phase::Empty => return Err(ListingError::NotSeeded),
            Phase::Loading => return Err(ListingError::LoadInFlight),
            _ => {}
        }

        let cursor = self
            .listing
            .next_cursor
            .clone()
            .ok_or(ListingError::NoMorePages)?;

        self.phase = Phase::Loading;
        self.notify();
        Ok(cursor)
    }

    /// Append a fetched page and replace the cursor with the page's own
    ///
    /// Posts keep their arrival order. A page that would repeat a post
    /// already in the listing is rejected whole and nothing changes.
    pub fn append_page(
        &mut self,
        next_cursor: Option<Cursor>,
        posts: Vec<Post>,
    ) -> Result<usize, ListingError> {
        if self.phase == Phase::Empty {
            return Err(ListingError::NotSeeded);
        }

        let new_uids = unique_uids(&self.uids, &posts)?;
        let appended = posts.len();

        self.uids.extend(new_uids);
        self.listing.items.extend(posts);
        self.listing.next_cursor = next_cursor;
        self.phase = if self.listing.has_more() {
            Phase::Loaded
        } else {
            Phase::Terminal
        };

        tracing::debug!(
            "Appended {} posts, listing now has {}",
            appended,
            self.listing.items.len()
        );
        self.notify();
        Ok(appended)
    }

    /// Abandon an in-flight load, leaving items and cursor untouched
    pub fn fail_load(&mut self) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Error;
            self.notify();
        }
    }

    /// Register a callback run after every state change
    pub fn subscribe(&mut self, callback: impl Fn(&Listing, Phase) + Send + Sync + 'static) -> usize {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: usize) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a "load more" control should be actionable right now
    pub fn can_load_more(&self) -> bool {
        self.listing.has_more() && !matches!(self.phase, Phase::Empty | Phase::Loading)
    }

    fn notify(&self) {
        for (_, callback) in &self.subscribers {
            callback(&self.listing, self.phase);
        }
    }
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingState")
            .field("listing", &self.listing)
            .field("phase", &self.phase)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Collect the uids of `posts`, failing on any already in `existing` or repeated
fn unique_uids(existing: &HashSet<String>, posts: &[Post]) -> Result<HashSet<String>, ListingError> {
    let mut seen = HashSet::with_capacity(posts.len());
    for post in posts {
        if existing.contains(&post.uid) || !seen.insert(post.uid.clone()) {
            return Err(ListingError::DuplicatePost(post.uid.clone()));
        }
    }
    Ok(seen)
}
