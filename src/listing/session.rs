//! Shared handle to a listing for one client session

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Cursor, Listing, ListingError, ListingState, Phase};
use crate::content::Post;

/// Cloneable, thread-safe handle to a [`ListingState`]
///
/// The lock is never held across an await point; the in-flight phase is what
/// keeps two loads from overlapping. Subscribers run with the lock held and
/// must not call back into the session.
#[derive(Clone, Debug)]
pub struct ListingSession {
    state: Arc<Mutex<ListingState>>,
    preview: bool,
}

impl ListingSession {
    /// Start a session seeded with the initial page
    pub fn new(initial: Listing, preview: bool) -> Result<Self, ListingError> {
        Ok(Self {
            state: Arc::new(Mutex::new(ListingState::seeded(initial)?)),
            preview,
        })
    }

    fn lock(&self) -> MutexGuard<'_, ListingState> {
        // A panicking subscriber must not wedge the listing
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the session shows draft content
    pub fn preview(&self) -> bool {
        self.preview
    }

    pub fn begin_load(&self) -> Result<Cursor, ListingError> {
        self.lock().begin_load()
    }

    pub fn append_page(
        &self,
        next_cursor: Option<Cursor>,
        posts: Vec<Post>,
    ) -> Result<usize, ListingError> {
        self.lock().append_page(next_cursor, posts)
    }

    pub fn fail_load(&self) {
        self.lock().fail_load()
    }

    pub fn subscribe(&self, callback: impl Fn(&Listing, Phase) + Send + Sync + 'static) -> usize {
        self.lock().subscribe(callback)
    }

    pub fn unsubscribe(&self, id: usize) {
        self.lock().unsubscribe(id)
    }

    /// Copy of the current listing
    pub fn snapshot(&self) -> Listing {
        self.lock().listing().clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    pub fn can_load_more(&self) -> bool {
        self.lock().can_load_more()
    }
}
