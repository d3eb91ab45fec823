//! Content module - raw records, posts, and normalization

mod normalize;
mod post;
mod record;

pub use normalize::{normalize, normalize_all, ContentError, Normalize};
pub use post::{Post, PostData, PublicationDate};
pub use record::{PageResponse, RawData, RawRecord};
