//! Post model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A render-ready blog post
///
/// Serializes to the same JSON shape as a [`RawRecord`](super::RawRecord),
/// so a post written out as props can be read back and normalized again
/// without change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable identifier, unique within a listing
    pub uid: String,

    /// Publication timestamp as supplied by the content source
    pub first_publication_date: Option<PublicationDate>,

    /// Text fields
    pub data: PostData,
}

/// Text fields of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl Post {
    /// Create a post from its parts
    pub fn new(
        uid: impl Into<String>,
        first_publication_date: Option<PublicationDate>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            first_publication_date,
            data: PostData {
                title: title.into(),
                subtitle: subtitle.into(),
                author: author.into(),
            },
        }
    }
}

/// An unformatted publication timestamp
///
/// Holds the source's ISO-8601 text verbatim. Display formatting is a
/// render-time concern (see [`crate::helpers::format_publication_date`]),
/// so the stored value can always be parsed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationDate(String);

impl PublicationDate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The timestamp exactly as received
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the timestamp
    ///
    /// Accepts RFC 3339 and the `+0000` offset form the content source emits.
    pub fn parse(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.0)
            .or_else(|_| DateTime::parse_from_str(&self.0, "%Y-%m-%dT%H:%M:%S%z"))
            .or_else(|_| DateTime::parse_from_str(&self.0, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
    }
}

impl std::fmt::Display for PublicationDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
