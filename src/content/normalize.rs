//! Normalization of content-source records into posts

use thiserror::Error;

use super::{Post, PostData, PublicationDate, RawRecord};

/// Errors raised while normalizing content
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Malformed record {id}: missing `{field}`")]
    MalformedRecord { id: String, field: &'static str },
}

/// Conversion into a render-ready [`Post`]
pub trait Normalize {
    fn normalize(self) -> Result<Post, ContentError>;
}

impl Normalize for RawRecord {
    fn normalize(self) -> Result<Post, ContentError> {
        let id = self
            .uid
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "<unknown>".to_string());
        let malformed = |field| ContentError::MalformedRecord {
            id: id.clone(),
            field,
        };

        let data = self.data.ok_or_else(|| malformed("data"))?;
        let uid = self.uid.ok_or_else(|| malformed("uid"))?;
        let title = data.title.ok_or_else(|| malformed("data.title"))?;
        let subtitle = data.subtitle.ok_or_else(|| malformed("data.subtitle"))?;
        let author = data.author.ok_or_else(|| malformed("data.author"))?;

        Ok(Post {
            uid,
            first_publication_date: self.first_publication_date.map(PublicationDate::new),
            data: PostData {
                title,
                subtitle,
                author,
            },
        })
    }
}

impl Normalize for Post {
    fn normalize(self) -> Result<Post, ContentError> {
        Ok(self)
    }
}

/// Normalize one record
pub fn normalize<R: Normalize>(record: R) -> Result<Post, ContentError> {
    record.normalize()
}

/// Normalize a page of records, stopping at the first malformed one
pub fn normalize_all<R, I>(records: I) -> Result<Vec<Post>, ContentError>
where
    R: Normalize,
    I: IntoIterator<Item = R>,
{
    records.into_iter().map(Normalize::normalize).collect()
}
