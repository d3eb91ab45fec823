//! Predicate queries against the content source's search API

use crate::config::ContentSourceConfig;
use crate::helpers::encode_url;

/// A single query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `at(path, "value")`
    At { path: String, value: String },
    /// `any(path, ["a", "b"])`
    Any { path: String, values: Vec<String> },
    /// `not(path, "value")`
    Not { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn any<I, S>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Any {
            path: path.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Not {
            path: path.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::At { path, value } => write!(f, "[at({}, {:?})]", path, value),
            Self::Not { path, value } => write!(f, "[not({}, {:?})]", path, value),
            Self::Any { path, values } => {
                let list: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
                write!(f, "[any({}, [{}])]", path, list.join(", "))
            }
        }
    }
}

/// A search query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
    pub orderings: Option<String>,
    pub lang: Option<String>,
    /// Content ref; the master ref is used when absent
    pub reference: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for all documents of a custom type
    pub fn documents_of_type(doc_type: &str) -> Self {
        Self::new().predicate(Predicate::at("document.type", doc_type))
    }

    /// Query for the listing as configured
    pub fn from_config(config: &ContentSourceConfig) -> Self {
        let mut query = Self::documents_of_type(&config.document_type)
            .fetch(config.fetch.iter().cloned())
            .page_size(config.page_size);
        query.orderings = config.orderings.clone();
        query.lang = config.lang.clone();
        query
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page.max(1));
        self
    }

    pub fn with_ref(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// The custom type this query is restricted to, if any
    pub fn document_type(&self) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::At { path, value } if path == "document.type" => Some(value.as_str()),
            _ => None,
        })
    }

    /// The `q` parameter: all predicates wrapped in one list
    pub fn q(&self) -> String {
        let inner: String = self.predicates.iter().map(ToString::to_string).collect();
        format!("[{}]", inner)
    }

    /// Build the `documents/search` URL
    pub fn to_url(&self, endpoint: &str, reference: &str, access_token: Option<&str>) -> String {
        let mut params = vec![("ref", reference.to_string())];

        if !self.predicates.is_empty() {
            params.push(("q", self.q()));
        }
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(orderings) = &self.orderings {
            params.push(("orderings", orderings.clone()));
        }
        if let Some(lang) = &self.lang {
            params.push(("lang", lang.clone()));
        }
        if let Some(token) = access_token {
            params.push(("access_token", token.to_string()));
        }

        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_url(v)))
            .collect();

        format!(
            "{}/documents/search?{}",
            endpoint.trim_end_matches('/'),
            query.join("&")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_syntax() {
        assert_eq!(
            Predicate::at("document.type", "posts").to_string(),
            r#"[at(document.type, "posts")]"#
        );
        assert_eq!(
            Predicate::any("document.tags", ["a", "b"]).to_string(),
            r#"[any(document.tags, ["a", "b"])]"#
        );
        assert_eq!(
            Predicate::not("my.posts.author", "x").to_string(),
            r#"[not(my.posts.author, "x")]"#
        );
    }

    #[test]
    fn test_from_config() {
        let query = Query::from_config(&ContentSourceConfig::default());
        assert_eq!(query.document_type(), Some("posts"));
        assert_eq!(query.page_size, Some(1));
        assert_eq!(query.fetch, ["posts.title", "posts.subtitle", "posts.author"]);
        assert_eq!(query.q(), r#"[[at(document.type, "posts")]]"#);
    }

    #[test]
    fn test_to_url() {
        let query = Query::documents_of_type("posts")
            .fetch(["posts.title"])
            .page_size(0)
            .page(2);
        let url = query.to_url("https://blog.cdn.prismic.io/api/v2/", "YF-master", Some("tok"));

        assert!(url.starts_with("https://blog.cdn.prismic.io/api/v2/documents/search?ref=YF%2Dmaster&q="));
        assert!(url.contains("&fetch=posts%2Etitle"));
        // Page size is clamped to at least one
        assert!(url.contains("&pageSize=1"));
        assert!(url.contains("&page=2"));
        assert!(url.ends_with("&access_token=tok"));
    }
}
