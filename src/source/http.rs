//! HTTP client for a Prismic-compatible content API

use serde::Deserialize;
use std::time::Duration;

use super::{ContentSource, FetchError, Query};
use crate::config::ContentSourceConfig;
use crate::content::PageResponse;
use crate::listing::Cursor;
use crate::pager::PageFetcher;

/// API root document, listing the available content refs
#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Content source reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl HttpContentSource {
    /// Create a client for the configured endpoint
    pub fn new(config: &ContentSourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .user_agent(concat!("postlist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Look up the ref of the published content
    pub async fn master_ref(&self) -> Result<String, FetchError> {
        let url = match &self.access_token {
            Some(token) => format!(
                "{}?access_token={}",
                self.endpoint,
                crate::helpers::encode_url(token)
            ),
            None => self.endpoint.clone(),
        };

        let info: ApiInfo = serde_json::from_str(&self.get_body(&url).await?)?;
        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(FetchError::NoMasterRef)
    }

    async fn get_page(&self, url: &str) -> Result<PageResponse, FetchError> {
        Ok(PageResponse::from_json(&self.get_body(url).await?)?)
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

impl ContentSource for HttpContentSource {
    async fn query(&self, query: &Query) -> Result<PageResponse, FetchError> {
        let reference = match &query.reference {
            Some(r) => r.clone(),
            None => self.master_ref().await?,
        };

        let url = query.to_url(&self.endpoint, &reference, self.access_token.as_deref());
        self.get_page(&url).await
    }
}

impl PageFetcher for HttpContentSource {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<PageResponse, FetchError> {
        self.get_page(cursor.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query as QueryParams, routing::get, Json, Router};
    use std::collections::HashMap;

    /// Serve a tiny fake API on a random local port
    async fn spawn_api() -> String {
        let app = Router::new()
            .route(
                "/api/v2",
                get(|| async {
                    Json(serde_json::json!({
                        "refs": [
                            { "id": "preview", "ref": "draft-ref", "isMasterRef": false },
                            { "id": "master", "ref": "master-ref", "isMasterRef": true }
                        ]
                    }))
                }),
            )
            .route(
                "/api/v2/documents/search",
                get(|QueryParams(params): QueryParams<HashMap<String, String>>| async move {
                    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
                    let next = (page == 1).then(|| "/api/v2/documents/search?page=2".to_string());
                    Json(serde_json::json!({
                        "page": page,
                        "next_page": next,
                        "results": [{
                            "uid": format!("{}-{}", params.get("ref").cloned().unwrap_or_default(), page),
                            "first_publication_date": null,
                            "data": { "title": params.get("q"), "subtitle": "s", "author": "a" }
                        }]
                    }))
                }),
            )
            .route("/broken", get(|| async { "<html>not json</html>" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn source(base: &str) -> HttpContentSource {
        let config = ContentSourceConfig {
            endpoint: format!("{}/api/v2", base),
            timeout: 5,
            ..Default::default()
        };
        HttpContentSource::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_query_uses_master_ref() {
        let base = spawn_api().await;
        let source = source(&base);

        assert_eq!(source.master_ref().await.unwrap(), "master-ref");

        let page = source
            .query(&Query::from_config(&ContentSourceConfig::default()))
            .await
            .unwrap();
        assert_eq!(page.results[0].uid.as_deref(), Some("master-ref-1"));
        let title = page.results[0].data.as_ref().unwrap().title.as_deref();
        assert_eq!(title, Some(r#"[[at(document.type, "posts")]]"#));
        assert!(page.next_page.is_some());
    }

    #[tokio::test]
    async fn test_query_with_preview_ref() {
        let base = spawn_api().await;
        let query = Query::documents_of_type("posts").with_ref(Some("draft-ref".to_string()));
        let page = source(&base).query(&query).await.unwrap();
        assert_eq!(page.results[0].uid.as_deref(), Some("draft-ref-1"));
    }

    #[tokio::test]
    async fn test_fetch_page_follows_cursor() {
        let base = spawn_api().await;
        let cursor = Cursor::new(format!("{}/api/v2/documents/search?page=2&ref=master-ref", base));
        let page = source(&base).fetch_page(&cursor).await.unwrap();
        assert_eq!(page.page, Some(2));
        assert!(page.next_page.is_none());
    }

    #[tokio::test]
    async fn test_fetch_errors() {
        let base = spawn_api().await;
        let source = source(&base);

        let err = source
            .fetch_page(&Cursor::new(format!("{}/broken", base)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));

        let err = source
            .fetch_page(&Cursor::new(format!("{}/missing", base)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }
}
