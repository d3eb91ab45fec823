//! Listing server
//!
//! Serves the generated listing page, regenerating it at most once per
//! revalidation interval, plus the load-more and preview endpoints the page
//! talks to. The server keeps no per-client listing state: each browser owns
//! its listing and hands the cursor back with every load-more request.

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::content::Post;
use crate::listing::Cursor;
use crate::loader::{load_static_props, PreviewContext};
use crate::pager::{PageFetcher, PageLoadError, Pager};
use crate::source::{ContentSource, FetchError};
use crate::templates::{SiteData, TemplateRenderer};
use crate::Blog;

/// Content source usable by the server
pub trait Source: ContentSource + PageFetcher + Clone + 'static {}

impl<T: ContentSource + PageFetcher + Clone + 'static> Source for T {}

/// Last generated published page
#[derive(Debug, Clone)]
struct CachedPage {
    html: String,
    generated_at: DateTime<Utc>,
}

/// Server state
pub struct ServerState<S> {
    source: S,
    pager: Pager<S>,
    renderer: TemplateRenderer,
    config: SiteConfig,
    site: SiteData,
    page: RwLock<Option<CachedPage>>,
    // Held while regenerating so concurrent stale requests share one rebuild
    refresh: Mutex<()>,
}

impl<S: Source> ServerState<S> {
    /// Create state for `blog`, following only cursors under `origin`
    pub fn new(blog: &Blog, source: S, origin: &str) -> Result<Self> {
        Ok(Self {
            pager: Pager::new(source.clone()).restrict_to(origin),
            source,
            renderer: blog.renderer()?,
            config: blog.config.clone(),
            site: blog.site_data(),
            page: RwLock::new(None),
            refresh: Mutex::new(()),
        })
    }

    fn is_fresh(&self, page: &CachedPage, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(page.generated_at).num_seconds();
        age >= 0 && (age as u64) < self.config.revalidate
    }

    /// The published page, regenerated when older than the revalidation interval
    ///
    /// A failed regeneration keeps serving the previous page.
    async fn published_page(&self, now: DateTime<Utc>) -> Result<String> {
        if let Some(page) = self.page.read().await.as_ref() {
            if self.is_fresh(page, now) {
                return Ok(page.html.clone());
            }
        }

        let _guard = self.refresh.lock().await;

        // Another request may have rebuilt it while we waited
        let stale = self.page.read().await.clone();
        if let Some(page) = &stale {
            if self.is_fresh(page, now) {
                return Ok(page.html.clone());
            }
        }

        match self.render(&PreviewContext::published()).await {
            Ok(html) => {
                tracing::info!("Regenerated listing page");
                *self.page.write().await = Some(CachedPage {
                    html: html.clone(),
                    generated_at: now,
                });
                Ok(html)
            }
            Err(e) => match stale {
                Some(page) => {
                    tracing::error!("Failed to regenerate listing, serving previous page: {:#}", e);
                    Ok(page.html)
                }
                None => Err(e),
            },
        }
    }

    async fn render(&self, preview: &PreviewContext) -> Result<String> {
        let props = load_static_props(&self.source, preview, &self.config).await?;
        self.renderer.render_page(&props.props, &self.site)
    }

    /// The preview ref carried by the request's cookie, if any
    fn preview_ref(&self, headers: &HeaderMap) -> Option<String> {
        let name = self.config.preview.cookie.as_str();
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
            .filter(|value| !value.is_empty())
    }

    fn preview_cookie(&self, value: &str, max_age: u64) -> String {
        format!(
            "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
            self.config.preview.cookie,
            utf8_percent_encode(value, NON_ALPHANUMERIC),
            self.renderer.helpers().url_for("/"),
            max_age
        )
    }
}

/// Build the router for `state`
///
/// Routes live under the site root, at the same paths the page links to.
pub fn router<S: Source>(state: Arc<ServerState<S>>) -> Router {
    let helpers = state.renderer.helpers();
    let home = helpers.url_for("/");
    let posts = helpers.url_for("/api/posts");
    let preview = helpers.url_for("/api/preview");
    let exit_preview = helpers.url_for("/api/exit-preview");

    let mut app = Router::new()
        .route(&home, get(index_handler::<S>))
        .route(&posts, get(posts_handler::<S>))
        .route(&preview, get(preview_handler::<S>))
        .route(&exit_preview, get(exit_preview_handler::<S>));

    // "/blog" as well as "/blog/"
    let bare_home = home.trim_end_matches('/');
    if !bare_home.is_empty() {
        app = app.route(bare_home, get(index_handler::<S>));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let source = blog.content_source()?;
    let origin = source.endpoint().to_string();
    let state = Arc::new(ServerState::new(blog, source, &origin)?);

    // Warm the cache; a failure here is retried on the first request
    if let Err(e) = state.published_page(Utc::now()).await {
        tracing::warn!("Initial generation failed: {:#}", e);
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler<S: Source>(
    State(state): State<Arc<ServerState<S>>>,
    headers: HeaderMap,
) -> Response {
    if let Some(reference) = state.preview_ref(&headers) {
        tracing::debug!("Rendering preview for ref {}", reference);
        return match state.render(&PreviewContext::with_ref(reference)).await {
            Ok(html) => ([(header::CACHE_CONTROL, "private, no-store")], Html(html)).into_response(),
            Err(e) => unavailable(&state, e),
        };
    }

    match state.published_page(Utc::now()).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => unavailable(&state, e),
    }
}

fn unavailable<S>(state: &ServerState<S>, e: anyhow::Error) -> Response {
    tracing::error!("Failed to render listing: {:#}", e);
    (
        StatusCode::BAD_GATEWAY,
        state.renderer.helpers().t("load_failed"),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct PostsParams {
    cursor: String,
}

/// One page of posts appended by the "load more" control
#[derive(Debug, Serialize)]
pub struct PostsPage {
    pub next_page: Option<Cursor>,
    pub results: Vec<Post>,
    /// Rendered list items for `results`
    pub html: String,
    /// Where the control should point next; absent on the last page
    pub load_more_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn posts_handler<S: Source>(
    State(state): State<Arc<ServerState<S>>>,
    Query(params): Query<PostsParams>,
) -> Response {
    let cursor = Cursor::new(params.cursor);

    let (next_page, results) = match state.pager.fetch_posts(&cursor).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("Failed to load page {}: {}", cursor, e);
            let status = match &e {
                PageLoadError::Fetch(FetchError::ForeignCursor(_)) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            };
            return (status, Json(ErrorBody { error: e.to_string() })).into_response();
        }
    };

    let html = match state.renderer.render_posts(&results) {
        Ok(html) => html,
        Err(e) => {
            tracing::error!("Failed to render posts: {:#}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let load_more_url = next_page
        .as_ref()
        .map(|next| state.renderer.helpers().load_more_url(next.as_str()));

    Json(PostsPage {
        next_page,
        results,
        html,
        load_more_url,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    #[serde(default)]
    token: String,
}

async fn preview_handler<S: Source>(
    State(state): State<Arc<ServerState<S>>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    if params.token.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    }

    tracing::info!("Entering preview mode");
    let cookie = state.preview_cookie(&params.token, state.config.preview.max_age);
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::temporary(&state.renderer.helpers().url_for("/")),
    )
        .into_response()
}

async fn exit_preview_handler<S: Source>(State(state): State<Arc<ServerState<S>>>) -> Response {
    tracing::info!("Leaving preview mode");
    let cookie = state.preview_cookie("", 0);
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::temporary(&state.renderer.helpers().url_for("/")),
    )
        .into_response()
}
