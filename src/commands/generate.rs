//! Generate the static listing page

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

use crate::cache::BuildCache;
use crate::loader::{load_static_props, PreviewContext};
use crate::source::ContentSource;
use crate::Blog;

/// Page file written to the public directory
pub const INDEX_FILE: &str = "index.html";

/// Props file written next to the page
pub const PROPS_FILE: &str = "props.json";

/// What a generate run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The page was written with this many posts on it
    Generated { posts: usize },
    /// The previous build is still fresh for this many seconds
    Fresh { remaining: u64 },
}

/// Generate the listing from the configured content source
pub async fn run(blog: &Blog, force: bool) -> Result<GenerateOutcome> {
    let source = blog.content_source()?;
    run_with_source(blog, &source, force, Utc::now()).await
}

/// Generate the listing from `source`
///
/// Skips the content source entirely while the last build is inside its
/// revalidation window, unless `force` is set.
pub async fn run_with_source<S: ContentSource>(
    blog: &Blog,
    source: &S,
    force: bool,
    now: DateTime<Utc>,
) -> Result<GenerateOutcome> {
    let start = std::time::Instant::now();
    let revalidate = blog.config.revalidate;
    let config_hash = blog.config_hash();

    let cache = BuildCache::load(&blog.base_dir);
    let published = blog.public_dir.join(INDEX_FILE).exists();
    if !force && published && cache.is_fresh(now, revalidate, config_hash) {
        let remaining = cache.remaining(now, revalidate);
        tracing::info!("Listing is fresh, next revalidation in {}s", remaining);
        return Ok(GenerateOutcome::Fresh { remaining });
    }

    let props = load_static_props(source, &PreviewContext::published(), &blog.config)
        .await
        .context("Failed to load the listing from the content source")?;

    let renderer = blog.renderer()?;
    let html = renderer.render_page(&props.props, &blog.site_data())?;
    let json = serde_json::to_string_pretty(&props)?;

    write_output(&blog.public_dir, &html, &json)?;

    let posts = props.props.posts_pagination.items.len();
    let record = BuildCache::record(now, &json, config_hash, posts);
    if cache.generated_at.is_some() && record.content_hash == cache.content_hash {
        tracing::info!("Content unchanged since the last build");
    }
    record.save(&blog.base_dir)?;

    tracing::info!(
        "Generated {} posts in {:.2}s",
        posts,
        start.elapsed().as_secs_f64()
    );

    Ok(GenerateOutcome::Generated { posts })
}

/// Write the page and its props, replacing any previous build in one step each
pub fn write_output(public_dir: &Path, html: &str, props_json: &str) -> Result<()> {
    fs::create_dir_all(public_dir)?;

    for (name, content) in [(INDEX_FILE, html), (PROPS_FILE, props_json)] {
        let target = public_dir.join(name);
        let staged = public_dir.join(format!(".{}.tmp", name));
        fs::write(&staged, content)?;
        fs::rename(&staged, &target)?;
        tracing::debug!("Wrote {:?}", target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::StaticProps;
    use crate::test_helpers::FakeSource;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 4, 19, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_generate_writes_page_and_props() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = FakeSource::with_posts(&["one", "two"]);

        let outcome = run_with_source(&blog, &source, false, now()).await.unwrap();
        assert_eq!(outcome, GenerateOutcome::Generated { posts: 1 });

        let html = fs::read_to_string(blog.public_dir.join(INDEX_FILE)).unwrap();
        assert!(html.contains("Title one"));
        assert!(html.contains(r#"id="load-more""#));

        let props: StaticProps =
            serde_json::from_str(&fs::read_to_string(blog.public_dir.join(PROPS_FILE)).unwrap())
                .unwrap();
        assert_eq!(props.revalidate, 86400);
        assert!(!props.props.preview);
        assert_eq!(props.props.posts_pagination.next_cursor, Some(source.cursor(2, 1)));
    }

    #[tokio::test]
    async fn test_generate_revalidates_at_most_once_per_interval() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = FakeSource::with_posts(&["one"]);

        run_with_source(&blog, &source, false, now()).await.unwrap();
        assert_eq!(source.calls(), 1);

        let later = now() + Duration::hours(1);
        let outcome = run_with_source(&blog, &source, false, later).await.unwrap();
        assert_eq!(outcome, GenerateOutcome::Fresh { remaining: 23 * 3600 });
        assert_eq!(source.calls(), 1);

        let outcome = run_with_source(&blog, &source, true, later).await.unwrap();
        assert_eq!(outcome, GenerateOutcome::Generated { posts: 1 });
        assert_eq!(source.calls(), 2);

        let next_day = later + Duration::hours(24);
        run_with_source(&blog, &source, false, next_day).await.unwrap();
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = FakeSource::with_posts(&["one"]);
        source.set_unavailable(true);

        let err = run_with_source(&blog, &source, false, now()).await.unwrap_err();
        assert!(err.to_string().contains("content source"));
        assert!(!blog.public_dir.join(INDEX_FILE).exists());
        assert!(BuildCache::load(&blog.base_dir).generated_at.is_none());
    }

    #[tokio::test]
    async fn test_failed_revalidation_keeps_previous_build() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = FakeSource::with_posts(&["one"]);

        run_with_source(&blog, &source, false, now()).await.unwrap();
        let before = fs::read_to_string(blog.public_dir.join(INDEX_FILE)).unwrap();

        source.set_unavailable(true);
        assert!(run_with_source(&blog, &source, true, now()).await.is_err());
        let after = fs::read_to_string(blog.public_dir.join(INDEX_FILE)).unwrap();
        assert_eq!(before, after);
    }
}
