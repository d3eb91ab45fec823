//! List the first page of posts

use anyhow::{Context, Result};

use crate::listing::Phase;
use crate::loader::{load_static_props, PreviewContext};
use crate::source::ContentSource;
use crate::Blog;

/// Print the first page of the listing as plain text
pub async fn run(blog: &Blog) -> Result<()> {
    let source = blog.content_source()?;
    let text = first_page(blog, &source).await?;
    print!("{}", text);
    Ok(())
}

/// Render the first published page of `source`
pub async fn first_page<S: ContentSource>(blog: &Blog, source: &S) -> Result<String> {
    let props = load_static_props(source, &PreviewContext::published(), &blog.config)
        .await
        .context("Failed to load the listing from the content source")?;

    let listing = &props.props.posts_pagination;
    let phase = if listing.has_more() {
        Phase::Initial
    } else {
        Phase::Terminal
    };

    let renderer = blog.renderer()?;
    Ok(renderer.render_text(listing, phase, props.props.preview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakeSource;

    #[tokio::test]
    async fn test_first_page_text() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = FakeSource::with_posts(&["one", "two"]);

        let text = first_page(&blog, &source).await.unwrap();
        assert_eq!(
            text,
            "Title one\n  Subtitle one\n  01 Abr 2021 · Author one\n\n[Enter] Carregar mais posts\n"
        );
    }

    #[tokio::test]
    async fn test_first_page_empty() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let text = first_page(&blog, &FakeSource::with_posts(&[])).await.unwrap();
        assert_eq!(text, "Nenhum post ainda.\n");
    }
}
