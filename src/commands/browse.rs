//! Interactive terminal listing
//!
//! Shows the first page, then loads the next page each time Enter is pressed
//! until the listing runs out of pages or the user quits with `q`.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::listing::{ListingSession, Phase};
use crate::loader::{load_static_props, PreviewContext};
use crate::pager::{LoadOutcome, PageFetcher, Pager};
use crate::source::ContentSource;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Browse the configured content source on stdin/stdout
pub async fn run(blog: &Blog, preview_ref: Option<String>) -> Result<()> {
    let source = blog.content_source()?;
    let preview = match preview_ref {
        Some(reference) => PreviewContext::with_ref(reference),
        None => PreviewContext::published(),
    };
    let pager = Pager::new(source.clone()).restrict_to(source.endpoint());

    let input = BufReader::new(tokio::io::stdin());
    browse(blog, &source, pager, &preview, input, std::io::stdout()).await
}

/// Run the browse loop over arbitrary input and output
pub async fn browse<S, F, R, W>(
    blog: &Blog,
    source: &S,
    pager: Pager<F>,
    preview: &PreviewContext,
    input: R,
    output: W,
) -> Result<()>
where
    S: ContentSource,
    F: PageFetcher,
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let props = load_static_props(source, preview, &blog.config)
        .await
        .context("Failed to load the listing from the content source")?;
    let session = ListingSession::new(props.props.posts_pagination, props.props.preview)?;

    let renderer = Arc::new(blog.renderer()?);
    let output = Arc::new(Mutex::new(output));

    let initial = renderer.render_text(&session.snapshot(), session.phase(), session.preview());
    write_out(&output, &initial);

    let subscription = {
        let renderer = Arc::clone(&renderer);
        let output = Arc::clone(&output);
        let preview = session.preview();
        session.subscribe(move |listing, phase| {
            let text = if phase == Phase::Loading {
                format!("{}\n", renderer.helpers().t("loading"))
            } else {
                renderer.render_text(listing, phase, preview)
            };
            write_out(&output, &text);
        })
    };

    let mut lines = input.lines();
    while session.can_load_more() {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "q" | "quit" => break,
            "" => match pager.load_more(&session).await {
                LoadOutcome::Appended(count) => tracing::debug!("Loaded {} more posts", count),
                LoadOutcome::Failed(e) => tracing::debug!("Load failed: {}", e),
                LoadOutcome::Exhausted | LoadOutcome::Busy => {}
            },
            other => tracing::debug!("Ignoring input {:?}", other),
        }
    }

    session.unsubscribe(subscription);
    Ok(())
}

fn write_out<W: Write>(output: &Mutex<W>, text: &str) {
    let mut output = output.lock().unwrap_or_else(|e| e.into_inner());
    if let Err(e) = output.write_all(text.as_bytes()).and_then(|_| output.flush()) {
        tracing::warn!("Failed to write listing: {}", e);
    }
}
