//! # litpost-render
//!
//! Document rendering for litpost.
//!
//! This crate wraps a post's reStructuredText in the Askama document template
//! and hands it to a [`MarkupRenderer`], collecting the renderer's
//! diagnostics on the way back.

pub mod docutils;
pub mod templates;

pub use docutils::DocutilsRenderer;
pub use templates::PostTemplate;

use askama::Template;
use litpost_core::{parse_diagnostics, Diagnostic, MarkupRenderer, Post, RenderError, RenderOptions};
use serde::Serialize;
use tracing::warn;

/// A rendered post body plus everything the renderer complained about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPost {
    pub body: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// The complete reStructuredText source of a post, template included.
pub fn full_markup(post: &Post, options: &RenderOptions) -> Result<String, RenderError> {
    PostTemplate::for_post(post, options)
        .render()
        .map_err(|e| RenderError::Template(e.to_string()))
}

/// Template the post, render it, and parse the renderer's diagnostics.
pub fn render_full_document(
    post: &Post,
    renderer: &dyn MarkupRenderer,
    options: &RenderOptions,
) -> Result<RenderedPost, RenderError> {
    let markup = full_markup(post, options)?;
    let rendered = renderer.render(&markup)?;
    let diagnostics = parse_diagnostics(&rendered.messages);

    for d in &diagnostics {
        warn!(
            post = %post.path.display(),
            line = d.line,
            "{}: {} {}",
            d.kind,
            d.message,
            d.detail
        );
    }

    Ok(RenderedPost {
        body: rendered.body,
        diagnostics,
    })
}
