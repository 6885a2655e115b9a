//! Askama template definitions.

use askama::Template;
use litpost_core::{Post, RenderOptions};

/// A complete reStructuredText post: title, field list, then the block document
#[derive(Template)]
#[template(path = "post.rst", escape = "none")]
pub struct PostTemplate {
    pub title: String,
    /// `=` rule drawn above and below the title
    pub rule: String,
    pub author: String,
    pub date: String,
    pub updated: Option<String>,
    pub tags: Vec<String>,
    pub document: String,
}

impl PostTemplate {
    pub fn for_post(post: &Post, options: &RenderOptions) -> Self {
        let date = post.date.format("%Y-%m-%d").to_string();
        let updated = post.updated.format("%Y-%m-%d").to_string();
        Self {
            title: post.title.clone(),
            rule: "=".repeat(post.title.chars().count().max(1)),
            author: post.author.clone(),
            updated: (updated != date).then_some(updated),
            date,
            tags: post.tags.clone(),
            document: post.render_document(options),
        }
    }
}
