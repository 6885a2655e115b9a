//! Build command implementation.

use super::{load_and_run, loader};
use anyhow::{Context, Result};
use litpost_adapters::discover_posts;
use litpost_core::{Config, ExecutionMode, Post};
use litpost_render::{full_markup, render_full_document, DocutilsRenderer};
use serde::Serialize;
use std::fs;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub strict: bool,
    pub include_drafts: bool,
    pub markup_only: bool,
}

/// One entry of `index.json`
#[derive(Serialize)]
struct IndexEntry<'a> {
    id: u32,
    title: &'a str,
    author: &'a str,
    date: String,
    updated: String,
    tags: &'a [String],
    url: String,
}

/// Load, execute and render every post, writing one file per post plus an index.
pub fn build_site(config: &Config, opts: BuildOptions) -> Result<()> {
    tracing::info!("Building site: {}", config.site.title);

    let posts_dir = config.posts_dir();
    let sources = discover_posts(&posts_dir);
    if sources.is_empty() {
        tracing::warn!("No posts found in {:?}", posts_dir);
    }

    let loader = loader(config);
    let renderer = DocutilsRenderer::from_config(&config.renderer);
    let mode = if opts.strict {
        ExecutionMode::Strict
    } else {
        ExecutionMode::Lenient
    };
    let format = if opts.markup_only {
        "rst"
    } else {
        config.output_format.as_str()
    };

    let output_dir = config.output_dir();
    fs::create_dir_all(output_dir.join("posts")).context("Failed to create output directory")?;

    let now = chrono::Local::now().naive_local();
    let mut built: Vec<Post> = Vec::new();
    let mut diagnostics = 0;

    for path in &sources {
        let (post, report) = load_and_run(config, loader.as_ref(), path, mode)?;
        if !opts.include_drafts && !post.is_published_at(now) {
            tracing::debug!("Skipping unpublished post: {}", post.title);
            continue;
        }

        let contents = if opts.markup_only {
            full_markup(&post, &config.render)?
        } else {
            let rendered = render_full_document(&post, &renderer, &config.render)
                .with_context(|| format!("Failed to render {}", path.display()))?;
            diagnostics += rendered.diagnostics.len();
            rendered.body
        };

        let target = output_dir.join(post.output_rel_path(format));
        fs::write(&target, contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::debug!(
            executed = report.executed,
            failed = report.failures.len(),
            "Wrote {:?}",
            target
        );
        built.push(post);
    }

    built.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    write_index(config, &built, format)?;

    tracing::info!("✓ Built {} posts", built.len());
    if diagnostics > 0 {
        tracing::warn!("Renderer reported {} diagnostics", diagnostics);
    }
    tracing::info!("✓ Output written to {:?}", output_dir);

    Ok(())
}

fn write_index(config: &Config, posts: &[Post], format: &str) -> Result<()> {
    let entries: Vec<IndexEntry> = posts
        .iter()
        .map(|post| IndexEntry {
            id: post.id,
            title: &post.title,
            author: &post.author,
            date: post.date.format("%Y-%m-%d").to_string(),
            updated: post.updated.format("%Y-%m-%d").to_string(),
            tags: &post.tags,
            url: post.url(config.link_prefix(true), format),
        })
        .collect();

    let path = config.output_dir().join("index.json");
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
