//! Print a single post's document.

use super::{load_and_run, loader};
use anyhow::{Context, Result};
use litpost_adapters::load_post;
use litpost_core::{Config, ExecutionMode};
use litpost_render::full_markup;
use std::path::Path;

pub fn show_post(config: &Config, path: &Path, run: bool, full: bool) -> Result<()> {
    let loader = loader(config);
    let post = if run {
        load_and_run(config, loader.as_ref(), path, ExecutionMode::Lenient)?.0
    } else {
        load_post(path, config, loader.as_ref())
            .with_context(|| format!("Failed to load post {}", path.display()))?
            .post
    };

    let markup = if full {
        full_markup(&post, &config.render)?
    } else {
        post.render_document(&config.render)
    };
    print!("{}", markup);
    Ok(())
}
