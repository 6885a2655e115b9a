//! CLI command implementations.

pub mod blocks;
pub mod build;
pub mod check;
pub mod show;

pub use blocks::dump_blocks;
pub use build::{build_site, BuildOptions};
pub use check::check_posts;
pub use show::show_post;

use anyhow::{Context, Result};
use litpost_adapters::{load_post, loader_for_config, LoadedPost};
use litpost_core::{Config, ExecutionMode, ModuleLoader, Post, RunReport};
use std::path::Path;

/// Load `litpost.yml`, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    tracing::debug!("Loading config from {:?}", path);
    Config::from_file_or_default(path).context("Failed to load configuration")
}

/// Load a post and run its examples with a fresh namespace.
pub fn load_and_run(
    config: &Config,
    loader: &dyn ModuleLoader,
    path: &Path,
    mode: ExecutionMode,
) -> Result<(Post, RunReport)> {
    let LoadedPost {
        mut post,
        mut namespace,
    } = load_post(path, config, loader)
        .with_context(|| format!("Failed to load post {}", path.display()))?;
    let report = post
        .run_all_examples(namespace.as_mut(), mode)
        .with_context(|| format!("Examples failed in {}", path.display()))?;
    Ok((post, report))
}

pub fn loader(config: &Config) -> Box<dyn ModuleLoader> {
    let loader = loader_for_config(config);
    tracing::debug!("Using {} module loader", loader.name());
    loader
}
