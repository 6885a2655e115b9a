//! # litpost-adapters
//!
//! Turns literate Python source files into [`Post`]s.
//!
//! - [`lang_python`] decomposes a module into blocks with tree-sitter
//! - [`StaticLoader`] reads metadata from literal assignments, no interpreter needed
//! - [`PythonProcessLoader`] runs the module in `python3` so examples can execute
//!
//! ## Usage
//!
//! ```ignore
//! use litpost_adapters::{load_post, loader_for_config};
//!
//! let config = Config::from_file_or_default("litpost.yml")?;
//! let loader = loader_for_config(&config);
//! let mut loaded = load_post(Path::new("posts/007_hello.py"), &config, loader.as_ref())?;
//! loaded.post.run_all_examples(loaded.namespace.as_mut(), ExecutionMode::Lenient)?;
//! ```

use litpost_core::models::id_from_filename;
use litpost_core::{Config, LoadError, ModuleLoader, Namespace, Post, PostError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

pub mod lang_python;
mod literal;
mod python_process;
mod static_loader;

pub use lang_python::{decompose, PythonDecomposer};
pub use literal::decode_string_literal;
pub use python_process::{PythonProcessLoader, PythonSession};
pub use static_loader::StaticLoader;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to read source file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse source: {0}")]
    ParseError(String),

    #[error("Syntax error near line {line}")]
    Syntax { line: usize },

    #[error(transparent)]
    Post(#[from] PostError),

    #[error("Failed to load module: {0}")]
    Load(#[from] LoadError),
}

/// A post together with the live namespace its examples run against
pub struct LoadedPost {
    pub post: Post,
    pub namespace: Box<dyn Namespace>,
}

impl std::fmt::Debug for LoadedPost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPost")
            .field("post", &self.post)
            .finish_non_exhaustive()
    }
}

/// Pick the module loader the configuration asks for.
pub fn loader_for_config(config: &Config) -> Box<dyn ModuleLoader> {
    let names = config.metadata.attribute_names();
    if config.python.static_only {
        Box::new(StaticLoader::new(names))
    } else {
        Box::new(PythonProcessLoader::new(config.python.command.clone(), names))
    }
}

/// Read, decompose and load one literate source file.
///
/// The file name is checked before the module is handed to the loader, so a
/// misnamed file is never executed.
pub fn load_post(
    path: &Path,
    config: &Config,
    loader: &dyn ModuleLoader,
) -> Result<LoadedPost, AdapterError> {
    id_from_filename(path)?;
    let source = std::fs::read_to_string(path)?;

    let names = config.metadata.attribute_names();
    let blocks = PythonDecomposer::new().decompose(&source, &names)?;
    let module = loader.load(path, &source)?;
    debug!(
        path = %path.display(),
        loader = loader.name(),
        blocks = blocks.len(),
        "Loaded post source"
    );

    let post = Post::from_parts(path, source, &module.attributes, blocks, &config.metadata)?;
    Ok(LoadedPost {
        post,
        namespace: module.namespace,
    })
}

/// Find post sources under `root`: `.py` files whose name starts with a digit,
/// sorted by path. Hidden directories and `__pycache__` are skipped.
pub fn discover_posts(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || e.file_name()
                    .to_str()
                    .map(|name| !name.starts_with('.') && name != "__pycache__")
                    .unwrap_or(false)
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path().extension().and_then(|ext| ext.to_str()) == Some("py")
                && e.file_name()
                    .to_str()
                    .and_then(|name| name.chars().next())
                    .map(|c| c.is_ascii_digit())
                    .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    paths
}
