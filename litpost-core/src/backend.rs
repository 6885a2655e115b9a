//! Seams to the collaborators that load modules, run examples and render markup.
//!
//! litpost itself never executes Python or produces HTML. A [`ModuleLoader`]
//! turns a source file into its metadata [`Attributes`] plus a live
//! [`Namespace`] that examples run against, and a [`MarkupRenderer`] turns
//! reStructuredText into a document body and a stream of diagnostics.

use crate::metadata::Attributes;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error talking to module loader: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed loader response: {0}")]
    Protocol(String),

    #[error("Module failed to load: {0}")]
    Module(String),
}

#[derive(Error, Debug)]
pub enum ExecError {
    /// The statement ran and raised; `output` is what it printed, including
    /// the formatted exception.
    #[error("Example raised: {message}")]
    Raised { output: String, message: String },

    #[error("Namespace cannot execute examples: {0}")]
    Unsupported(String),

    #[error("Execution channel failed: {0}")]
    Channel(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error running renderer: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Renderer failed: {0}")]
    Renderer(String),
}

/// A live evaluation context for a loaded module
pub trait Namespace {
    /// Execute one interactive statement, returning everything it printed
    /// (including the echoed value of a bare expression).
    fn execute(&mut self, source: &str) -> Result<String, ExecError>;
}

/// Result of loading a literate source file
pub struct LoadedModule {
    pub attributes: Attributes,
    pub namespace: Box<dyn Namespace>,
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// Extracts named top-level bindings plus an evaluation context from a source unit
pub trait ModuleLoader {
    /// Short backend name for logs (e.g. "static", "python")
    fn name(&self) -> &str;

    fn load(&self, path: &Path, source: &str) -> Result<LoadedModule, LoadError>;
}

/// Output of a markup renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkup {
    /// Rendered document body
    pub body: String,
    /// Raw diagnostic text, one `file:line:TYPE message: detail` per line
    pub messages: String,
}

/// Converts marked-up text into a document body plus diagnostics
pub trait MarkupRenderer {
    fn render(&self, markup: &str) -> Result<RenderedMarkup, RenderError>;
}

/// A namespace that refuses to run anything; examples keep their expected output.
#[derive(Debug, Default, Clone, Copy)]
pub struct InertNamespace;

impl Namespace for InertNamespace {
    fn execute(&mut self, _source: &str) -> Result<String, ExecError> {
        Err(ExecError::Unsupported(
            "module was loaded without an interpreter".to_string(),
        ))
    }
}
