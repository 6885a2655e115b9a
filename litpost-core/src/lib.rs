//! # litpost-core
//!
//! Core library for litpost, which turns literate Python modules into
//! reStructuredText blog posts.
//!
//! This crate holds the content model ([`Block`], [`Example`], [`Post`]), the
//! interactive-example notation parser, metadata validation, configuration,
//! and the traits behind which module loading, example execution and markup
//! rendering live.

pub mod backend;
pub mod blocks;
pub mod config;
pub mod diagnostics;
pub mod doctest;
pub mod execution;
pub mod metadata;
pub mod models;
pub mod slug;

pub use backend::{
    ExecError, InertNamespace, LoadError, LoadedModule, MarkupRenderer, ModuleLoader, Namespace,
    RenderError, RenderedMarkup,
};
pub use blocks::{Block, BlockBuilder, BlockKind, ExampleGroup, Listing, RenderOptions};
pub use config::Config;
pub use diagnostics::{parse_diagnostics, Diagnostic, DiagnosticSeverity};
pub use doctest::{parse_examples, Example, Fragment};
pub use execution::{ExampleError, ExampleFailure, ExecutionMode, FailureReason, RunReport};
pub use metadata::{AttributeError, Attributes};
pub use models::{Post, PostError};
pub use slug::slugify;
