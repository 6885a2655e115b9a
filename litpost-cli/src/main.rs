//! # litpost CLI
//!
//! Command-line interface for the litpost literate blog generator.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "litpost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "litpost.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Read metadata statically instead of running modules in Python
    #[arg(long = "static", global = true)]
    static_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every post into the output directory
    Build {
        /// Fail if any example errors or disagrees with its recorded output
        #[arg(long)]
        strict: bool,

        /// Include drafts and posts dated in the future
        #[arg(long)]
        include_drafts: bool,

        /// Write the reStructuredText source instead of running the renderer
        #[arg(long)]
        markup_only: bool,
    },

    /// Print the reStructuredText document for one post
    Show {
        /// Post source file
        path: PathBuf,

        /// Keep recorded output instead of running the examples
        #[arg(long)]
        no_run: bool,

        /// Wrap the document in the post template (title and fields)
        #[arg(long)]
        full: bool,
    },

    /// Run examples (and optionally the renderer) and report problems
    Check {
        /// Post source files (defaults to every post)
        paths: Vec<PathBuf>,

        /// Also render each post and report renderer diagnostics
        #[arg(long)]
        render: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Dump the block decomposition of a source file as JSON
    Blocks {
        /// Python source file
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = commands::load_config(&cli.config)?;
    if cli.static_only {
        config.python.static_only = true;
    }

    match cli.command {
        Commands::Build {
            strict,
            include_drafts,
            markup_only,
        } => {
            let opts = commands::BuildOptions {
                strict,
                include_drafts,
                markup_only,
            };
            commands::build_site(&config, opts)
        }
        Commands::Show {
            path,
            no_run,
            full,
        } => commands::show_post(&config, &path, !no_run, full),
        Commands::Check {
            paths,
            render,
            json,
        } => commands::check_posts(&config, &paths, render, json),
        Commands::Blocks { path } => commands::dump_blocks(&config, &path),
    }
}
