//! Run examples and the renderer, then surface what went wrong.

use super::{load_and_run, loader};
use anyhow::Result;
use litpost_adapters::discover_posts;
use litpost_core::{Config, Diagnostic, DiagnosticSeverity, ExampleFailure, ExecutionMode};
use litpost_render::{render_full_document, DocutilsRenderer};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct PostCheck {
    path: String,
    id: u32,
    title: String,
    executed: usize,
    skipped: usize,
    failures: Vec<ExampleFailure>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct CheckSummary {
    posts: usize,
    failures: usize,
    errors: usize,
    warnings: usize,
    results: Vec<PostCheck>,
}

/// Check posts, failing when an example fails or the renderer reports an error.
pub fn check_posts(config: &Config, paths: &[PathBuf], render: bool, json: bool) -> Result<()> {
    let sources = if paths.is_empty() {
        discover_posts(&config.posts_dir())
    } else {
        paths.to_vec()
    };

    let loader = loader(config);
    let renderer = DocutilsRenderer::from_config(&config.renderer);
    let mut results = Vec::new();

    for path in &sources {
        let (post, report) = load_and_run(config, loader.as_ref(), path, ExecutionMode::Lenient)?;
        let diagnostics = if render {
            render_full_document(&post, &renderer, &config.render)?.diagnostics
        } else {
            Vec::new()
        };
        results.push(PostCheck {
            path: display(path),
            id: post.id,
            title: post.title,
            executed: report.executed,
            skipped: report.skipped,
            failures: report.failures,
            diagnostics,
        });
    }

    let count = |min: DiagnosticSeverity, max: DiagnosticSeverity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| (min..=max).contains(&d.severity()))
            .count()
    };
    let summary = CheckSummary {
        posts: results.len(),
        failures: results.iter().map(|r| r.failures.len()).sum(),
        errors: count(DiagnosticSeverity::Error, DiagnosticSeverity::Severe),
        warnings: count(DiagnosticSeverity::Warning, DiagnosticSeverity::Warning),
        results,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Checked {} posts: {} failing examples, {} errors, {} warnings",
            summary.posts, summary.failures, summary.errors, summary.warnings
        );
        for result in &summary.results {
            for failure in &result.failures {
                println!(
                    "- {} example {}: {}",
                    result.path,
                    failure.index + 1,
                    failure.source.trim()
                );
                println!("  expected: {:?}", failure.want);
                if let Some(actual) = &failure.actual {
                    println!("  got:      {:?}", actual);
                }
            }
            for diag in &result.diagnostics {
                println!(
                    "- {}:{} {} {} {}",
                    result.path, diag.line, diag.kind, diag.message, diag.detail
                );
            }
        }
    }

    if summary.failures > 0 || summary.errors > 0 {
        anyhow::bail!(
            "{} failing examples, {} renderer errors",
            summary.failures,
            summary.errors
        );
    }
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
