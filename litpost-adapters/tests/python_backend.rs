//! Loading and running a post through a real `python3` child process.
//!
//! Skipped (with a note on stderr) when no interpreter is on the PATH.

use litpost_adapters::{load_post, PythonProcessLoader};
use litpost_core::{Config, ExecutionMode, FailureReason};
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const SQUARES: &str = r#"id = 5
title = "Squares"
author = "Ann"
date = (2021, 3, 4)
tags = ["math"]

def sq(x):
    return x * x

"""Try it:

>>> y = sq(3)
>>> y
10
>>> 1/0
>>> print("done")
done
"""
"#;

fn python_available() -> bool {
    let found = Command::new("python3")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if !found {
        eprintln!("python3 not found, skipping");
    }
    found
}

#[test]
fn test_executes_examples_in_module_globals() {
    if !python_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("005_squares.py");
    fs::write(&path, SQUARES).unwrap();

    let config = Config::default();
    let loader = PythonProcessLoader::new("python3", config.metadata.attribute_names());
    let mut loaded = load_post(&path, &config, &loader).unwrap();
    assert_eq!(loaded.post.title, "Squares");
    assert_eq!(loaded.post.tags, vec!["math".to_string()]);

    let report = loaded
        .post
        .run_all_examples(loaded.namespace.as_mut(), ExecutionMode::Lenient)
        .unwrap();
    assert_eq!(report.executed, 4);
    assert_eq!(report.failures.len(), 2);

    let mismatch = &report.failures[0];
    assert_eq!(mismatch.index, 1);
    assert_eq!(mismatch.reason, FailureReason::Mismatch);
    assert_eq!(mismatch.want, "10\n");
    assert_eq!(mismatch.actual.as_deref(), Some("9\n"));

    let raised = &report.failures[1];
    assert_eq!(raised.index, 2);
    match &raised.reason {
        FailureReason::Error { message } => assert!(message.contains("ZeroDivisionError")),
        other => panic!("expected an error, got {:?}", other),
    }
    let actual = raised.actual.as_deref().unwrap();
    assert!(actual.starts_with("Traceback (most recent call last):\n"));
    assert!(actual.contains("ZeroDivisionError"));

    let document = loaded.post.render_document(&config.render);
    assert!(document.contains("   >>> y\n   9\n"));
    assert!(document.contains("   >>> print(\"done\")\n   done\n"));
    assert!(document.contains("   def sq(x):\n       return x * x\n"));
}

#[test]
fn test_module_error_reported_on_load() {
    if !python_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("006_raises.py");
    fs::write(
        &path,
        "id = 6\ntitle = 'Raises'\nauthor = 'Ann'\ndate = (2021, 1, 1)\nraise ValueError('nope')\n",
    )
    .unwrap();

    let config = Config::default();
    let loader = PythonProcessLoader::new("python3", config.metadata.attribute_names());
    let err = load_post(&path, &config, &loader).unwrap_err();
    assert!(err.to_string().contains("nope"));
}
