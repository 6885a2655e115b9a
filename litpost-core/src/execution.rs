//! Running a post's examples against a live namespace.

use crate::backend::{ExecError, Namespace};
use crate::doctest::{Example, BLANKLINE_MARKER};
use crate::models::Post;
use serde::Serialize;
use thiserror::Error;

/// What to do when an example misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Log failures and keep whatever output could be captured
    #[default]
    Lenient,
    /// Run everything, then fail if any example errored or mismatched
    Strict,
}

/// Why an example failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "lowercase")]
pub enum FailureReason {
    Mismatch,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleFailure {
    /// Position among all examples of the post
    pub index: usize,
    pub source: String,
    pub want: String,
    pub actual: Option<String>,
    #[serde(flatten)]
    pub reason: FailureReason,
}

#[derive(Error, Debug)]
pub enum ExampleError {
    #[error("{} example(s) failed", .0.len())]
    Failures(Vec<ExampleFailure>),
}

/// Summary of one execution pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub executed: usize,
    pub skipped: usize,
    pub failures: Vec<ExampleFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Post {
    /// Execute every example in block order, attaching captured output.
    ///
    /// Examples share the namespace, so later ones see earlier side effects.
    /// `+SKIP` examples are left untouched.
    pub fn run_all_examples(
        &mut self,
        namespace: &mut dyn Namespace,
        mode: ExecutionMode,
    ) -> Result<RunReport, ExampleError> {
        let mut report = RunReport::default();

        for (index, example) in self.examples_mut().enumerate() {
            if example.is_skipped() {
                report.skipped += 1;
                continue;
            }
            report.executed += 1;

            let reason = match namespace.execute(&example.source) {
                Ok(output) => {
                    let matched = outputs_match(example, &output);
                    example.actual = Some(output);
                    (!matched).then_some(FailureReason::Mismatch)
                }
                Err(ExecError::Raised { output, message }) => {
                    example.actual = Some(output);
                    Some(FailureReason::Error { message })
                }
                Err(e) => Some(FailureReason::Error {
                    message: e.to_string(),
                }),
            };

            if let Some(reason) = reason {
                report.failures.push(ExampleFailure {
                    index,
                    source: example.source.clone(),
                    want: example.want.clone(),
                    actual: example.actual.clone(),
                    reason,
                });
            }
        }

        for failure in &report.failures {
            tracing::warn!(
                post = %self.path.display(),
                index = failure.index,
                "example {:?} failed: {:?}",
                failure.source.trim(),
                failure.reason
            );
        }
        tracing::debug!(
            post = %self.path.display(),
            executed = report.executed,
            skipped = report.skipped,
            failed = report.failures.len(),
            "ran examples"
        );

        match mode {
            ExecutionMode::Strict if !report.is_clean() => {
                Err(ExampleError::Failures(report.failures))
            }
            _ => Ok(report),
        }
    }
}

/// Compare captured output with the expected output, honouring
/// `NORMALIZE_WHITESPACE` and `ELLIPSIS`.
pub fn outputs_match(example: &Example, actual: &str) -> bool {
    let want = normalize(&example.want);
    let got = normalize(actual);
    if want == got {
        return true;
    }

    let (want, got) = if example.has_option("NORMALIZE_WHITESPACE") {
        (
            want.split_whitespace().collect::<Vec<_>>().join(" "),
            got.split_whitespace().collect::<Vec<_>>().join(" "),
        )
    } else {
        (want, got)
    };
    if want == got {
        return true;
    }

    example.has_option("ELLIPSIS") && ellipsis_match(&want, &got)
}

fn normalize(text: &str) -> String {
    text.lines()
        .map(|l| if l.trim() == BLANKLINE_MARKER { "" } else { l.trim_end() })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// `...` in `want` matches any run of text in `got`.
fn ellipsis_match(want: &str, got: &str) -> bool {
    let pieces: Vec<&str> = want.split("...").collect();
    if pieces.len() == 1 {
        return want == got;
    }

    let first = pieces[0];
    let last = pieces[pieces.len() - 1];
    if !got.starts_with(first) || !got.ends_with(last) || first.len() + last.len() > got.len() {
        return false;
    }

    let mut rest = &got[first.len()..got.len() - last.len()];
    for piece in &pieces[1..pieces.len() - 1] {
        match rest.find(piece) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, BlockBuilder};
    use crate::config::MetadataConfig;
    use crate::metadata::Attributes;
    use std::collections::HashMap;
    use std::path::Path;

    /// Replays canned outputs and records what it was asked to run.
    #[derive(Default)]
    struct Scripted {
        outputs: HashMap<String, Result<String, String>>,
        seen: Vec<String>,
    }

    impl Scripted {
        fn with(mut self, source: &str, out: Result<&str, &str>) -> Self {
            self.outputs.insert(
                format!("{}\n", source),
                out.map(str::to_string).map_err(str::to_string),
            );
            self
        }
    }

    impl Namespace for Scripted {
        fn execute(&mut self, source: &str) -> Result<String, ExecError> {
            self.seen.push(source.to_string());
            match self.outputs.get(source) {
                Some(Ok(out)) => Ok(out.clone()),
                Some(Err(msg)) => Err(ExecError::Raised {
                    output: format!("Traceback (most recent call last):\n{}\n", msg),
                    message: msg.clone(),
                }),
                None => Ok(String::new()),
            }
        }
    }

    fn post_with(examples: &[(&str, &str)]) -> Post {
        let mut builder = BlockBuilder::new();
        builder.push_text("Intro.");
        for (i, (source, want)) in examples.iter().enumerate() {
            if i == 1 {
                builder.push_text("Between.");
            }
            builder.push_example(Example::new(*source, *want));
        }
        let attrs: Attributes = serde_json::from_value(serde_json::json!({
            "id": 1, "title": "T", "author": "A", "date": [2020, 1, 1]
        }))
        .unwrap();
        Post::from_parts(
            Path::new("001_t.py"),
            String::new(),
            &attrs,
            builder.finish(),
            &MetadataConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_examples_run_in_order_and_attach_output() {
        let mut post = post_with(&[("x = 2", ""), ("x * 3", "6"), ("x", "2")]);
        let mut ns = Scripted::default().with("x * 3", Ok("6\n")).with("x", Ok("2\n"));

        let report = post.run_all_examples(&mut ns, ExecutionMode::Lenient).unwrap();
        assert_eq!(ns.seen, vec!["x = 2\n", "x * 3\n", "x\n"]);
        assert_eq!(report.executed, 3);
        assert!(report.is_clean());

        let actual: Vec<_> = post.examples().map(|e| e.actual.clone()).collect();
        assert_eq!(
            actual,
            vec![Some(String::new()), Some("6\n".to_string()), Some("2\n".to_string())]
        );
    }

    #[test]
    fn test_lenient_mode_swallows_failures() {
        let mut post = post_with(&[("1/0", ""), ("1+1", "2")]);
        let mut ns = Scripted::default()
            .with("1/0", Err("ZeroDivisionError: division by zero"))
            .with("1+1", Ok("3\n"));

        let report = post.run_all_examples(&mut ns, ExecutionMode::Lenient).unwrap();
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0].reason, FailureReason::Error { .. }));
        assert_eq!(report.failures[1].reason, FailureReason::Mismatch);

        let rendered = post.render_document(&Default::default());
        assert!(rendered.contains("ZeroDivisionError: division by zero"));
        assert!(rendered.contains("   3\n"));
    }

    #[test]
    fn test_strict_mode_reports_after_running_everything() {
        let mut post = post_with(&[("1+1", "2"), ("2+2", "4")]);
        let mut ns = Scripted::default().with("1+1", Ok("5\n")).with("2+2", Ok("4\n"));

        let err = post.run_all_examples(&mut ns, ExecutionMode::Strict).unwrap_err();
        match err {
            ExampleError::Failures(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 0);
            }
        }
        assert_eq!(ns.seen.len(), 2);
        assert!(post.examples().all(|e| e.actual.is_some()));
    }

    #[test]
    fn test_unsupported_namespace_keeps_expected_output() {
        let mut post = post_with(&[("1+1", "2")]);
        let mut ns = crate::backend::InertNamespace;
        let report = post.run_all_examples(&mut ns, ExecutionMode::Lenient).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(post.examples().all(|e| e.actual.is_none()));
        assert!(post.render_document(&Default::default()).contains("   2\n"));
    }

    #[test]
    fn test_skipped_examples_not_run() {
        let mut post = post_with(&[("import this", "")]);
        if let Some(Block::Examples(group)) = post.blocks.get_mut(1) {
            group.examples[0].options.push(crate::doctest::ExampleOption {
                name: "SKIP".to_string(),
                enabled: true,
            });
        }
        let mut ns = Scripted::default();
        let report = post.run_all_examples(&mut ns, ExecutionMode::Strict).unwrap();
        assert_eq!(report.skipped, 1);
        assert!(ns.seen.is_empty());
    }

    #[test]
    fn test_outputs_match_options() {
        let mut e = Example::new("f()", "a   b\n<BLANKLINE>\n");
        assert!(outputs_match(&e, "a   b\n\n"));
        assert!(!outputs_match(&e, "a b\n"));

        e.options.push(crate::doctest::ExampleOption {
            name: "NORMALIZE_WHITESPACE".to_string(),
            enabled: true,
        });
        assert!(outputs_match(&e, "a b\n"));

        let mut e = Example::new("obj", "<Obj at 0x...>");
        assert!(!outputs_match(&e, "<Obj at 0x7f00>"));
        e.options.push(crate::doctest::ExampleOption {
            name: "ELLIPSIS".to_string(),
            enabled: true,
        });
        assert!(outputs_match(&e, "<Obj at 0x7f00>"));
        assert!(!outputs_match(&e, "<Other at 0x7f00>"));
    }

    #[test]
    fn test_ellipsis_middle_pieces() {
        assert!(ellipsis_match("a...b...c", "aXXbYYc"));
        assert!(!ellipsis_match("a...b...c", "aXXcYYb"));
        assert!(!ellipsis_match("ab...ba", "aba"));
    }
}
