//! Interactive-example notation embedded in docstrings.
//!
//! A docstring is split into plain text and `>>>` sessions:
//!
//! ```text
//! Some prose.
//!
//! >>> total = sum(
//! ...     [1, 2, 3])
//! >>> total
//! 6
//! ```
//!
//! [`parse_examples`] yields the pieces lazily, in order, as
//! [`Fragment::Text`] and [`Fragment::Example`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::OnceLock;

/// Primary interactive prompt
pub const PS1: &str = ">>>";
/// Continuation prompt
pub const PS2: &str = "...";
/// Marker for an intentionally empty output line
pub const BLANKLINE_MARKER: &str = "<BLANKLINE>";

const TAB_WIDTH: usize = 8;

static OPTION_DIRECTIVE: OnceLock<Regex> = OnceLock::new();

fn option_directive() -> &'static Regex {
    OPTION_DIRECTIVE.get_or_init(|| Regex::new(r#"#\s*doctest:\s*([^\n'"]*)$"#).unwrap())
}

/// A `+FLAG` or `-FLAG` directive attached to an example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleOption {
    pub name: String,
    pub enabled: bool,
}

/// One recorded interactive statement and its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Statement text without prompts; continuation lines keep their
    /// relative indentation. Always ends with a newline.
    pub source: String,

    /// Expected output as written in the docstring (possibly empty)
    pub want: String,

    /// Output captured by an execution pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// Directive flags stripped from the source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ExampleOption>,

    /// Line offset of the prompt inside its docstring (0-indexed)
    #[serde(default)]
    pub line: usize,
}

impl Example {
    pub fn new(source: impl Into<String>, want: impl Into<String>) -> Self {
        let mut source = source.into();
        if !source.ends_with('\n') {
            source.push('\n');
        }
        let mut want = want.into();
        if !want.is_empty() && !want.ends_with('\n') {
            want.push('\n');
        }
        Self {
            source,
            want,
            actual: None,
            options: Vec::new(),
            line: 0,
        }
    }

    /// The output to display: captured output wins, then a non-empty expected
    /// output, otherwise nothing.
    pub fn output(&self) -> Option<&str> {
        match &self.actual {
            Some(actual) => Some(actual),
            None if !self.want.is_empty() => Some(&self.want),
            None => None,
        }
    }

    /// Whether a directive turned `name` on (`+NAME`) for this example.
    pub fn has_option(&self, name: &str) -> bool {
        self.options
            .iter()
            .rev()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .is_some_and(|o| o.enabled)
    }

    pub fn is_skipped(&self) -> bool {
        self.has_option("SKIP")
    }
}

/// A piece of a parsed docstring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Example(Example),
}

/// Split a docstring into text and examples.
///
/// Text fragments are yielded between every pair of examples and at both
/// ends, and may be empty.
pub fn parse_examples(text: &str) -> Fragments {
    Fragments::new(text)
}

/// Lazy iterator returned by [`parse_examples`]
#[derive(Debug)]
pub struct Fragments {
    lines: Vec<String>,
    pos: usize,
    text_start: usize,
    queued: VecDeque<Fragment>,
    finished: bool,
}

impl Fragments {
    fn new(text: &str) -> Self {
        let expanded: Vec<String> = text.split('\n').map(expand_tabs).collect();
        let indent = expanded
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| leading_spaces(l))
            .min()
            .unwrap_or(0);
        let lines = expanded
            .into_iter()
            .map(|l| strip_spaces(&l, indent).to_string())
            .collect();

        Self {
            lines,
            pos: 0,
            text_start: 0,
            queued: VecDeque::new(),
            finished: false,
        }
    }

    /// Scan forward until the next example (or the end) and queue what was found.
    fn advance(&mut self) {
        while self.pos < self.lines.len() {
            let Some(indent) = prompt_indent(&self.lines[self.pos]) else {
                self.pos += 1;
                continue;
            };

            let start = self.pos;
            let mut source_lines = vec![after_prompt(&self.lines[start], indent)];
            let mut end = start + 1;
            while end < self.lines.len() && is_continuation(&self.lines[end], indent) {
                source_lines.push(after_prompt(&self.lines[end], indent));
                end += 1;
            }

            let mut want_lines = Vec::new();
            while end < self.lines.len() {
                let line = &self.lines[end];
                if line.trim().is_empty()
                    || line.trim_start().starts_with(PS1)
                    || leading_spaces(line) < indent
                {
                    break;
                }
                want_lines.push(strip_spaces(line, indent));
                end += 1;
            }

            self.queued
                .push_back(Fragment::Text(self.lines[self.text_start..start].join("\n")));
            if let Some(example) = build_example(source_lines, want_lines, start) {
                self.queued.push_back(Fragment::Example(example));
            }

            self.pos = end;
            self.text_start = end;
            return;
        }

        let tail = self.lines[self.text_start.min(self.lines.len())..].join("\n");
        self.queued.push_back(Fragment::Text(tail));
        self.finished = true;
    }
}

impl Iterator for Fragments {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        while self.queued.is_empty() && !self.finished {
            self.advance();
        }
        self.queued.pop_front()
    }
}

fn build_example(source_lines: Vec<&str>, want_lines: Vec<&str>, line: usize) -> Option<Example> {
    let mut options = Vec::new();
    let cleaned: Vec<String> = source_lines
        .into_iter()
        .map(|l| strip_directive(l, &mut options))
        .collect();

    let source = cleaned.join("\n");
    if is_blank_or_comment(&source) {
        return None;
    }

    let mut want = String::new();
    for w in want_lines {
        want.push_str(w);
        want.push('\n');
    }

    Some(Example {
        source: format!("{}\n", source),
        want,
        actual: None,
        options,
        line,
    })
}

/// Remove a trailing `# doctest: ...` comment, collecting its flags.
fn strip_directive(line: &str, options: &mut Vec<ExampleOption>) -> String {
    let Some(caps) = option_directive().captures(line) else {
        return line.to_string();
    };
    let whole = caps.get(0).map(|m| m.start()).unwrap_or(line.len());
    let flags = caps.get(1).map(|m| m.as_str()).unwrap_or("");

    for flag in flags.split(|c: char| c == ',' || c.is_whitespace()) {
        let flag = flag.trim();
        let (enabled, name) = match flag.chars().next() {
            Some('+') => (true, &flag[1..]),
            Some('-') => (false, &flag[1..]),
            _ => continue,
        };
        if !name.is_empty() {
            options.push(ExampleOption {
                name: name.to_ascii_uppercase(),
                enabled,
            });
        }
    }

    line[..whole].trim_end().to_string()
}

fn is_blank_or_comment(source: &str) -> bool {
    !source.contains('\n') && {
        let t = source.trim();
        t.is_empty() || t.starts_with('#')
    }
}

/// Indentation of a `>>>` prompt line; the prompt must be followed by a space
/// or end the line.
fn prompt_indent(line: &str) -> Option<usize> {
    let indent = leading_spaces(line);
    let rest = line[indent..].strip_prefix(PS1)?;
    (rest.is_empty() || rest.starts_with(' ')).then_some(indent)
}

fn is_continuation(line: &str, indent: usize) -> bool {
    if leading_spaces(line) < indent {
        return false;
    }
    match line[indent..].strip_prefix(PS2) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

/// Text after `<indent>>>> ` or `<indent>... `
fn after_prompt(line: &str, indent: usize) -> &str {
    line.get(indent + PS1.len() + 1..).unwrap_or("")
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn strip_spaces(line: &str, max: usize) -> &str {
    let n = leading_spaces(line).min(max);
    &line[n..]
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + TAB_WIDTH);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(text: &str) -> Vec<Example> {
        parse_examples(text)
            .filter_map(|f| match f {
                Fragment::Example(e) => Some(e),
                Fragment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_text_only() {
        let fragments: Vec<_> = parse_examples("Welcome.").collect();
        assert_eq!(fragments, vec![Fragment::Text("Welcome.".to_string())]);
    }

    #[test]
    fn test_single_example_with_want() {
        let fragments: Vec<_> = parse_examples("Add:\n\n>>> 1+1\n2\n").collect();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0], Fragment::Text("Add:\n".to_string()));
        match &fragments[1] {
            Fragment::Example(e) => {
                assert_eq!(e.source, "1+1\n");
                assert_eq!(e.want, "2\n");
                assert_eq!(e.line, 2);
            }
            other => panic!("expected example, got {:?}", other),
        }
        assert_eq!(fragments[2], Fragment::Text(String::new()));
    }

    #[test]
    fn test_adjacent_examples_separated_by_empty_text() {
        let fragments: Vec<_> = parse_examples(">>> 1+1\n2\n>>> 2+2\n4").collect();
        let kinds: Vec<bool> = fragments
            .iter()
            .map(|f| matches!(f, Fragment::Example(_)))
            .collect();
        assert_eq!(kinds, vec![false, true, false, true, false]);
        assert!(fragments
            .iter()
            .all(|f| !matches!(f, Fragment::Text(t) if !t.trim().is_empty())));
    }

    #[test]
    fn test_continuation_lines() {
        let found = examples(">>> def f(x):\n...     return x * 2\n>>> f(3)\n6\n");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].source, "def f(x):\n    return x * 2\n");
        assert_eq!(found[0].want, "");
        assert_eq!(found[1].want, "6\n");
    }

    #[test]
    fn test_common_indentation_removed() {
        let text = "\n    Intro line.\n\n        >>> print('hi')\n        hi\n    Outro.\n";
        let fragments: Vec<_> = parse_examples(text).collect();
        match &fragments[1] {
            Fragment::Example(e) => {
                assert_eq!(e.source, "print('hi')\n");
                assert_eq!(e.want, "hi\n");
            }
            other => panic!("expected example, got {:?}", other),
        }
        assert_eq!(fragments[2], Fragment::Text("Outro.\n".to_string()));
    }

    #[test]
    fn test_text_right_after_output_is_output() {
        let found = examples(">>> 1\n1\ntwo\n");
        assert_eq!(found[0].want, "1\ntwo\n");
    }

    #[test]
    fn test_want_stops_at_blank_line() {
        let found = examples(">>> print('a\\nb')\na\nb\n\nnot output\n");
        assert_eq!(found[0].want, "a\nb\n");
    }

    #[test]
    fn test_prompt_requires_space() {
        let found = examples(">>>not a prompt\n");
        assert!(found.is_empty());
    }

    #[test]
    fn test_comment_only_example_dropped() {
        let found = examples(">>> # just a comment\n>>> 3\n3\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, "3\n");
    }

    #[test]
    fn test_directive_comment_stripped() {
        let found = examples(">>> import random  # doctest: +SKIP\n>>> x = 1 # doctest: +ELLIPSIS, -NORMALIZE_WHITESPACE\n");
        assert_eq!(found[0].source, "import random\n");
        assert!(found[0].is_skipped());
        assert_eq!(found[1].source, "x = 1\n");
        assert!(found[1].has_option("ellipsis"));
        assert!(!found[1].has_option("NORMALIZE_WHITESPACE"));
    }

    #[test]
    fn test_directive_inside_string_kept() {
        let found = examples(">>> s = '# doctest: +SKIP'\n");
        assert_eq!(found[0].source, "s = '# doctest: +SKIP'\n");
        assert!(!found[0].is_skipped());
    }

    #[test]
    fn test_output_precedence() {
        let mut e = Example::new("1+1", "2");
        assert_eq!(e.output(), Some("2\n"));
        e.actual = Some("3\n".to_string());
        assert_eq!(e.output(), Some("3\n"));

        let silent = Example::new("x = 1", "");
        assert_eq!(silent.output(), None);
    }

    #[test]
    fn test_tabs_expanded() {
        assert_eq!(expand_tabs("a\tb"), "a       b");
        assert_eq!(expand_tabs("\tx"), "        x");
    }

    #[test]
    fn test_lazy_iteration() {
        let mut fragments = parse_examples("one\n>>> 1\n1\n\ntwo\n>>> 2\n2\n");
        assert_eq!(fragments.next(), Some(Fragment::Text("one".to_string())));
        assert!(matches!(fragments.next(), Some(Fragment::Example(_))));
        assert_eq!(fragments.next(), Some(Fragment::Text("\ntwo".to_string())));
    }
}
