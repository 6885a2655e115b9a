//! Structural diagnostics reported by the markup renderer.

use serde::{Deserialize, Serialize};

/// Severity of a renderer diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Severe,
    Unknown,
}

impl DiagnosticSeverity {
    pub fn from_kind(kind: &str) -> Self {
        match kind.to_ascii_uppercase().as_str() {
            "DEBUG" => DiagnosticSeverity::Debug,
            "INFO" => DiagnosticSeverity::Info,
            "WARNING" => DiagnosticSeverity::Warning,
            "ERROR" => DiagnosticSeverity::Error,
            "SEVERE" => DiagnosticSeverity::Severe,
            _ => DiagnosticSeverity::Unknown,
        }
    }
}

/// One diagnostic line: `filename:line:TYPE message: detail`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub filename: String,
    pub line: u32,
    /// Type as written by the renderer, e.g. `WARNING`
    pub kind: String,
    /// Numeric level when the renderer supplies one (`(WARNING/2)`)
    pub level: Option<u8>,
    pub message: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn severity(&self) -> DiagnosticSeverity {
        DiagnosticSeverity::from_kind(&self.kind)
    }

    /// Parse one line, or `None` if it does not have the expected shape.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(4, ':');
        let filename = fields.next()?.trim();
        let line_no = fields.next()?.trim().parse::<u32>().ok()?;
        let type_and_message = fields.next()?.trim();
        let detail = fields.next().map(str::trim).unwrap_or("");

        let (raw_kind, message) = match type_and_message.split_once(char::is_whitespace) {
            Some((kind, rest)) => (kind, rest.trim()),
            None => (type_and_message, ""),
        };
        if raw_kind.is_empty() {
            return None;
        }

        let (kind, level) = split_kind(raw_kind);
        Some(Self {
            filename: filename.to_string(),
            line: line_no,
            kind,
            level,
            message: message.to_string(),
            detail: detail.to_string(),
        })
    }
}

/// `(WARNING/2)` -> ("WARNING", Some(2)); `ERROR` -> ("ERROR", None)
fn split_kind(raw: &str) -> (String, Option<u8>) {
    let inner = raw.trim_start_matches('(').trim_end_matches(')');
    match inner.split_once('/') {
        Some((name, level)) => (name.to_string(), level.parse().ok()),
        None => (inner.to_string(), None),
    }
}

/// Extract every well-formed diagnostic from renderer output.
///
/// Lines that do not parse are appended to the `detail` of the record right
/// above them (docutils writes the specifics of an error on the next line).
/// A blank line ends that continuation; later unparsable lines are skipped.
pub fn parse_diagnostics(text: &str) -> Vec<Diagnostic> {
    let mut found: Vec<Diagnostic> = Vec::new();
    let mut continuing = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continuing = false;
            continue;
        }
        if let Some(diagnostic) = Diagnostic::parse_line(line) {
            found.push(diagnostic);
            continuing = true;
            continue;
        }
        match found.last_mut() {
            Some(last) if continuing => {
                if !last.detail.is_empty() {
                    last.detail.push(' ');
                }
                last.detail.push_str(line.trim());
            }
            _ => tracing::trace!(line, "skipping malformed diagnostic"),
        }
    }
    found
}
