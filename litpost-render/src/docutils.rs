//! reStructuredText rendering through an external docutils front end.

use litpost_core::{MarkupRenderer, RenderError, RenderedMarkup};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Embedded docutils front end registering the `sourcecode` directive.
const FRONTEND: &str = include_str!("docutils_frontend.py");

/// Pipes markup through a docutils HTML front end and keeps the `<body>` of
/// its output. Diagnostics come from stderr.
///
/// By default the front end is litpost's embedded script run by a Python
/// interpreter; [`DocutilsRenderer::new`] runs any command with the
/// `rst2html` contract instead.
#[derive(Debug, Clone)]
pub struct DocutilsRenderer {
    command: String,
    args: Vec<String>,
    builtin_frontend: bool,
}

impl DocutilsRenderer {
    /// Run `command` directly, e.g. `rst2html`.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            builtin_frontend: false,
        }
    }

    /// Run the embedded front end with the given Python interpreter.
    pub fn builtin(interpreter: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            builtin_frontend: true,
            ..Self::new(interpreter, args)
        }
    }

    pub fn from_config(config: &litpost_core::config::RendererConfig) -> Self {
        if config.builtin_frontend {
            Self::builtin(config.command.clone(), config.args.clone())
        } else {
            Self::new(config.command.clone(), config.args.clone())
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.command);
        if self.builtin_frontend {
            command.arg("-c").arg(FRONTEND);
        }
        command.args(&self.args);
        command
    }
}

impl MarkupRenderer for DocutilsRenderer {
    fn render(&self, markup: &str) -> Result<RenderedMarkup, RenderError> {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::Renderer("renderer stdin unavailable".to_string()))?;
        let input = markup.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| RenderError::Renderer("stdin writer panicked".to_string()))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let messages = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(RenderError::Renderer(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                messages.trim()
            )));
        }

        debug!(
            command = %self.command,
            builtin = self.builtin_frontend,
            bytes = output.stdout.len(),
            "Rendered markup"
        );
        Ok(RenderedMarkup {
            body: extract_body(&stdout).to_string(),
            messages,
        })
    }
}

/// The contents of `<body>`, or the whole input when there is none.
pub fn extract_body(html: &str) -> &str {
    let Some(open) = html.find("<body") else {
        return html;
    };
    let Some(start) = html[open..].find('>').map(|i| open + i + 1) else {
        return html;
    };
    let end = html[start..]
        .rfind("</body>")
        .map(|i| start + i)
        .unwrap_or(html.len());
    html[start..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_body() {
        let html = "<html><head></head>\n<body class=\"x\">\n<p>Hi</p>\n</body>\n</html>";
        assert_eq!(extract_body(html), "<p>Hi</p>");
        assert_eq!(extract_body("<p>fragment</p>"), "<p>fragment</p>");
    }

    #[test]
    fn test_missing_command_is_io_error() {
        let renderer = DocutilsRenderer::new("litpost-no-such-renderer", vec![]);
        assert!(matches!(renderer.render("x"), Err(RenderError::Io(_))));
    }

    #[test]
    fn test_builtin_frontend_command_line() {
        let renderer = DocutilsRenderer::builtin("python3", vec!["--report=2".to_string()]);
        let command = renderer.command();
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(command.get_program(), "python3");
        assert_eq!(args[0], "-c");
        assert!(args[1].to_string_lossy().contains("register_directive(\"sourcecode\""));
        assert_eq!(args[2], "--report=2");
    }

    #[test]
    fn test_from_config_respects_frontend_flag() {
        let mut config = litpost_core::config::RendererConfig::default();
        assert!(DocutilsRenderer::from_config(&config).builtin_frontend);

        config.command = "rst2html".to_string();
        config.builtin_frontend = false;
        let renderer = DocutilsRenderer::from_config(&config);
        assert!(!renderer.builtin_frontend);
        assert_eq!(renderer.command().get_args().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_passthrough_command() {
        let renderer = DocutilsRenderer::new("cat", vec![]);
        let rendered = renderer.render("<body>hello</body>").unwrap();
        assert_eq!(rendered.body, "hello");
        assert!(rendered.messages.is_empty());
    }
}
