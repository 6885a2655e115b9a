//! Module loading and example execution through a `python3` child process.
//!
//! The child runs a small embedded driver and speaks line-delimited JSON over
//! its stdin/stdout. One process backs one post, so examples share the
//! module's globals exactly as they would in an interactive session.

use litpost_core::metadata::Attributes;
use litpost_core::{ExecError, LoadError, LoadedModule, ModuleLoader, Namespace};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::debug;

const DRIVER: &str = include_str!("python_driver.py");

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request<'a> {
    Load { path: &'a Path, names: &'a [String] },
    Exec { source: &'a str },
}

#[derive(Debug, Deserialize)]
struct Response {
    ok: bool,
    #[serde(default)]
    attributes: Option<Attributes>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Loads posts by executing them in a real interpreter
pub struct PythonProcessLoader {
    command: String,
    names: Vec<String>,
}

impl PythonProcessLoader {
    pub fn new(command: impl Into<String>, names: Vec<String>) -> Self {
        Self {
            command: command.into(),
            names,
        }
    }
}

impl ModuleLoader for PythonProcessLoader {
    fn name(&self) -> &str {
        "python"
    }

    fn load(&self, path: &Path, _source: &str) -> Result<LoadedModule, LoadError> {
        let mut session = PythonSession::spawn(&self.command)?;
        let response = session.request(&Request::Load {
            path,
            names: &self.names,
        })?;

        if !response.ok {
            return Err(LoadError::Module(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let attributes = response.attributes.unwrap_or_default();
        debug!(
            path = %path.display(),
            attributes = attributes.len(),
            "Loaded module in {}",
            self.command
        );
        Ok(LoadedModule {
            attributes,
            namespace: Box::new(session),
        })
    }
}

/// A running interpreter holding one module's globals
pub struct PythonSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl PythonSession {
    fn spawn(command: &str) -> Result<Self, LoadError> {
        let mut child = Command::new(command)
            .arg("-u")
            .arg("-c")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LoadError::Protocol("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LoadError::Protocol("child stdout unavailable".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn request(&mut self, request: &Request) -> Result<Response, LoadError> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| LoadError::Protocol(format!("Failed to encode request: {}", e)))?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            return Err(LoadError::Protocol("interpreter exited".to_string()));
        }
        serde_json::from_str(&reply)
            .map_err(|e| LoadError::Protocol(format!("{}: {:?}", e, reply.trim_end())))
    }
}

impl Namespace for PythonSession {
    fn execute(&mut self, source: &str) -> Result<String, ExecError> {
        let response = self
            .request(&Request::Exec { source })
            .map_err(|e| ExecError::Channel(e.to_string()))?;
        let output = response.output.unwrap_or_default();
        if response.ok {
            Ok(output)
        } else {
            Err(ExecError::Raised {
                output,
                message: response.error.unwrap_or_default(),
            })
        }
    }
}

impl Drop for PythonSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
