//! Configuration parsing and management.

use crate::blocks::RenderOptions;
use crate::metadata::FIXED_ATTRIBUTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the litpost.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Absolute base URL used for absolute post links
    #[serde(default)]
    pub base_url: Option<String>,

    /// Extension of generated post files and links
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub render: RenderOptions,

    #[serde(default)]
    pub python: PythonConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_output_format() -> String {
    String::from("html")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig::default(),
            base_url: None,
            output_format: default_output_format(),
            metadata: MetadataConfig::default(),
            render: RenderOptions::default(),
            python: PythonConfig::default(),
            renderer: RendererConfig::default(),
            config_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_posts_dir")]
    pub posts: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("posts")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("site")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            posts: default_posts_dir(),
            output: default_output_dir(),
        }
    }
}

/// Names of the reserved metadata attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Attribute holding the numeric post identifier
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
}

fn default_id_attribute() -> String {
    String::from("id")
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            id_attribute: default_id_attribute(),
        }
    }
}

impl MetadataConfig {
    /// Every top-level name treated as metadata (and hidden from the post)
    pub fn attribute_names(&self) -> Vec<String> {
        std::iter::once(self.id_attribute.clone())
            .chain(FIXED_ATTRIBUTES.iter().map(|s| s.to_string()))
            .collect()
    }
}

/// How to reach a Python interpreter for module loading and example runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default = "default_python")]
    pub command: String,

    /// Load modules statically (no code execution) instead of via Python
    #[serde(default)]
    pub static_only: bool,
}

fn default_python() -> String {
    String::from("python3")
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            command: default_python(),
            static_only: false,
        }
    }
}

/// External reStructuredText renderer
///
/// With `builtin_frontend` set, `command` is a Python interpreter that runs
/// litpost's own docutils front end (which understands the `sourcecode`
/// directive). Otherwise `command` is run as is, e.g. `rst2html`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_renderer")]
    pub command: String,

    #[serde(default = "default_renderer_args")]
    pub args: Vec<String>,

    #[serde(default = "default_true")]
    pub builtin_frontend: bool,
}

fn default_renderer() -> String {
    String::from("python3")
}

fn default_true() -> bool {
    true
}

fn default_renderer_args() -> Vec<String> {
    vec!["--report=2".to_string(), "--halt=5".to_string()]
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: default_renderer(),
            args: default_renderer_args(),
            builtin_frontend: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Get the posts directory, resolved relative to config file
    pub fn posts_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.posts)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Prefix for post links: `None` for site-relative links, otherwise the
    /// configured absolute base URL.
    pub fn link_prefix(&self, absolute: bool) -> Option<&str> {
        if absolute {
            self.base_url.as_deref()
        } else {
            None
        }
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
