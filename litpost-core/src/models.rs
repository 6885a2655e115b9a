//! The post aggregate.

use crate::blocks::{Block, RenderOptions};
use crate::config::MetadataConfig;
use crate::doctest::Example;
use crate::metadata::{self, AttributeError, Attributes};
use crate::slug::slugify;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("Post file name {0:?} should start with a unique integer post ID")]
    InvalidFilename(String),

    #[error("Attribute `{0}` must hold the integer post ID")]
    InvalidId(String),

    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

/// A literate source file turned into a publishable post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub tags: Vec<String>,
    pub draft: bool,
    pub date: NaiveDateTime,
    pub updated: NaiveDateTime,
    pub slug: String,
    pub blocks: Vec<Block>,
    #[serde(skip)]
    pub source: String,
    pub path: PathBuf,
}

impl Post {
    /// Validate metadata and assemble a post from an already decomposed source.
    pub fn from_parts(
        path: &Path,
        source: String,
        attrs: &Attributes,
        blocks: Vec<Block>,
        metadata_config: &MetadataConfig,
    ) -> Result<Self, PostError> {
        let file_id = id_from_filename(path)?;

        let id_attr = &metadata_config.id_attribute;
        let id = match metadata::required_int(attrs, id_attr) {
            Ok(n) => u32::try_from(n).map_err(|_| PostError::InvalidId(id_attr.clone()))?,
            Err(_) => return Err(PostError::InvalidId(id_attr.clone())),
        };
        if id != file_id {
            tracing::warn!(
                path = %path.display(),
                file_id,
                id,
                "file name ID differs from `{}` attribute; using the attribute",
                id_attr
            );
        }

        let title = metadata::required_str(attrs, metadata::TITLE)?;
        let author = metadata::required_str(attrs, metadata::AUTHOR)?;
        let date = metadata::required_datetime(attrs, metadata::DATE)?;
        let updated = metadata::optional_datetime(attrs, metadata::UPDATED)?.unwrap_or(date);
        let tags = metadata::optional_strings(attrs, metadata::TAGS)?.unwrap_or_default();
        let draft = metadata::optional_bool(attrs, metadata::DRAFT)?.unwrap_or(false);
        let slug = slugify(&title);

        Ok(Self {
            id,
            title,
            author,
            tags,
            draft,
            date,
            updated,
            slug,
            blocks,
            source,
            path: path.to_path_buf(),
        })
    }

    /// Published means not a draft and dated in the past, as of `now`.
    pub fn is_published_at(&self, now: NaiveDateTime) -> bool {
        !self.draft && self.date < now
    }

    /// [`Post::is_published_at`] evaluated against the local clock.
    pub fn is_published(&self) -> bool {
        self.is_published_at(chrono::Local::now().naive_local())
    }

    /// Render every block and join them with newlines.
    pub fn render_document(&self, options: &RenderOptions) -> String {
        self.blocks
            .iter()
            .map(|b| b.render(options))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All examples across all example groups, in block order.
    pub fn examples(&self) -> impl Iterator<Item = &Example> {
        self.blocks.iter().flat_map(Block::examples)
    }

    pub fn examples_mut(&mut self) -> impl Iterator<Item = &mut Example> {
        self.blocks.iter_mut().flat_map(Block::examples_mut)
    }

    /// Output path relative to the site root: `posts/<slug>.<format>`
    pub fn output_rel_path(&self, format: &str) -> String {
        format!("posts/{}.{}", self.slug, format)
    }

    /// Link to this post. With no prefix the link is site-relative.
    pub fn url(&self, prefix: Option<&str>, format: &str) -> String {
        let prefix = prefix.unwrap_or("").trim_end_matches('/');
        format!("{}/{}", prefix, self.output_rel_path(format))
    }
}

/// The leading integer of `<digits>_<rest>.<ext>`
pub fn id_from_filename(path: &Path) -> Result<u32, PostError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits = file_name
        .split('_')
        .next()
        .unwrap_or("")
        .trim_start_matches('0');
    digits
        .parse::<u32>()
        .map_err(|_| PostError::InvalidFilename(file_name.clone()))
}
