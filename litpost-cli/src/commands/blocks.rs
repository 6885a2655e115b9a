//! Dump the block structure of a source file.

use anyhow::{Context, Result};
use litpost_adapters::decompose;
use litpost_core::Config;
use std::path::Path;

pub fn dump_blocks(config: &Config, path: &Path) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let blocks = decompose(&source, &config.metadata.attribute_names())
        .with_context(|| format!("Failed to decompose {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&blocks)?);
    Ok(())
}
