//! Front matter extraction.
//!
//! A markdown document opens with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! template: page
//! title: About
//! ---
//! # About
//! ```
//!
//! The block is present only when the very first line is exactly `---`.
//! Everything after the closing marker is the body, kept byte for byte.
//! Markdown documents must carry a block; see [`parse`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Line that opens and closes a front matter block.
pub const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("Front matter is required for all pages: {0}")]
    Missing(PathBuf),
    #[error("Front matter in {0} is never closed with `---`")]
    Unterminated(PathBuf),
    #[error("Failed to parse front matter for {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// Decoded front matter.
///
/// `template` selects the layout; every other key is kept as-is and exposed
/// to templates under `meta.*`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_yaml::Value>,
}

/// Outcome of looking for a front matter block.
#[derive(Debug, PartialEq)]
pub enum Block<'a> {
    /// First line is not the delimiter.
    Absent,
    /// Raw YAML between the markers, and the text after the closing marker.
    Present { yaml: &'a str, body: &'a str },
    /// Opening marker with no closing one.
    Unterminated,
}

/// Locate the front matter block without decoding it.
pub fn split(text: &str) -> Block<'_> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Block::Absent;
    };
    if strip_eol(first) != DELIMITER {
        return Block::Absent;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if strip_eol(line) == DELIMITER {
            return Block::Present {
                yaml: &text[yaml_start..offset],
                body: &text[offset + line.len()..],
            };
        }
        offset += line.len();
    }
    Block::Unterminated
}

fn strip_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Decode the YAML of a front matter block.
///
/// An empty block yields the default (no layout, no fields).
pub fn decode(yaml: &str, path: &Path) -> Result<FrontMatter, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Split and decode a document that must carry front matter.
///
/// `path` is only used for error reporting.
pub fn parse<'a>(text: &'a str, path: &Path) -> Result<(FrontMatter, &'a str), FrontMatterError> {
    match split(text) {
        Block::Absent => Err(FrontMatterError::Missing(path.to_path_buf())),
        Block::Unterminated => Err(FrontMatterError::Unterminated(path.to_path_buf())),
        Block::Present { yaml, body } => Ok((decode(yaml, path)?, body)),
    }
}
