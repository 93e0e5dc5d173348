//! Source document discovery.
//!
//! Content lives under the sources root:
//!
//! ```text
//! content/
//! ├── navigation.yml          # Root menu (optional)
//! ├── index.md                # Root section: direct children only
//! ├── about.md
//! ├── landing.html.peb        # Whole-file template, no markdown
//! ├── robots.html             # Copied through as-is
//! └── docs/                   # Section (listed in config)
//!     ├── navigation.yml      # Section menu (optional)
//!     ├── intro.md
//!     └── guides/
//!         └── install.md.peb  # Sections are walked recursively
//! ```
//!
//! The root section only looks at files directly inside the sources root,
//! so section directories are never rendered twice. Files are eligible when
//! their last extension is `md`, `html`, or `peb`; anything else is skipped.

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

const ALLOWED_EXTENSIONS: &[&str] = &["html", "md", "peb"];

/// How a document is turned into HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `*.html.peb`: the whole file is a template.
    Layout,
    /// `*.md` and `*.md.peb`: front matter, inline template, markdown, layout.
    Markdown,
    /// Anything else (`*.html`, bare `*.peb`): copied verbatim.
    Plain,
}

impl DocumentKind {
    pub fn of(file_name: &str) -> Self {
        if file_name.ends_with(".html.peb") {
            Self::Layout
        } else if file_name.ends_with(".md") || file_name.ends_with(".md.peb") {
            Self::Markdown
        } else {
            Self::Plain
        }
    }
}

/// A discovered content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path as found on disk (sources root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the section root.
    pub relative: PathBuf,
    pub kind: DocumentKind,
}

/// List the documents of a section, or of the root when `section` is `None`.
///
/// Results are sorted by relative path so builds are reproducible.
pub fn list(config: &SiteConfig, section: Option<&str>) -> Result<Vec<SourceDocument>, SourceError> {
    let root = config.section_root(section);
    let walker = match section {
        Some(_) => WalkDir::new(&root),
        None => WalkDir::new(&root).max_depth(1),
    };

    let mut documents = Vec::new();
    for entry in walker.min_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| SourceError::Walk {
            path: root.clone(),
            source,
        })?;
        if !entry.file_type().is_file() || !is_eligible(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&root)
            .unwrap_or(entry.path())
            .to_path_buf();
        let kind = DocumentKind::of(&entry.file_name().to_string_lossy());
        documents.push(SourceDocument {
            path: entry.path().to_path_buf(),
            relative,
            kind,
        });
    }

    documents.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(documents)
}

fn is_eligible(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext))
}
