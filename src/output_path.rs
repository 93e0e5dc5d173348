//! Output path and URL slug derivation.
//!
//! Every document becomes a clean, extension-less URL. The conversion suffix
//! is stripped from the file name (`.md`, `.html`, or two components for
//! anything ending in `.peb`), then the stem is "index folded":
//!
//! ```text
//! content/about.md              →  output/about/index.html       /about
//! content/index.md              →  output/index.html             /
//! content/docs/intro.md.peb     →  output/docs/intro/index.html  /docs/intro
//! content/docs/guides/index.md  →  output/docs/guides/index.html /docs/guides
//! content/landing.html.peb      →  output/landing/index.html     /landing
//! ```
//!
//! The mapping is a pure function of the document's path relative to its
//! section root and the section name.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Where a document is written and how it is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Document path relative to its section root with the conversion suffix
    /// removed, `/`-separated.
    pub stem: String,
    /// Output file relative to the output root, section directory included.
    pub file: PathBuf,
    /// Canonical URL of the page, e.g. `/docs/intro`.
    pub slug: String,
}

const INDEX: &str = "index";

/// Map a document path (relative to its section root) to its output.
pub fn resolve(relative: &Path, section: Option<&str>) -> OutputTarget {
    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if let Some(name) = parts.last_mut() {
        *name = strip_conversion_suffix(name).to_string();
    }

    let is_index = parts.last().is_some_and(|name| name == INDEX);

    let mut file = PathBuf::new();
    if let Some(name) = section {
        file.push(name);
    }
    if is_index {
        if let Some((last, dirs)) = parts.split_last() {
            file.extend(dirs);
            file.push(format!("{last}.html"));
        }
    } else {
        file.extend(&parts);
        file.push("index.html");
    }

    let page_parts = if is_index {
        &parts[..parts.len() - 1]
    } else {
        &parts[..]
    };
    let slug = slug_for(section, &page_parts.join("/"));

    OutputTarget {
        stem: parts.join("/"),
        file,
        slug,
    }
}

/// Drop the conversion suffix from a file name.
///
/// Names ending in `.peb` lose two extension components (`page.html.peb` →
/// `page`), everything else loses one (`page.md` → `page`).
pub fn strip_conversion_suffix(name: &str) -> &str {
    let once = strip_extension(name);
    if name.ends_with(".peb") {
        strip_extension(once)
    } else {
        once
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// `/` + section + page path, without doubled or trailing separators.
fn slug_for(section: Option<&str>, page: &str) -> String {
    let joined = format!("{}/{}", section.unwrap_or(""), page);
    let segments: Vec<&str> = joined.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Create the directory an output file goes into.
///
/// Safe to call concurrently for the same directory.
pub fn ensure_parent(file: &Path) -> std::io::Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
