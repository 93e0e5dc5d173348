//! Shared test utilities for the simple-site test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_fixtures();
//! let report = build_all(&site.config).unwrap();
//!
//! let page = find_page(&report, "/docs/intro");
//! assert_eq!(page.output, PathBuf::from("docs/intro/index.html"));
//! assert!(read_output(&site.config, "docs/intro/index.html").contains("<h1"));
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::site::{BuildReport, RenderedPage};

// =========================================================================
// Fixture setup
// =========================================================================

/// An isolated copy of `fixtures/site/` and a config pointing into it.
pub struct FixtureSite {
    pub dir: TempDir,
    pub config: SiteConfig,
}

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures. The output directory is not created.
pub fn setup_fixtures() -> FixtureSite {
    let dir = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, dir.path()).unwrap();

    let config = SiteConfig {
        sources_path: dir.path().join("content"),
        output_path: dir.path().join("output"),
        template_path: dir.path().join("templates"),
        sections: vec!["docs".to_string()],
        ..SiteConfig::default()
    };
    FixtureSite { dir, config }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Output inspection
// =========================================================================

/// Every file under `root`, `/`-separated and sorted.
pub fn output_files(root: &Path) -> Vec<String> {
    read_tree(root).into_keys().collect()
}

/// Every file under `root` with its bytes, keyed by `/`-separated path.
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (rel, std::fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Read one generated file as text. Panics if missing.
pub fn read_output(config: &SiteConfig, relative: &str) -> String {
    let path = config.output_path.join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

// =========================================================================
// Report lookups: panic with a clear message on miss
// =========================================================================

/// Find a page by slug across all sections. Panics if not found.
pub fn find_page<'a>(report: &'a BuildReport, slug: &str) -> &'a RenderedPage {
    report
        .sections
        .iter()
        .flat_map(|s| s.pages.iter())
        .find(|p| p.slug == slug)
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = report
                .sections
                .iter()
                .flat_map(|s| s.pages.iter())
                .map(|p| p.slug.as_str())
                .collect();
            panic!("page '{slug}' not found. Available: {slugs:?}")
        })
}
