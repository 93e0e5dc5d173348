//! Full site builds.
//!
//! A build runs in a fixed order:
//!
//! ```text
//! 1. Validate   site config against the filesystem
//! 2. Plan       list every section's documents, resolve their outputs,
//!               reject two documents claiming the same output file
//! 3. Stage      empty a fresh staging directory next to the output root
//! 4. Render     the root section, then each configured section in order
//! 5. Swap       replace the output root with the staging directory
//! ```
//!
//! Within a section, documents render in parallel on the rayon pool: each
//! one only reads its own file, the section's shared navigation tree, and
//! the layout templates. The first failure stops the build. Because pages
//! are written to the staging directory, a failed build leaves the previous
//! output root exactly as it was.

use crate::compose::{ComposeError, Composer};
use crate::config::{ConfigError, SiteConfig};
use crate::frontmatter;
use crate::history::{self, LastModified};
use crate::navigation::{self, NavigationError, NavigationRoot};
use crate::output_path::{self, OutputTarget};
use crate::sources::{self, DocumentKind, SourceDocument, SourceError};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("{output} would be written by both {first} and {second}")]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BuildError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One written page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Source path relative to the section root.
    pub source: PathBuf,
    /// Output file relative to the output root.
    pub output: PathBuf,
    pub slug: String,
    pub kind: DocumentKind,
}

/// Result of one section pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionReport {
    /// `None` for the root section.
    pub section: Option<String>,
    /// Top-level entries in the section's navigation tree.
    pub navigation_nodes: usize,
    /// Pages in source path order.
    pub pages: Vec<RenderedPage>,
}

/// Result of a build or check, in rendering order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub output_path: PathBuf,
    pub sections: Vec<SectionReport>,
}

impl BuildReport {
    pub fn page_count(&self) -> usize {
        self.sections.iter().map(|s| s.pages.len()).sum()
    }
}

/// A document with its output already decided.
#[derive(Debug)]
struct Planned {
    doc: SourceDocument,
    target: OutputTarget,
}

/// All sections in rendering order: root first, then as configured.
fn section_order(config: &SiteConfig) -> Vec<Option<&str>> {
    std::iter::once(None)
        .chain(config.sections.iter().map(|s| Some(s.as_str())))
        .collect()
}

/// List and resolve every document, rejecting output collisions.
fn plan(config: &SiteConfig) -> Result<Vec<(Option<&str>, Vec<Planned>)>, BuildError> {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut sections = Vec::new();

    for section in section_order(config) {
        let mut planned = Vec::new();
        for doc in sources::list(config, section)? {
            let target = output_path::resolve(&doc.relative, section);
            if let Some(first) = claimed.insert(target.file.clone(), doc.path.clone()) {
                return Err(BuildError::OutputCollision {
                    output: target.file,
                    first,
                    second: doc.path,
                });
            }
            planned.push(Planned { doc, target });
        }
        sections.push((section, planned));
    }
    Ok(sections)
}

/// Build the whole site into `config.output_path`.
///
/// Uses the current rayon pool for per-document parallelism.
pub fn build_all(config: &SiteConfig) -> Result<BuildReport, BuildError> {
    config.validate()?;
    let history = history::from_config(config);
    build_with_history(config, history.as_ref())
}

/// [`build_all`] with an explicit `lastCommit` provider.
pub fn build_with_history(
    config: &SiteConfig,
    history: &dyn LastModified,
) -> Result<BuildReport, BuildError> {
    let plan = plan(config)?;
    let composer = Composer::new(config);

    let staging = staging_dir(&config.output_path);
    reset_dir(&staging)?;

    let rendered = plan
        .iter()
        .map(|(section, docs)| render_section(config, &composer, history, *section, docs, &staging))
        .collect::<Result<Vec<_>, _>>();

    let sections = match rendered {
        Ok(sections) => sections,
        Err(e) => {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                tracing::warn!(path = %staging.display(), error = %cleanup, "Failed to remove staging directory");
            }
            return Err(e);
        }
    };

    swap_into_place(&staging, &config.output_path)?;
    tracing::info!(output = %config.output_path.display(), "Build complete");

    Ok(BuildReport {
        output_path: config.output_path.clone(),
        sections,
    })
}

fn render_section(
    config: &SiteConfig,
    composer: &Composer,
    history: &dyn LastModified,
    section: Option<&str>,
    docs: &[Planned],
    staging: &Path,
) -> Result<SectionReport, BuildError> {
    let navigation = navigation::load(config, section)?;
    tracing::info!(
        section = %navigation::section_label(section),
        documents = docs.len(),
        navigation_nodes = navigation.nodes.len(),
        "Rendering section"
    );

    let pages = docs
        .par_iter()
        .map(|planned| render_document(composer, history, &navigation, planned, staging))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SectionReport {
        section: section.map(str::to_string),
        navigation_nodes: navigation.nodes.len(),
        pages,
    })
}

fn render_document(
    composer: &Composer,
    history: &dyn LastModified,
    navigation: &NavigationRoot,
    planned: &Planned,
    staging: &Path,
) -> Result<RenderedPage, BuildError> {
    let Planned { doc, target } = planned;
    let stamped = navigation.with_current_path(&target.slug);
    let html = composer.render(doc, &stamped, history)?;

    let file = staging.join(&target.file);
    output_path::ensure_parent(&file).map_err(BuildError::io(&file))?;
    fs::write(&file, html).map_err(BuildError::io(&file))?;
    tracing::debug!(source = %doc.path.display(), slug = %target.slug, "Rendered");

    Ok(RenderedPage {
        source: doc.relative.clone(),
        output: target.file.clone(),
        slug: target.slug.clone(),
        kind: doc.kind,
    })
}

/// Validate everything a build would touch without writing any output.
///
/// Checks config, output collisions, navigation files, and the front matter
/// of every markdown document.
pub fn check(config: &SiteConfig) -> Result<BuildReport, BuildError> {
    config.validate()?;
    let plan = plan(config)?;

    let mut sections = Vec::new();
    for (section, docs) in &plan {
        let navigation = navigation::load(config, *section)?;
        for Planned { doc, .. } in docs.iter().filter(|p| p.doc.kind == DocumentKind::Markdown) {
            let text = fs::read_to_string(&doc.path).map_err(|source| ComposeError::Io {
                path: doc.path.clone(),
                source,
            })?;
            frontmatter::parse(&text, &doc.path).map_err(ComposeError::from)?;
        }
        sections.push(SectionReport {
            section: section.map(str::to_string),
            navigation_nodes: navigation.nodes.len(),
            pages: docs
                .iter()
                .map(|Planned { doc, target }| RenderedPage {
                    source: doc.relative.clone(),
                    output: target.file.clone(),
                    slug: target.slug.clone(),
                    kind: doc.kind,
                })
                .collect(),
        });
    }

    Ok(BuildReport {
        output_path: config.output_path.clone(),
        sections,
    })
}

// ============================================================================
// Staging and swap
// ============================================================================

/// Sibling of the output root, hidden: `output` → `.output.staging`.
fn staging_dir(output: &Path) -> PathBuf {
    sibling(output, "staging")
}

fn sibling(output: &Path, suffix: &str) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{name}.{suffix}"))
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Remove whatever is at `dir` and create it empty.
fn reset_dir(dir: &Path) -> Result<(), BuildError> {
    if dir.symlink_metadata().is_ok() {
        remove_path(dir).map_err(BuildError::io(dir))?;
    }
    fs::create_dir_all(dir).map_err(BuildError::io(dir))
}

/// Move the finished staging directory to the output root.
///
/// The previous output is moved aside first and only deleted once the new
/// tree is in place; if the final rename fails it is moved back.
fn swap_into_place(staging: &Path, output: &Path) -> Result<(), BuildError> {
    let previous = sibling(output, "previous");
    if previous.symlink_metadata().is_ok() {
        remove_path(&previous).map_err(BuildError::io(&previous))?;
    }

    let had_output = output.symlink_metadata().is_ok();
    if had_output {
        fs::rename(output, &previous).map_err(BuildError::io(output))?;
    }

    if let Err(source) = fs::rename(staging, output) {
        if had_output {
            if let Err(restore) = fs::rename(&previous, output) {
                tracing::warn!(path = %previous.display(), error = %restore, "Failed to restore previous output");
            }
        }
        return Err(BuildError::Io {
            path: output.to_path_buf(),
            source,
        });
    }

    if had_output {
        remove_path(&previous).map_err(BuildError::io(&previous))?;
    }
    Ok(())
}
