//! Section navigation trees.
//!
//! Each section (and the content root) may carry a `navigation.yml` listing
//! the menu for that part of the site:
//!
//! ```yaml
//! - path: /docs/intro
//!   title: Introduction
//!   icon: book
//! - path: /docs/guides
//!   title: Guides
//!   icon: map
//!   spacer: true
//!   description: Task-oriented walkthroughs
//!   children:
//!     - path: /docs/guides/install
//!       title: Install
//!       icon: download
//! ```
//!
//! The file is optional; without it a section renders with an empty tree.
//! A tree is loaded once per section and shared read-only by every document
//! of that section. Per-page state (the current path and the breadcrumb
//! trail) lives on a stamped copy made by [`NavigationRoot::with_current_path`].

use crate::config::SiteConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use thiserror::Error;

/// File name looked up at the root of every section.
pub const NAVIGATION_FILE: &str = "navigation.yml";

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Failed to read {label}navigation.yml: {source}")]
    Io {
        label: String,
        source: std::io::Error,
    },
    #[error("Failed to parse {label}navigation.yml: {message}")]
    Malformed { label: String, message: String },
}

/// One menu entry. Child order is menu order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigationNode {
    pub path: String,
    pub title: String,
    pub icon: String,
    #[serde(default)]
    pub spacer: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<NavigationNode>,
}

/// A breadcrumb entry on the way to the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub path: String,
    pub title: String,
}

/// A navigation tree as handed to templates.
///
/// `nodes` is shared between every copy; stamping a page never touches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRoot {
    pub nodes: Arc<Vec<NavigationNode>>,
    pub current_path: Option<String>,
    pub trail: Vec<Crumb>,
}

impl NavigationRoot {
    pub fn new(nodes: Vec<NavigationNode>) -> Self {
        Self {
            nodes: Arc::new(nodes),
            current_path: None,
            trail: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy of this tree stamped with the page being rendered.
    pub fn with_current_path(&self, slug: &str) -> Self {
        let mut trail = Vec::new();
        find_trail(&self.nodes, slug, &mut trail);
        Self {
            nodes: Arc::clone(&self.nodes),
            current_path: Some(slug.to_string()),
            trail,
        }
    }
}

/// Depth-first search for the node whose path is `slug`, recording the chain.
fn find_trail(nodes: &[NavigationNode], slug: &str, trail: &mut Vec<Crumb>) -> bool {
    let target = normalize(slug);
    for node in nodes {
        trail.push(Crumb {
            path: node.path.clone(),
            title: node.title.clone(),
        });
        if normalize(&node.path) == target || find_trail(&node.children, slug, trail) {
            return true;
        }
        trail.pop();
    }
    false
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Whether a menu entry should be highlighted for the current page.
///
/// True for the page itself and for every ancestor path of it.
pub fn is_active(node_path: &str, current_path: &str) -> bool {
    let node = normalize(node_path);
    let current = normalize(current_path);
    if node == current {
        return true;
    }
    node != "/" && current.starts_with(node) && current[node.len()..].starts_with('/')
}

/// How a section is named in messages: `/` for the root, `/name/` otherwise.
pub fn section_label(section: Option<&str>) -> String {
    match section {
        Some(name) => format!("/{name}/"),
        None => "/".to_string(),
    }
}

/// Load the navigation tree of a section.
///
/// A missing file is an empty tree. A file that exists but cannot be read or
/// decoded is an error naming the section.
pub fn load(config: &SiteConfig, section: Option<&str>) -> Result<NavigationRoot, NavigationError> {
    let file = config.section_root(section).join(NAVIGATION_FILE);
    if !file.is_file() {
        return Ok(NavigationRoot::default());
    }

    let content = fs::read_to_string(&file).map_err(|source| NavigationError::Io {
        label: section_label(section),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(NavigationRoot::default());
    }

    let nodes: Vec<NavigationNode> =
        serde_yaml::from_str(&content).map_err(|e| NavigationError::Malformed {
            label: section_label(section),
            message: e.to_string(),
        })?;
    Ok(NavigationRoot::new(nodes))
}
