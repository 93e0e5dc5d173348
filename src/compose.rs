//! Template composition.
//!
//! Turns one source document into the final HTML text. How depends on the
//! document kind:
//!
//! ```text
//! *.html.peb          whole file evaluated as a template      → output
//! *.md, *.md.peb      front matter split off
//!                     body evaluated as an inline template    → markdown
//!                     markdown converted                      → html
//!                     html wrapped by the named layout        → output
//! anything else       copied verbatim                         → output
//! ```
//!
//! Each evaluation gets its own typed context ([`LayoutDocumentContext`],
//! [`InlineContext`], [`PageContext`]) so the variables a template can rely
//! on are fixed per phase:
//!
//! | Phase             | `body`       | `lastCommit` | `meta` | `navigation` |
//! |-------------------|--------------|--------------|--------|--------------|
//! | `.html.peb` file  | none         | -            | -      | yes          |
//! | inline markdown   | -            | yes          | yes    | yes          |
//! | layout wrapping   | html         | yes          | yes    | yes          |
//!
//! Layouts are loaded by name from the template directory as
//! `<name>.html.peb` and may use `{% extends %}`/`{% include %}` between
//! themselves. Output is not auto-escaped: `{{ body }}` inserts the rendered
//! HTML unchanged.
//!
//! Templates also get an `active` test for menus:
//!
//! ```jinja
//! {% for node in navigation.nodes %}
//!   <a href="{{ node.path }}"{% if node.path is active(navigation.currentPath) %} class="is-active"{% endif %}>{{ node.title }}</a>
//! {% endfor %}
//! ```

use crate::config::SiteConfig;
use crate::frontmatter::{self, FrontMatter, FrontMatterError};
use crate::history::LastModified;
use crate::markdown;
use crate::navigation::{self, NavigationRoot};
use crate::sources::{DocumentKind, SourceDocument};
use minijinja::{AutoEscape, Environment, ErrorKind, Template, path_loader};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File suffix of layout templates.
pub const LAYOUT_SUFFIX: &str = ".html.peb";

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error("Layout template '{name}' not found at {path}")]
    MissingLayout { name: String, path: PathBuf },
    #[error("Template error in {path}: {source}")]
    Template {
        path: PathBuf,
        source: minijinja::Error,
    },
}

/// Context of a `*.html.peb` document evaluated as a whole.
#[derive(Debug, Serialize)]
pub struct LayoutDocumentContext<'a> {
    /// Always none: there is no wrapped content.
    pub body: Option<&'a str>,
    pub navigation: &'a NavigationRoot,
}

/// Context of a markdown body evaluated before conversion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineContext<'a> {
    pub last_commit: Option<&'a str>,
    pub meta: &'a FrontMatter,
    pub navigation: &'a NavigationRoot,
}

/// Context of the layout wrapping a converted markdown page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext<'a> {
    pub body: &'a str,
    pub last_commit: Option<&'a str>,
    pub meta: &'a FrontMatter,
    pub navigation: &'a NavigationRoot,
}

/// Renders documents against a shared, read-only template environment.
///
/// One composer serves a whole build and may be used from many threads.
pub struct Composer {
    env: Environment<'static>,
    template_path: PathBuf,
    default_template: String,
}

impl Composer {
    pub fn new(config: &SiteConfig) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(config.template_path.clone()));
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        env.add_test("active", |node: &str, current: Option<&str>| {
            current.is_some_and(|current| navigation::is_active(node, current))
        });

        Self {
            env,
            template_path: config.template_path.clone(),
            default_template: config.default_template.clone(),
        }
    }

    /// Render a document to its final text.
    ///
    /// `navigation` must already be stamped with the document's slug.
    pub fn render(
        &self,
        doc: &SourceDocument,
        navigation: &NavigationRoot,
        history: &dyn LastModified,
    ) -> Result<String, ComposeError> {
        let text = fs::read_to_string(&doc.path).map_err(|source| ComposeError::Io {
            path: doc.path.clone(),
            source,
        })?;

        match doc.kind {
            DocumentKind::Layout => self.render_layout_document(&doc.path, &text, navigation),
            DocumentKind::Markdown => {
                let last_commit = history.last_modified(&doc.path);
                self.render_markdown(&doc.path, &text, navigation, last_commit.as_deref())
            }
            DocumentKind::Plain => Ok(text),
        }
    }

    /// Evaluate a whole `*.html.peb` file as a template.
    pub fn render_layout_document(
        &self,
        path: &Path,
        text: &str,
        navigation: &NavigationRoot,
    ) -> Result<String, ComposeError> {
        let ctx = LayoutDocumentContext {
            body: None,
            navigation,
        };
        self.env
            .render_named_str(&path.to_string_lossy(), text, ctx)
            .map_err(|source| ComposeError::Template {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Front matter, inline evaluation, markdown conversion, layout wrapping.
    pub fn render_markdown(
        &self,
        path: &Path,
        text: &str,
        navigation: &NavigationRoot,
        last_commit: Option<&str>,
    ) -> Result<String, ComposeError> {
        let (meta, body) = frontmatter::parse(text, path)?;

        let inline = InlineContext {
            last_commit,
            meta: &meta,
            navigation,
        };
        let resolved = self
            .env
            .render_named_str(&path.to_string_lossy(), body, inline)
            .map_err(|source| ComposeError::Template {
                path: path.to_path_buf(),
                source,
            })?;

        let html = markdown::render(&resolved);

        let layout_name = meta.template.as_deref().unwrap_or(&self.default_template);
        let layout = self.layout(layout_name)?;
        let page = PageContext {
            body: &html,
            last_commit,
            meta: &meta,
            navigation,
        };
        layout.render(page).map_err(|source| ComposeError::Template {
            path: self.layout_path(layout_name),
            source,
        })
    }

    fn layout(&self, name: &str) -> Result<Template<'_, '_>, ComposeError> {
        self.env
            .get_template(&format!("{name}{LAYOUT_SUFFIX}"))
            .map_err(|source| match source.kind() {
                ErrorKind::TemplateNotFound => ComposeError::MissingLayout {
                    name: name.to_string(),
                    path: self.layout_path(name),
                },
                _ => ComposeError::Template {
                    path: self.layout_path(name),
                    source,
                },
            })
    }

    fn layout_path(&self, name: &str) -> PathBuf {
        self.template_path.join(format!("{name}{LAYOUT_SUFFIX}"))
    }
}
