//! # Simple Site
//!
//! A static site generator for documentation-style sites. Content is a tree
//! of markdown and template files; every file becomes one clean URL:
//! `content/docs/intro.md` is served at `/docs/intro` from
//! `output/docs/intro/index.html`.
//!
//! # Architecture: One Pass Per Section
//!
//! The content root and every configured section (a top-level directory such
//! as `docs/`) are built independently, root first:
//!
//! ```text
//! 1. Navigation   navigation.yml       →  shared menu tree for the section
//! 2. Sources      section directory    →  documents (md, html, peb)
//! 3. Paths        document path        →  output file + slug
//! 4. Compose      document + menu      →  final HTML (rendered in parallel)
//! ```
//!
//! Markdown documents pass through four steps of their own: the front matter
//! is split off, the body is evaluated as a template, the result is converted
//! to HTML, and that HTML is wrapped by the layout named in the front matter.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Full builds and checks: planning, staging, per-section rendering |
//! | [`config`] | `site.toml` loading, layering with CLI flags, and validation |
//! | [`sources`] | Lists the documents of the root and of each section |
//! | [`navigation`] | Per-section `navigation.yml` trees, current path, breadcrumbs |
//! | [`output_path`] | Document path → output file and URL slug |
//! | [`frontmatter`] | `---` delimited YAML header parsing |
//! | [`markdown`] | Markdown → HTML with heading ids |
//! | [`compose`] | Template evaluation and layout wrapping with minijinja |
//! | [`history`] | `lastCommit` dates from git |
//! | [`output`] | CLI output formatting of build and check reports |
//!
//! # Design Decisions
//!
//! ## Runtime Templates
//!
//! Layouts live in a template directory next to the content and are loaded
//! at build time, so a site can change its look without rebuilding the tool.
//! Output is not auto-escaped: layouts insert the converted markdown as-is.
//!
//! ## Clean URLs Only
//!
//! Every page is written as `<slug>/index.html`. An `index` document stands
//! for its directory, so `docs/guides/index.md` is `/docs/guides`.
//!
//! ## All-or-Nothing Builds
//!
//! Pages are rendered into a staging directory next to the output root and
//! moved into place only when every page succeeded. A broken document never
//! leaves a half-written site behind.

pub mod compose;
pub mod config;
pub mod frontmatter;
pub mod history;
pub mod markdown;
pub mod navigation;
pub mod output;
pub mod output_path;
pub mod site;
pub mod sources;

#[cfg(test)]
pub(crate) mod test_helpers;
