//! CLI output formatting for builds and checks.
//!
//! Output is **page-centric**: every entry leads with the URL a page is served
//! at and the file it lands in, with the source document shown as an indented
//! `Source:` line. Sections are listed in rendering order, root first.
//!
//! ```text
//! Section /
//! 001 / → index.html
//!     Source: index.md
//! 002 /about → about/index.html
//!     Source: about.md
//! 003 /landing → landing/index.html
//!     Source: landing.html.peb (template)
//!
//! Section /docs/ (2 menu entries)
//! 001 /docs → docs/index.html
//!     Source: index.md
//!
//! Built 4 pages in 2 sections → output
//! ```
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::navigation;
use crate::site::{BuildReport, RenderedPage, SectionReport};
use crate::sources::DocumentKind;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `/`-separated display form of a relative path.
fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn section_header(section: &SectionReport) -> String {
    let label = navigation::section_label(section.section.as_deref());
    match section.navigation_nodes {
        0 => format!("Section {label}"),
        n => format!("Section {label} ({})", plural(n, "menu entry", "menu entries")),
    }
}

fn page_lines(index: usize, page: &RenderedPage) -> Vec<String> {
    let source = display_path(&page.source);
    let source = match page.kind {
        DocumentKind::Markdown => source,
        DocumentKind::Layout => format!("{source} (template)"),
        DocumentKind::Plain => format!("{source} (copied)"),
    };
    vec![
        format!(
            "{} {} → {}",
            format_index(index),
            page.slug,
            display_path(&page.output)
        ),
        format!("{}Source: {source}", indent(1)),
    ]
}

fn format_sections(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, section) in report.sections.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(section_header(section));
        for (pos, page) in section.pages.iter().enumerate() {
            lines.extend(page_lines(pos + 1, page));
        }
    }
    lines
}

fn totals(report: &BuildReport) -> String {
    format!(
        "{} in {}",
        plural(report.page_count(), "page", "pages"),
        plural(report.sections.len(), "section", "sections")
    )
}

/// Format the result of a build.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = format_sections(report);
    lines.push(String::new());
    lines.push(format!(
        "Built {} → {}",
        totals(report),
        report.output_path.display()
    ));
    lines
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

/// Format the result of a check: same listing, nothing written.
pub fn format_check_report(report: &BuildReport) -> Vec<String> {
    let mut lines = format_sections(report);
    lines.push(String::new());
    lines.push(format!("Content is valid: {}", totals(report)));
    lines
}

pub fn print_check_report(report: &BuildReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}
