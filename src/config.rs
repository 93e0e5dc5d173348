//! Build configuration.
//!
//! Handles loading, layering, and validating the build settings. The result
//! is a single immutable [`SiteConfig`] value, constructed once per run and
//! passed by reference to every pipeline component.
//!
//! ## Layers
//!
//! Values are resolved lowest to highest priority:
//!
//! ```text
//! stock defaults  →  site.toml (optional)  →  command-line flags
//! ```
//!
//! Each layer is a sparse TOML table merged onto the one below it, so a
//! `site.toml` only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! sources_path = "content"      # Content documents (markdown, templates, html)
//! output_path = "output"        # Generated site; replaced on every build
//! template_path = "templates"   # Layouts, looked up as <name>.html.peb
//! default_template = "default"  # Layout for documents whose front matter names none
//! sections = []                 # Top-level content directories rendered as sections
//! git_timestamps = false        # Expose each file's last commit date as `lastCommit`
//!
//! [processing]
//! max_processes = 4             # Max parallel renders (omit for auto = CPU cores)
//! ```
//!
//! Relative paths are resolved against the working directory. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the optional configuration file.
pub const CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Root of the content tree.
    pub sources_path: PathBuf,
    /// Root of the generated site.
    pub output_path: PathBuf,
    /// Directory holding the named layout templates.
    pub template_path: PathBuf,
    /// Layout used when a document's front matter has no `template`.
    pub default_template: String,
    /// Top-level content directories, rendered in this order after the root.
    pub sections: Vec<String>,
    /// Look up each document's last commit date with git.
    pub git_timestamps: bool,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            sources_path: PathBuf::from("content"),
            output_path: PathBuf::from("output"),
            template_path: PathBuf::from("templates"),
            default_template: "default".to_string(),
            sections: Vec::new(),
            git_timestamps: false,
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Check the configuration against the filesystem.
    ///
    /// Every failure here is fatal before any output is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sources_path.is_dir() {
            return Err(ConfigError::Validation(format!(
                "sources_path is not a directory: {}",
                self.sources_path.display()
            )));
        }
        if !self.template_path.is_dir() {
            return Err(ConfigError::Validation(format!(
                "template_path is not a directory: {}",
                self.template_path.display()
            )));
        }
        if self.default_template.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_template must not be empty".into(),
            ));
        }

        let sources = std::path::absolute(&self.sources_path)?;
        let output = std::path::absolute(&self.output_path)?;
        if output == sources || output.starts_with(&sources) {
            return Err(ConfigError::Validation(format!(
                "output_path must not be inside sources_path: {}",
                self.output_path.display()
            )));
        }
        if sources.starts_with(&output) {
            return Err(ConfigError::Validation(format!(
                "sources_path must not be inside output_path: {}",
                self.sources_path.display()
            )));
        }
        // The output root is replaced wholesale on every build.
        let templates = std::path::absolute(&self.template_path)?;
        if templates.starts_with(&output) {
            return Err(ConfigError::Validation(format!(
                "template_path must not be inside output_path: {}",
                self.template_path.display()
            )));
        }

        for (idx, section) in self.sections.iter().enumerate() {
            if !is_single_component(section) {
                return Err(ConfigError::Validation(format!(
                    "section must be a single directory name: {section:?}"
                )));
            }
            if self.sections[..idx].contains(section) {
                return Err(ConfigError::Validation(format!(
                    "section declared twice: {section}"
                )));
            }
            if !self.sources_path.join(section).is_dir() {
                return Err(ConfigError::Validation(format!(
                    "section directory not found: {}",
                    self.sources_path.join(section).display()
                )));
            }
        }
        Ok(())
    }

    /// Source root of a section, or of the whole tree for the root section.
    pub fn section_root(&self, section: Option<&str>) -> PathBuf {
        match section {
            Some(name) => self.sources_path.join(name),
            None => self.sources_path.clone(),
        }
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Parallel rendering settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Loading and layering
// =============================================================================

/// Command-line values that take precedence over `site.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sources_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub template_path: Option<PathBuf>,
    pub default_template: Option<String>,
    pub sections: Vec<String>,
    pub git_timestamps: bool,
    pub max_processes: Option<usize>,
}

impl Overrides {
    /// Sparse TOML table holding only the values that were given.
    fn to_toml(&self) -> toml::Value {
        let mut table = toml::value::Table::new();
        let path_value = |p: &Path| toml::Value::String(p.to_string_lossy().into_owned());

        if let Some(p) = &self.sources_path {
            table.insert("sources_path".into(), path_value(p));
        }
        if let Some(p) = &self.output_path {
            table.insert("output_path".into(), path_value(p));
        }
        if let Some(p) = &self.template_path {
            table.insert("template_path".into(), path_value(p));
        }
        if let Some(name) = &self.default_template {
            table.insert("default_template".into(), toml::Value::String(name.clone()));
        }
        if !self.sections.is_empty() {
            let sections = self
                .sections
                .iter()
                .cloned()
                .map(toml::Value::String)
                .collect();
            table.insert("sections".into(), toml::Value::Array(sections));
        }
        if self.git_timestamps {
            table.insert("git_timestamps".into(), toml::Value::Boolean(true));
        }
        if let Some(n) = self.max_processes {
            let mut processing = toml::value::Table::new();
            processing.insert(
                "max_processes".into(),
                toml::Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)),
            );
            table.insert("processing".into(), toml::Value::Table(processing));
        }
        toml::Value::Table(table)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    let mut table = toml::value::Table::new();
    let defaults = SiteConfig::default();
    let path_value = |p: &Path| toml::Value::String(p.to_string_lossy().into_owned());

    table.insert("sources_path".into(), path_value(&defaults.sources_path));
    table.insert("output_path".into(), path_value(&defaults.output_path));
    table.insert("template_path".into(), path_value(&defaults.template_path));
    table.insert(
        "default_template".into(),
        toml::Value::String(defaults.default_template),
    );
    table.insert("sections".into(), toml::Value::Array(Vec::new()));
    table.insert("git_timestamps".into(), toml::Value::Boolean(false));
    table.insert(
        "processing".into(),
        toml::Value::Table(toml::value::Table::new()),
    );
    toml::Value::Table(table)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Layer defaults, the config file at `path` (if any), and CLI overrides.
///
/// Does not validate; call [`SiteConfig::validate`] once the value is final.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<SiteConfig, ConfigError> {
    let mut merged = stock_defaults_value();
    if let Some(file) = load_raw_config(path)? {
        merged = merge_toml(merged, file);
    }
    merged = merge_toml(merged, overrides.to_toml());
    let config: SiteConfig = merged.try_into()?;
    Ok(config)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Site Configuration
# ==================
#
# Every key is optional. Values here override the stock defaults and are in
# turn overridden by command-line flags. Relative paths are resolved against
# the directory the build is run from.

# Content documents: *.md, *.md.peb, *.html.peb and *.html files.
sources_path = "content"

# Generated site. Replaced as a whole when a build succeeds.
output_path = "output"

# Layout templates, looked up by name as <template_path>/<name>.html.peb
template_path = "templates"

# Layout for markdown documents whose front matter has no `template` key.
default_template = "default"

# Top-level content directories rendered as independent sections, each with
# its own navigation.yml. The content root only renders its direct files.
sections = []

# Expose the date of each document's last git commit to templates as
# `lastCommit`. Requires git and a sources directory inside a repository.
git_timestamps = false

[processing]
# Maximum parallel render workers. Omit for all CPU cores.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site_dirs() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("content/docs")).unwrap();
        fs::create_dir_all(tmp.path().join("templates")).unwrap();
        tmp
    }

    fn config_in(tmp: &TempDir) -> SiteConfig {
        SiteConfig {
            sources_path: tmp.path().join("content"),
            output_path: tmp.path().join("output"),
            template_path: tmp.path().join("templates"),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn default_config_paths() {
        let config = SiteConfig::default();
        assert_eq!(config.sources_path, PathBuf::from("content"));
        assert_eq!(config.output_path, PathBuf::from("output"));
        assert_eq!(config.template_path, PathBuf::from("templates"));
        assert_eq!(config.default_template, "default");
        assert!(config.sections.is_empty());
        assert!(!config.git_timestamps);
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(
            r#"
            default_template = "page"
            sections = ["docs", "blog"]
            "#,
        )
        .unwrap();
        assert_eq!(config.default_template, "page");
        assert_eq!(config.sections, vec!["docs", "blog"]);
        assert_eq!(config.sources_path, PathBuf::from("content"));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("default_templte = \"page\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[processing]\nthreads = 2");
        assert!(result.is_err());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE), &Overrides::default()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "output_path = \"public\"\n[processing]\nmax_processes = 2\n").unwrap();

        let config = load_config(&path, &Overrides::default()).unwrap();
        assert_eq!(config.output_path, PathBuf::from("public"));
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.default_template, "default");
    }

    #[test]
    fn overrides_win_over_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "output_path = \"public\"\nsections = [\"docs\"]\n").unwrap();

        let overrides = Overrides {
            output_path: Some(PathBuf::from("dist")),
            sections: vec!["guides".to_string(), "blog".to_string()],
            ..Overrides::default()
        };
        let config = load_config(&path, &overrides).unwrap();
        assert_eq!(config.output_path, PathBuf::from("dist"));
        assert_eq!(config.sections, vec!["guides", "blog"]);
    }

    #[test]
    fn absent_overrides_keep_file_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "git_timestamps = true\nsections = [\"docs\"]\n").unwrap();

        let config = load_config(&path, &Overrides::default()).unwrap();
        assert!(config.git_timestamps);
        assert_eq!(config.sections, vec!["docs"]);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "sections = [").unwrap();
        let result = load_config(&path, &Overrides::default());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validate_accepts_existing_layout() {
        let tmp = site_dirs();
        let config = SiteConfig {
            sections: vec!["docs".to_string()],
            ..config_in(&tmp)
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_missing_sources() {
        let tmp = site_dirs();
        let config = SiteConfig {
            sources_path: tmp.path().join("nope"),
            ..config_in(&tmp)
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_missing_templates() {
        let tmp = site_dirs();
        let config = SiteConfig {
            template_path: tmp.path().join("nope"),
            ..config_in(&tmp)
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_empty_default_template() {
        let tmp = site_dirs();
        let config = SiteConfig {
            default_template: "  ".to_string(),
            ..config_in(&tmp)
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_output_inside_sources() {
        let tmp = site_dirs();
        let config = SiteConfig {
            output_path: tmp.path().join("content/out"),
            ..config_in(&tmp)
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_templates_inside_output() {
        let tmp = site_dirs();
        fs::create_dir_all(tmp.path().join("public/templates")).unwrap();
        let config = SiteConfig {
            output_path: tmp.path().join("public"),
            template_path: tmp.path().join("public/templates"),
            ..config_in(&tmp)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("template_path"));
    }

    #[test]
    fn validate_templates_equal_to_output() {
        let tmp = site_dirs();
        let config = SiteConfig {
            output_path: tmp.path().join("templates"),
            ..config_in(&tmp)
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_nested_section_name() {
        let tmp = site_dirs();
        let config = SiteConfig {
            sections: vec!["docs/inner".to_string()],
            ..config_in(&tmp)
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_duplicate_section() {
        let tmp = site_dirs();
        let config = SiteConfig {
            sections: vec!["docs".to_string(), "docs".to_string()],
            ..config_in(&tmp)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn validate_missing_section_directory() {
        let tmp = site_dirs();
        let config = SiteConfig {
            sections: vec!["blog".to_string()],
            ..config_in(&tmp)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blog"));
    }

    #[test]
    fn section_root_for_root_and_named() {
        let config = SiteConfig::default();
        assert_eq!(config.section_root(None), PathBuf::from("content"));
        assert_eq!(
            config.section_root(Some("docs")),
            PathBuf::from("content/docs")
        );
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn stock_defaults_value_matches_default() {
        let config: SiteConfig = stock_defaults_value().try_into().unwrap();
        assert_eq!(config, SiteConfig::default());
    }
}
