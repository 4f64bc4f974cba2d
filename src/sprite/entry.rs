//! Source entries: one configured image group each.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::naming::{DEFAULT_CLASS_NAME, DEFAULT_FILENAME, Template};
use super::pattern::Pattern;

/// One image directory packed into one sprite sheet.
///
/// ```toml
/// [[entries]]
/// name = "icons"
/// source = "images/icons"
/// includes = ["*.png"]
/// class_name = "icon-[dirname]-[name]"
/// filename = "[name]_[hash].png"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Sheet name. Defaults to the base name of `source`.
    #[serde(default)]
    pub name: Option<String>,

    /// Directory scanned for images.
    pub source: PathBuf,

    #[serde(default)]
    pub includes: Vec<Pattern>,

    #[serde(default)]
    pub excludes: Vec<Pattern>,

    #[serde(default = "default_class_name")]
    pub class_name: Template,

    #[serde(default = "default_filename")]
    pub filename: Template,
}

fn default_class_name() -> Template {
    Template::from(DEFAULT_CLASS_NAME)
}

fn default_filename() -> Template {
    Template::from(DEFAULT_FILENAME)
}

impl SourceEntry {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            source: source.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
            class_name: default_class_name(),
            filename: default_filename(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_includes(mut self, patterns: Vec<Pattern>) -> Self {
        self.includes = patterns;
        self
    }

    pub fn with_excludes(mut self, patterns: Vec<Pattern>) -> Self {
        self.excludes = patterns;
        self
    }

    pub fn with_class_name(mut self, template: impl Into<Template>) -> Self {
        self.class_name = template.into();
        self
    }

    pub fn with_filename(mut self, template: impl Into<Template>) -> Self {
        self.filename = template.into();
        self
    }

    /// Configured name, or the source directory's base name.
    pub fn entry_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// Resolve a relative `source` against the config root.
    pub fn resolve_source(&mut self, root: &Path) {
        self.source = crate::utils::path::normalize_path(&root.join(&self.source));
    }
}
