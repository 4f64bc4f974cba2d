//! Configuration from `sprite2css.toml`.
//!
//! ```text
//! config/
//! ├── section/       # [build], [serve], entries
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # find_config_file
//! └── mod.rs         # SpriteConfig (this file)
//! ```
//!
//! | Key / section   | Purpose                                         |
//! |-----------------|-------------------------------------------------|
//! | top level       | hmr, target, threshold, hash_length, base, padding |
//! | `[[entries]]`   | Source directories, filters and name templates  |
//! | `[build]`       | Output directory and stylesheet file            |
//! | `[serve]`       | Development server (interface, port, public)    |

pub mod section;
pub mod types;
mod util;

pub use section::{BuildConfig, ServeConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use section::deserialize_entries;
use util::find_config_file;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::{Cli, Commands};
use crate::log;
use crate::sprite::pack::BinaryTreePacker;
use crate::sprite::{
    DEFAULT_HASH_LENGTH, DEFAULT_TARGET, MAX_HASH_LENGTH, Orchestrator, SourceEntry, SpriteLoader,
    SpriteOptions,
};
use crate::utils::path::normalize_path;

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory containing the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Watch sources and reset the loader on change (serve only).
    pub hmr: bool,

    /// Output path prefix of generated sheets.
    pub target: String,

    /// Sheets smaller than this many bytes are inlined as data URLs.
    pub threshold: usize,

    pub hash_length: usize,

    /// Public base prefix of CSS URLs.
    pub base: String,

    /// Transparent pixels between packed images.
    pub padding: u32,

    #[serde(deserialize_with = "deserialize_entries")]
    pub entries: Vec<SourceEntry>,

    pub build: BuildConfig,

    pub serve: ServeConfig,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            hmr: true,
            target: DEFAULT_TARGET.to_string(),
            threshold: 0,
            hash_length: DEFAULT_HASH_LENGTH,
            base: "/".to_string(),
            padding: 0,
            entries: Vec::new(),
            build: BuildConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl SpriteConfig {
    /// Find, parse, validate and finalize the config for `cli`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = find_config_file(&cli.config, &cwd).ok_or_else(|| {
            ConfigError::Validation(format!(
                "config file `{}` not found in `{}` or any parent directory",
                cli.config.display(),
                cwd.display()
            ))
        })?;

        let mut config = Self::from_path(&config_path)?;
        config.validate_paths()?;
        config.config_path = normalize_path(&config_path);
        config.finalize(cli);
        config.validate()?;

        crate::debug!("config"; "loaded {}", config.config_path.display());
        Ok(config)
    }

    /// Parse configuration from a TOML string (no finalization).
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load from file, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());

        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // finalization
    // ========================================================================

    /// Resolve paths against the config root and apply CLI overrides.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = normalize_path(&root);

        self.apply_command_options(cli);
        self.normalize_paths();
    }

    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        if let Commands::Serve {
            interface,
            port,
            hmr,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.hmr, hmr.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        for entry in &mut self.entries {
            entry.resolve_source(&root);
        }
        self.build.output = normalize_path(&root.join(&self.build.output));
        self.serve.public = normalize_path(&root.join(&self.serve.public));
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Entry sources must be relative to the config root.
    ///
    /// Runs before `finalize`, which makes every source absolute.
    fn validate_paths(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.source.is_absolute() {
                diag.error_with_hint(
                    FieldPath::entry(index, "source"),
                    format!("must be a relative path, got `{}`", entry.source.display()),
                    "paths are resolved against the directory of sprite2css.toml",
                );
            }
        }
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Collect every validation error and report them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        if self.entries.is_empty() {
            diag.error_with_hint(
                FieldPath::new("entries"),
                "at least one entry is required",
                "add an [[entries]] table with a `source` directory",
            );
        }

        if !(1..=MAX_HASH_LENGTH).contains(&self.hash_length) {
            diag.error(
                FieldPath::new("hash_length"),
                format!(
                    "must be between 1 and {MAX_HASH_LENGTH}, got {}",
                    self.hash_length
                ),
            );
        }

        for (field, value) in [
            (FieldPath::new("target"), &self.target),
            (FieldPath::new("base"), &self.base),
        ] {
            if !value.starts_with('/') || !value.ends_with('/') {
                diag.error_with_hint(
                    field,
                    format!("must start and end with `/`, got `{value}`"),
                    format!("use `/{}/`", value.trim_matches('/')),
                );
            }
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ========================================================================
    // sprite wiring
    // ========================================================================

    pub fn sprite_options(&self) -> SpriteOptions {
        SpriteOptions {
            target: self.target.clone(),
            base: self.base.clone(),
            threshold: self.threshold,
            hash_length: self.hash_length,
        }
    }

    /// One loader for the configured entries, shared by every bridge.
    pub fn sprite_loader(&self) -> SpriteLoader {
        SpriteLoader::for_orchestrator(Orchestrator::new(
            self.entries.clone(),
            self.sprite_options(),
            Arc::new(BinaryTreePacker::new(self.padding)),
        ))
    }

    /// Source directories of all entries.
    pub fn source_dirs(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.source.clone()).collect()
    }
}

// ============================================================================
// tests
// ============================================================================
