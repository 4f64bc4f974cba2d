//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! output = "dist"          # Sprite sheets are written below this directory
//! css_file = "sprite.css"  # Stylesheet file inside `output` ("" to skip)
//! ```

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output directory (relative to the config root).
    pub output: PathBuf,

    /// File name of the generated stylesheet inside `output`.
    pub css_file: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "dist".into(),
            css_file: "sprite.css".into(),
        }
    }
}
