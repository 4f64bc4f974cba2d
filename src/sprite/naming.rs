//! File name and class name resolution.
//!
//! Names come either from a `[field]` template or from a caller-supplied
//! function:
//!
//! ```text
//! "[name]_[hash].png"          -> icons_1a2b3c4d.png
//! "sprite2css-[dirname]-[name]" -> sprite2css-nav-back
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use serde::Deserialize;

pub const DEFAULT_CLASS_NAME: &str = "sprite2css-[name]";
pub const DEFAULT_FILENAME: &str = "[name]_[hash].png";

static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z0-9_]+)\]").expect("static regex is valid"));

/// Fields available to templates. Absent fields render as "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameContext {
    pub name: String,
    pub filename: Option<String>,
    pub source: String,
    pub dirname: Option<String>,
    pub hash: Option<String>,
}

impl NameContext {
    fn field(&self, key: &str) -> &str {
        match key {
            "name" => &self.name,
            "source" => &self.source,
            "filename" => self.filename.as_deref().unwrap_or_default(),
            "dirname" => self.dirname.as_deref().unwrap_or_default(),
            "hash" => self.hash.as_deref().unwrap_or_default(),
            _ => "",
        }
    }
}

pub type NameFn = dyn Fn(&NameContext) -> String + Send + Sync;

/// A string template or a naming function.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub enum Template {
    Pattern(String),
    Custom(Arc<NameFn>),
}

impl From<String> for Template {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<&str> for Template {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => write!(f, "Template({p:?})"),
            Self::Custom(_) => f.write_str("Template(<fn>)"),
        }
    }
}

impl Template {
    pub fn custom(f: impl Fn(&NameContext) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn render(&self, ctx: &NameContext) -> String {
        match self {
            Self::Pattern(pattern) => map_template(pattern, ctx),
            Self::Custom(f) => f(ctx),
        }
    }

    /// Render and collapse into a single CSS-safe class token.
    pub fn render_class(&self, ctx: &NameContext) -> String {
        class_token(&self.render(ctx))
    }
}

/// Replace every `[field]` occurrence with its context value.
pub fn map_template(template: &str, ctx: &NameContext) -> String {
    FIELD_RE
        .replace_all(template, |caps: &Captures| ctx.field(&caps[1]).to_string())
        .into_owned()
}

/// Split on path separators and hyphens, drop empty segments, rejoin with `-`.
pub fn class_token(raw: &str) -> String {
    raw.split(['/', '\\', '-'])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
