//! Include/exclude path patterns.
//!
//! A pattern is either text or a regular expression:
//!
//! ```toml
//! includes = ["*.png", "icons/"]
//! excludes = ["_draft", { regex = "\\.tmp$" }]
//! ```
//!
//! Text matches when the candidate starts with it or when it matches as a
//! glob. Globs without a `/` are tested against the file name only, so
//! `*.svg` picks up `nested/dir/a.svg`.

use std::fmt;

use glob::MatchOptions;
use regex::Regex;
use serde::Deserialize;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled include/exclude pattern.
#[derive(Clone, Deserialize)]
#[serde(try_from = "RawPattern")]
pub enum Pattern {
    Text {
        raw: String,
        /// `None` when the text is not valid glob syntax (prefix-only).
        glob: Option<glob::Pattern>,
    },
    Regex(Regex),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPattern {
    Text(String),
    Regex { regex: String },
}

impl TryFrom<RawPattern> for Pattern {
    type Error = regex::Error;

    fn try_from(raw: RawPattern) -> Result<Self, Self::Error> {
        match raw {
            RawPattern::Text(text) => Ok(Self::text(text)),
            RawPattern::Regex { regex } => Ok(Self::Regex(Regex::new(&regex)?)),
        }
    }
}

impl Pattern {
    pub fn text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let glob = glob::Pattern::new(&raw).ok();
        Self::Text { raw, glob }
    }

    /// Test a `/`-separated path relative to the scan root.
    pub fn matches(&self, rel_path: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(rel_path),
            Self::Text { raw, glob } => {
                let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
                if rel_path.starts_with(raw.as_str()) || file_name.starts_with(raw.as_str()) {
                    return true;
                }
                let Some(glob) = glob else {
                    return false;
                };
                let subject = if raw.contains('/') { rel_path } else { file_name };
                glob.matches_with(subject, GLOB_OPTIONS)
            }
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { raw, .. } => write!(f, "{raw:?}"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// True if any pattern matches.
pub fn any_match(patterns: &[Pattern], rel_path: &str) -> bool {
    patterns.iter().any(|p| p.matches(rel_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_matches_file_name() {
        let p = Pattern::text("*.svg");
        assert!(p.matches("a.svg"));
        assert!(p.matches("nested/dir/b.svg"));
        assert!(!p.matches("c.png"));
    }

    #[test]
    fn test_glob_with_separator_matches_full_path() {
        let p = Pattern::text("icons/*.png");
        assert!(p.matches("icons/a.png"));
        assert!(!p.matches("other/a.png"));
        assert!(!p.matches("icons/deep/a.png"));
    }

    #[test]
    fn test_prefix_match() {
        let p = Pattern::text("_draft");
        assert!(p.matches("_draft_logo.png"));
        assert!(p.matches("sub/_draft.png"));
        assert!(!p.matches("final.png"));
    }

    #[test]
    fn test_invalid_glob_falls_back_to_prefix() {
        let p = Pattern::text("[broken");
        assert!(p.matches("[broken.png"));
        assert!(!p.matches("broken.png"));
    }

    #[test]
    fn test_regex_pattern() {
        let p = Pattern::Regex(Regex::new(r"\.tmp$").unwrap());
        assert!(p.matches("a/b.tmp"));
        assert!(!p.matches("a/b.png"));
    }

    #[test]
    fn test_deserialize_patterns() {
        #[derive(Deserialize)]
        struct Holder {
            patterns: Vec<Pattern>,
        }

        let holder: Holder =
            toml::from_str(r#"patterns = ["*.png", { regex = "^x" }, { regex = '^\w+-\d\.svg$' }]"#)
                .unwrap();
        assert_eq!(holder.patterns.len(), 3);
        assert!(holder.patterns[2].matches("flag-2.svg"));
        assert!(matches!(holder.patterns[0], Pattern::Text { .. }));
        assert!(holder.patterns[1].matches("x.gif"));
        assert!(!holder.patterns[1].matches("y.gif"));
    }

    #[test]
    fn test_deserialize_invalid_regex_fails() {
        #[derive(Deserialize)]
        #[allow(dead_code)]
        struct Holder {
            patterns: Vec<Pattern>,
        }

        let result: Result<Holder, _> = toml::from_str("patterns = [{ regex = \"(\" }]");
        assert!(result.is_err());
    }

    #[test]
    fn test_any_match() {
        let patterns = vec![Pattern::text("*.gif"), Pattern::text("*.png")];
        assert!(any_match(&patterns, "a.png"));
        assert!(!any_match(&patterns, "a.jpg"));
        assert!(!any_match(&[], "a.png"));
    }
}
