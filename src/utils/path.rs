//! Path and URL utilities.
//!
//! Pure functions, no side effects apart from `canonicalize`.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first. Falls back to the path itself if
/// absolute, or joined onto the current directory if relative.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Join two URL path segments with exactly one `/` between them.
///
/// ```ignore
/// join_url("/assets/", "/icons.png") == "/assets/icons.png"
/// join_url("/", "/assets/a.png") == "/assets/a.png"
/// ```
pub fn join_url(prefix: &str, path: &str) -> String {
    match (prefix.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", prefix, &path[1..]),
        (false, false) if !prefix.is_empty() && !path.is_empty() => format!("{prefix}/{path}"),
        _ => format!("{prefix}{path}"),
    }
}

/// `"/assets/a.png"` -> `"assets/a.png"`.
#[inline]
pub fn strip_leading_slash(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Decoded URL path without query string or fragment.
pub fn request_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    percent_encoding::percent_decode_str(path)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_absolute_missing() {
        let path = Path::new("/definitely/not/here.png");
        assert_eq!(normalize_path(path), PathBuf::from("/definitely/not/here.png"));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("/assets/", "icons.png"), "/assets/icons.png");
        assert_eq!(join_url("/assets/", "/icons.png"), "/assets/icons.png");
        assert_eq!(join_url("/assets", "icons.png"), "/assets/icons.png");
        assert_eq!(join_url("/assets", "/icons.png"), "/assets/icons.png");
        assert_eq!(join_url("/", "/assets/a.png"), "/assets/a.png");
        assert_eq!(join_url("", "/a.png"), "/a.png");
        assert_eq!(join_url("/app/", ""), "/app/");
    }

    #[test]
    fn test_strip_leading_slash() {
        assert_eq!(strip_leading_slash("/assets/a.png"), "assets/a.png");
        assert_eq!(strip_leading_slash("a.png"), "a.png");
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/a%20b.png?v=1#top"), "/a b.png");
        assert_eq!(request_path("/plain"), "/plain");
        assert_eq!(request_path("?only"), "");
    }
}
