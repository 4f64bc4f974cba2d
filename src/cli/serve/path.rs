//! URL to filesystem path resolution for the static pass-through.

use std::path::{Path, PathBuf};

/// Resolve a decoded URL path under `serve_root`, handling index.html.
pub fn resolve_path(url_path: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = url_path.trim_matches('/');

    if clean.contains("..") {
        return None;
    }

    let local = serve_root.join(clean);

    // Canonicalize so symlinks cannot escape serve_root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}
