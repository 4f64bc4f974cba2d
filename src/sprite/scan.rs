//! Source directory scanning (reads only).

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::SpriteError;
use super::pattern::{Pattern, any_match};

/// Outcome of scanning one source root.
#[derive(Debug)]
pub enum Scan {
    /// Root missing or not a directory; the entry is skipped.
    NotADirectory,
    /// Regular files in depth-first order.
    Files(Vec<PathBuf>),
}

/// Scan `root` recursively, keeping regular files that pass the filters.
///
/// Directories are expanded inline where they appear, entries of one
/// directory are visited in file-name order:
///
/// ```text
/// icons/
/// ├── a.png          -> 1
/// ├── nav/
/// │   ├── back.png   -> 2
/// │   └── next.png   -> 3
/// └── z.png          -> 4
/// ```
///
/// Exclude patterns drop files and prune whole directories. Include
/// patterns (when non-empty) only apply to files. Symlinks are followed;
/// a directory reached a second time and a dangling link are skipped.
pub fn scan_dir(
    root: &Path,
    includes: &[Pattern],
    excludes: &[Pattern],
) -> Result<Scan, SpriteError> {
    if !root.is_dir() {
        return Ok(Scan::NotADirectory);
    }

    let mut files = Vec::new();
    let mut visited = FxHashSet::default();
    visited.insert(fs::canonicalize(root).map_err(|e| SpriteError::io(root, e))?);

    let mut stack = sorted_children(root)?;
    stack.reverse();

    while let Some(path) = stack.pop() {
        let rel = relative_slash_path(&path, root);
        if any_match(excludes, &rel) {
            continue;
        }

        let file_type = match fs::metadata(&path) {
            Ok(meta) => meta.file_type(),
            Err(_) if fs::symlink_metadata(&path).is_ok_and(|m| m.is_symlink()) => {
                crate::log!("warning"; "skipping dangling symlink: {}", path.display());
                continue;
            }
            Err(e) => return Err(SpriteError::io(&path, e)),
        };

        if file_type.is_dir() {
            let canonical = fs::canonicalize(&path).map_err(|e| SpriteError::io(&path, e))?;
            if !visited.insert(canonical) {
                crate::log!("warning"; "skipping already scanned directory: {}", path.display());
                continue;
            }
            let mut children = sorted_children(&path)?;
            children.reverse();
            stack.extend(children);
        } else if file_type.is_file() {
            if !includes.is_empty() && !any_match(includes, &rel) {
                continue;
            }
            files.push(path);
        }
    }

    Ok(Scan::Files(files))
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>, SpriteError> {
    let entries = fs::read_dir(dir).map_err(|e| SpriteError::io(dir, e))?;
    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SpriteError::io(dir, e))?;
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}

/// Path relative to `root`, joined with `/` on every platform.
pub fn relative_slash_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
