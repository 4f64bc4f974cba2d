//! Build-time emission of sprite sheets.

use std::fs;
use std::path::{Path, PathBuf};

use crate::sprite::{SpriteError, SpriteSet};
use crate::utils::path::strip_leading_slash;

/// Receives generated assets during a build.
pub trait Emitter {
    /// `file_name` is relative to the output root (`/`-separated).
    fn emit_asset(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SpriteError>;
}

/// Writes assets under an output directory, creating parents.
#[derive(Debug)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Emitter for OutputDir {
    fn emit_asset(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SpriteError> {
        let emit_err = |e: std::io::Error| SpriteError::Emit(file_name.to_string(), e.into());

        let path = self.root.join(file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(emit_err)?;
        }
        fs::write(&path, bytes).map_err(emit_err)?;
        crate::debug!("build"; "wrote {}", path.display());
        Ok(())
    }
}

/// Hand every sheet of `sprites` to `emitter` in path order.
///
/// Returns the number of emitted sheets.
pub fn emit_sprites(sprites: &SpriteSet, emitter: &mut dyn Emitter) -> Result<usize, SpriteError> {
    let images = sprites.images();
    for (path, bytes) in &images {
        emitter.emit_asset(strip_leading_slash(path), bytes)?;
    }
    Ok(images.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder(Vec<(String, Vec<u8>)>);

    impl Emitter for Recorder {
        fn emit_asset(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SpriteError> {
            self.0.push((file_name.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    fn sample_set() -> SpriteSet {
        let mut set = SpriteSet::new();
        set.insert_image("/assets/b.png".into(), vec![2]);
        set.insert_image("/assets/a.png".into(), vec![1]);
        set
    }

    #[test]
    fn test_emit_strips_leading_slash_in_order() {
        let mut recorder = Recorder::default();
        let count = emit_sprites(&sample_set(), &mut recorder).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            recorder.0,
            vec![
                ("assets/a.png".to_string(), vec![1]),
                ("assets/b.png".to_string(), vec![2]),
            ]
        );
    }

    #[test]
    fn test_emit_empty_set() {
        let mut recorder = Recorder::default();
        assert_eq!(emit_sprites(&SpriteSet::new(), &mut recorder).unwrap(), 0);
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn test_output_dir_creates_parents() {
        let dir = TempDir::new().unwrap();
        let mut out = OutputDir::new(dir.path().join("dist"));
        emit_sprites(&sample_set(), &mut out).unwrap();

        assert_eq!(fs::read(out.root().join("assets/a.png")).unwrap(), vec![1]);
        assert_eq!(fs::read(out.root().join("assets/b.png")).unwrap(), vec![2]);
    }

    #[test]
    fn test_output_dir_write_failure() {
        let dir = TempDir::new().unwrap();
        // A file where a directory is needed
        fs::write(dir.path().join("assets"), b"").unwrap();
        let mut out = OutputDir::new(dir.path());

        let err = emit_sprites(&sample_set(), &mut out).unwrap_err();
        assert!(matches!(err, SpriteError::Emit(name, _) if name == "assets/a.png"));
    }
}
