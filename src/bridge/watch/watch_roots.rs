use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Source directories to keep watched.
///
/// Sources missing at startup (or removed later) are attached as soon as
/// they exist again.
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for path in &self.desired {
            if !path.is_dir() {
                crate::debug!("watch"; "source not present yet: {}", path.display());
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            self.attached.insert(path.clone());
        }

        Ok(())
    }

    /// Re-attach roots that appeared since the last call.
    ///
    /// Returns `true` when a root was newly attached.
    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) -> bool {
        self.attached.retain(|path| path.exists());

        let mut attached_any = false;
        for path in &self.desired {
            if self.attached.contains(path) || !path.is_dir() {
                continue;
            }

            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "attached watch: {}", path.display());
                attached_any = true;
            }
        }
        attached_any
    }

    pub(super) fn attached_count(&self) -> usize {
        self.attached.len()
    }
}
