//! In-memory result of one load generation.

use rustc_hash::FxHashMap;

use super::css;

/// Output path → sheet bytes, plus the generated CSS rules.
///
/// Built once by the orchestrator and then only read. A new generation
/// always gets a fresh set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpriteSet {
    images: FxHashMap<String, Vec<u8>>,
    rules: Vec<String>,
}

impl SpriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sheet. Returns `true` if an earlier sheet had the same path
    /// (the later one wins).
    pub fn insert_image(&mut self, path: String, bytes: Vec<u8>) -> bool {
        self.images.insert(path, bytes).is_some()
    }

    pub fn push_rule(&mut self, rule: String) {
        self.rules.push(rule);
    }

    pub fn image(&self, path: &str) -> Option<&[u8]> {
        self.images.get(path).map(Vec::as_slice)
    }

    /// Sheets sorted by output path.
    pub fn images(&self) -> Vec<(&str, &[u8])> {
        let mut images: Vec<_> = self
            .images
            .iter()
            .map(|(path, bytes)| (path.as_str(), bytes.as_slice()))
            .collect();
        images.sort_unstable_by_key(|(path, _)| *path);
        images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// The virtual stylesheet text.
    pub fn css(&self) -> String {
        css::stylesheet(&self.rules)
    }
}
