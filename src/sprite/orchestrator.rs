//! Sprite packing pipeline.
//!
//! For every source entry, concurrently:
//!
//! ```text
//! scan dir → read images → pack → inline or hash+name → CSS rules
//! ```
//!
//! Results are committed into a fresh [`SpriteSet`] in entry order once
//! every entry has finished, so a failed run leaves nothing behind.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::future::try_join_all;

use super::css::sprite_rule;
use super::hash::{DEFAULT_HASH_LENGTH, content_hash};
use super::naming::NameContext;
use super::pack::{PackedSheet, Packer, SourceImage};
use super::scan::{Scan, relative_slash_path, scan_dir};
use super::{SourceEntry, SpriteError, SpriteSet};
use crate::utils::path::join_url;
use crate::{debug, log};

pub const DEFAULT_TARGET: &str = "/assets/images/sprite2css/";

/// Settings shared by all entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteOptions {
    /// Output path prefix of generated sheets.
    pub target: String,
    /// Public base prefix used in CSS URLs.
    pub base: String,
    /// Sheets smaller than this many bytes are inlined as data URLs.
    pub threshold: usize,
    pub hash_length: usize,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            base: "/".to_string(),
            threshold: 0,
            hash_length: DEFAULT_HASH_LENGTH,
        }
    }
}

/// What one entry contributes to a generation.
#[derive(Debug, Default)]
struct EntryOutput {
    sheet: Option<(String, Vec<u8>)>,
    rules: Vec<String>,
}

pub struct Orchestrator {
    entries: Vec<SourceEntry>,
    options: SpriteOptions,
    packer: Arc<dyn Packer>,
}

impl Orchestrator {
    pub fn new(entries: Vec<SourceEntry>, options: SpriteOptions, packer: Arc<dyn Packer>) -> Self {
        Self {
            entries,
            options,
            packer,
        }
    }

    /// Run one full generation.
    ///
    /// Any entry failure fails the whole run.
    pub async fn run(self: Arc<Self>) -> Result<SpriteSet, SpriteError> {
        let tasks = (0..self.entries.len()).map(|index| Arc::clone(&self).run_entry(index));
        let outputs = try_join_all(tasks).await?;

        let mut sprites = SpriteSet::new();
        for output in outputs {
            if let Some((path, bytes)) = output.sheet
                && sprites.insert_image(path.clone(), bytes)
            {
                debug!("sprite"; "output path collision, last entry wins: {}", path);
            }
            for rule in output.rules {
                sprites.push_rule(rule);
            }
        }

        debug!("sprite"; "{} sheets, {} rules", sprites.image_count(), sprites.rules().len());
        Ok(sprites)
    }

    async fn run_entry(self: Arc<Self>, index: usize) -> Result<EntryOutput, SpriteError> {
        let entry = &self.entries[index];

        let read_entry = entry.clone();
        let Some(images) = tokio::task::spawn_blocking(move || read_images(&read_entry)).await??
        else {
            return Ok(EntryOutput::default());
        };

        let packer = Arc::clone(&self.packer);
        let sheet = tokio::task::spawn_blocking(move || packer.pack(&images)).await??;

        self.finish_entry(entry, sheet).await
    }

    async fn finish_entry(
        &self,
        entry: &SourceEntry,
        sheet: PackedSheet,
    ) -> Result<EntryOutput, SpriteError> {
        let PackedSheet { bytes, placements } = sheet;
        let source = entry.source.to_string_lossy().into_owned();

        let (url, sheet) = if bytes.len() < self.options.threshold {
            let data_url = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
            (data_url, None)
        } else {
            let hash_length = self.options.hash_length;
            let (hash, bytes) = tokio::task::spawn_blocking(move || {
                let hash = content_hash(&bytes, hash_length);
                (hash, bytes)
            })
            .await?;

            let ctx = NameContext {
                name: entry.entry_name(),
                source: source.clone(),
                hash: Some(hash),
                ..NameContext::default()
            };
            let path = join_url(&self.options.target, &entry.filename.render(&ctx));
            (join_url(&self.options.base, &path), Some((path, bytes)))
        };

        let rules = placements
            .iter()
            .map(|placement| {
                let ctx = class_context(&placement.filename, &entry.source, &source);
                let class_name = entry.class_name.render_class(&ctx);
                sprite_rule(&class_name, placement, &url)
            })
            .collect();

        Ok(EntryOutput { sheet, rules })
    }
}

/// Scan the entry's directory and read every matching file.
///
/// `None` when the entry contributes nothing (not a directory, or empty).
fn read_images(entry: &SourceEntry) -> Result<Option<Vec<SourceImage>>, SpriteError> {
    let files = match scan_dir(&entry.source, &entry.includes, &entry.excludes)? {
        Scan::NotADirectory => {
            log!("warning"; "source is not a directory, skipping: {}", entry.source.display());
            return Ok(None);
        }
        Scan::Files(files) if files.is_empty() => {
            log!("warning"; "no images found, skipping: {}", entry.source.display());
            return Ok(None);
        }
        Scan::Files(files) => files,
    };

    files
        .into_iter()
        .map(|path| {
            let bytes = fs::read(&path).map_err(|e| SpriteError::io(&path, e))?;
            Ok(SourceImage { path, bytes })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Naming context of one placement.
fn class_context(file: &Path, root: &Path, source: &str) -> NameContext {
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dirname = file
        .parent()
        .map(|parent| relative_slash_path(parent, root))
        .filter(|rel| !rel.is_empty())
        .map(|rel| format!("/{rel}"))
        .unwrap_or_default();

    NameContext {
        name,
        filename: Some(file.to_string_lossy().into_owned()),
        source: source.to_string(),
        dirname: Some(dirname),
        hash: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::naming::Template;
    use crate::sprite::pack::BinaryTreePacker;
    use crate::sprite::pattern::Pattern;
    use crate::sprite::test_support::{CountingPacker, write_png};
    use tempfile::TempDir;

    fn orchestrator(entries: Vec<SourceEntry>, options: SpriteOptions) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            entries,
            options,
            Arc::new(BinaryTreePacker::default()),
        ))
    }

    #[tokio::test]
    async fn test_three_pngs_one_sheet() {
        let dir = TempDir::new().unwrap();
        let icons = dir.path().join("icons");
        for name in ["a", "b", "c"] {
            write_png(&icons.join(format!("{name}.png")), 8, 8);
        }

        let entry = SourceEntry::new(&icons).with_filename("[name]_[hash].png");
        let sprites = orchestrator(vec![entry], SpriteOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(sprites.rules().len(), 3);
        assert_eq!(sprites.image_count(), 1);

        let (path, bytes) = sprites.images()[0];
        let hash = content_hash(bytes, DEFAULT_HASH_LENGTH);
        assert_eq!(path, format!("/assets/images/sprite2css/icons_{hash}.png"));

        let css = sprites.css();
        assert!(css.starts_with(".sprite2css-a{"));
        assert!(css.contains(&format!("url({path})")));
        assert_eq!(css.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let dir = TempDir::new().unwrap();
        let icons = dir.path().join("icons");
        write_png(&icons.join("a.png"), 4, 4);

        let size = orchestrator(vec![SourceEntry::new(&icons)], SpriteOptions::default())
            .run()
            .await
            .unwrap()
            .images()[0]
            .1
            .len();

        // Exactly at threshold: delivered as a file.
        let at = SpriteOptions {
            threshold: size,
            ..SpriteOptions::default()
        };
        let sprites = orchestrator(vec![SourceEntry::new(&icons)], at)
            .run()
            .await
            .unwrap();
        assert_eq!(sprites.image_count(), 1);

        // Threshold one byte above the sheet size: inlined.
        let over = SpriteOptions {
            threshold: size + 1,
            ..SpriteOptions::default()
        };
        let sprites = orchestrator(vec![SourceEntry::new(&icons)], over)
            .run()
            .await
            .unwrap();
        assert_eq!(sprites.image_count(), 0);
        assert!(sprites.css().contains("url(data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_missing_and_empty_sources_are_skipped() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        let icons = dir.path().join("icons");
        write_png(&icons.join("a.png"), 4, 4);

        let entries = vec![
            SourceEntry::new(dir.path().join("missing")),
            SourceEntry::new(&empty),
            SourceEntry::new(&icons),
        ];
        let sprites = orchestrator(entries, SpriteOptions::default())
            .run()
            .await
            .unwrap();
        assert_eq!(sprites.rules().len(), 1);
        assert_eq!(sprites.image_count(), 1);
    }

    #[tokio::test]
    async fn test_rules_follow_entry_then_scan_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        write_png(&first.join("z.png"), 4, 4);
        write_png(&first.join("a.png"), 4, 4);
        write_png(&second.join("m.png"), 4, 4);

        let entries = vec![
            SourceEntry::new(&second).with_class_name("s-[name]"),
            SourceEntry::new(&first).with_class_name("f-[name]"),
        ];
        let css = orchestrator(entries, SpriteOptions::default())
            .run()
            .await
            .unwrap()
            .css();

        let classes: Vec<_> = css
            .lines()
            .map(|l| l.split('{').next().unwrap().to_string())
            .collect();
        assert_eq!(classes, vec![".s-m", ".f-a", ".f-z"]);
    }

    #[tokio::test]
    async fn test_dirname_in_class_name() {
        let dir = TempDir::new().unwrap();
        let icons = dir.path().join("icons");
        write_png(&icons.join("root.png"), 4, 4);
        write_png(&icons.join("nav").join("back.png"), 4, 4);

        let entry = SourceEntry::new(&icons).with_class_name("i-[dirname]-[name]");
        let css = orchestrator(vec![entry], SpriteOptions::default())
            .run()
            .await
            .unwrap()
            .css();

        assert!(css.contains(".i-nav-back{"));
        assert!(css.contains(".i-root{"));
    }

    #[tokio::test]
    async fn test_base_prefix_in_urls() {
        let dir = TempDir::new().unwrap();
        let icons = dir.path().join("icons");
        write_png(&icons.join("a.png"), 4, 4);

        let options = SpriteOptions {
            base: "/app/".into(),
            ..SpriteOptions::default()
        };
        let sprites = orchestrator(vec![SourceEntry::new(&icons)], options)
            .run()
            .await
            .unwrap();

        let (path, _) = sprites.images()[0];
        assert!(path.starts_with("/assets/images/sprite2css/"));
        assert!(sprites.css().contains(&format!("url(/app{path})")));
    }

    #[tokio::test]
    async fn test_custom_name_functions() {
        let dir = TempDir::new().unwrap();
        let icons = dir.path().join("icons");
        write_png(&icons.join("a.png"), 4, 4);

        let entry = SourceEntry::new(&icons)
            .with_filename(Template::custom(|c| {
                format!("{}-{}.png", c.name, c.hash.as_deref().unwrap_or("?"))
            }))
            .with_class_name(Template::custom(|c| format!("x/{}", c.name)));
        let sprites = orchestrator(
            vec![entry],
            SpriteOptions {
                hash_length: 4,
                ..SpriteOptions::default()
            },
        )
        .run()
        .await
        .unwrap();

        let (path, _) = sprites.images()[0];
        let file = path.rsplit('/').next().unwrap();
        assert!(file.starts_with("icons-"));
        assert_eq!(file.len(), "icons-".len() + 4 + ".png".len());
        assert!(sprites.css().starts_with(".x-a{"));
    }

    #[tokio::test]
    async fn test_colliding_output_paths_last_wins() {
        let dir = TempDir::new().unwrap();
        let one = dir.path().join("one");
        let two = dir.path().join("two");
        write_png(&one.join("a.png"), 4, 4);
        write_png(&two.join("b.png"), 6, 6);

        let entries = vec![
            SourceEntry::new(&one).with_filename("same.png"),
            SourceEntry::new(&two).with_filename("same.png"),
        ];
        let sprites = orchestrator(entries, SpriteOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(sprites.image_count(), 1);
        assert_eq!(sprites.rules().len(), 2);
        let bytes = sprites.image("/assets/images/sprite2css/same.png").unwrap();
        let sheet = image::load_from_memory(bytes).unwrap();
        assert_eq!((sheet.width(), sheet.height()), (6, 6));
    }

    #[tokio::test]
    async fn test_packer_failure_fails_run() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good");
        let bad = dir.path().join("bad");
        write_png(&good.join("a.png"), 4, 4);
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("broken.png"), b"garbage").unwrap();

        let entries = vec![SourceEntry::new(&good), SourceEntry::new(&bad)];
        let err = orchestrator(entries, SpriteOptions::default())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, SpriteError::Decode(..)));
    }

    #[tokio::test]
    async fn test_include_filter_reaches_packer() {
        let dir = TempDir::new().unwrap();
        let icons = dir.path().join("icons");
        write_png(&icons.join("a.png"), 4, 4);
        write_png(&icons.join("b.png"), 4, 4);
        write_png(&icons.join("old/c.png"), 4, 4);
        fs::write(icons.join("notes.txt"), b"not an image").unwrap();

        let packer = Arc::new(CountingPacker::default());
        let entry = SourceEntry::new(&icons)
            .with_includes(vec![Pattern::text("*.png")])
            .with_excludes(vec![Pattern::text("old")]);
        let orch = Arc::new(Orchestrator::new(
            vec![entry],
            SpriteOptions::default(),
            packer.clone(),
        ));
        let sprites = orch.run().await.unwrap();

        assert_eq!(packer.calls(), 1);
        assert_eq!(sprites.rules().len(), 2);
    }

    #[test]
    fn test_class_context_dirname() {
        let root = Path::new("/site/icons");
        let ctx = class_context(&root.join("nav/back.png"), root, "/site/icons");
        assert_eq!(ctx.name, "back");
        assert_eq!(ctx.dirname.as_deref(), Some("/nav"));

        let ctx = class_context(&root.join("top.png"), root, "/site/icons");
        assert_eq!(ctx.dirname.as_deref(), Some(""));
    }

    #[test]
    fn test_default_options() {
        let options = SpriteOptions::default();
        assert_eq!(options.target, DEFAULT_TARGET);
        assert_eq!(options.base, "/");
        assert_eq!(options.threshold, 0);
        assert_eq!(options.hash_length, 8);
    }
}
