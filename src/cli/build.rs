//! `sprite2css build`: write sheets and the stylesheet to the output directory.

use std::fs;

use anyhow::{Context, Result};

use crate::{
    bridge::emit::{OutputDir, emit_sprites},
    config::SpriteConfig,
    log,
};

/// Summary of one build.
#[derive(Debug, PartialEq, Eq)]
pub struct BuildReport {
    pub sheets: usize,
    pub rules: usize,
}

pub fn build_sprites(config: &SpriteConfig) -> Result<BuildReport> {
    let runtime = super::runtime()?;
    let loader = config.sprite_loader();
    let sprites = runtime
        .block_on(async { loader.load().await })
        .map_err(anyhow::Error::new)
        .context("sprite generation failed")?;

    let mut output = OutputDir::new(&config.build.output);
    let sheets = emit_sprites(&sprites, &mut output)?;

    if !config.build.css_file.is_empty() {
        let css_path = config.build.output.join(&config.build.css_file);
        if let Some(parent) = css_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&css_path, sprites.css())
            .with_context(|| format!("failed to write {}", css_path.display()))?;
        crate::debug!("build"; "wrote {}", css_path.display());
    }

    let report = BuildReport {
        sheets,
        rules: sprites.rules().len(),
    };
    log!(
        "build";
        "{} sheet(s), {} rule(s) -> {}",
        report.sheets,
        report.rules,
        output.root().display()
    );
    Ok(report)
}
