//! `sprite2css css`: print the virtual stylesheet.

use std::io::Write;

use anyhow::{Context, Result};

use crate::bridge::module::{MODULE_ID, ModuleBridge};
use crate::config::SpriteConfig;

pub fn print_css(config: &SpriteConfig) -> Result<()> {
    let css = render_css(config)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{css}").context("failed to write to stdout")?;
    Ok(())
}

/// Load the virtual module through the same bridge a bundler would use.
pub fn render_css(config: &SpriteConfig) -> Result<String> {
    let runtime = super::runtime()?;
    let bridge = ModuleBridge::new(config.sprite_loader());

    let css = runtime
        .block_on(bridge.load(MODULE_ID))
        .context("virtual module not resolved")?
        .map_err(anyhow::Error::new)
        .context("sprite generation failed")?;
    Ok(css)
}
