use anyhow::Result;
use clap::{ColorChoice, Parser};
use sprite2css::cli::{self, Cli, Commands};
use sprite2css::config::SpriteConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    sprite2css::core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SpriteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build => cli::build::build_sprites(&config).map(|_| ()),
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Css => cli::css::print_css(&config),
    }
}
