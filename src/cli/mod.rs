//! Command-line interface module.

mod args;
pub mod build;
pub mod css;
pub mod serve;

pub use args::{Cli, Commands};

/// Runtime for one command; the sprite pipeline runs on it.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    use anyhow::Context;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}
