//! sprite2css - CSS sprite sheets from image directories.
//!
//! The binary wires these modules into the `build`, `serve` and `css`
//! commands. Hosts that embed the generator use [`sprite::SpriteLoader`]
//! with the seams in [`bridge`].

pub mod bridge;
pub mod cli;
pub mod config;
pub mod core;
pub mod logger;
pub mod sprite;
pub mod utils;
