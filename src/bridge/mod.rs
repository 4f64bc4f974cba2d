//! Host-facing seams around the sprite loader.
//!
//! - `module`: the virtual stylesheet module
//! - `dev`: dev-server interception of sprite image requests
//! - `watch`: source watcher that resets the loader
//! - `emit`: build-time output of sprite sheets
//!
//! All of them share one [`SpriteLoader`](crate::sprite::SpriteLoader)
//! handed in by the command that owns it.

pub mod dev;
pub mod emit;
pub mod module;
pub mod watch;
