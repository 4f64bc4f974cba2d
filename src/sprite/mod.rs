//! Sprite generation core.
//!
//! - `scan` / `pattern`: walk a source directory with include/exclude filters
//! - `pack`: lay images out on one sheet (`Packer` trait)
//! - `naming` / `hash` / `css`: output names and generated rules
//! - `orchestrator`: one full generation over all entries
//! - `loader`: memoized, resettable access to the current generation

mod cache;
mod css;
mod entry;
mod error;
mod hash;
mod loader;
mod naming;
mod orchestrator;
mod pattern;
mod scan;

pub mod pack;

pub use cache::SpriteSet;
pub use entry::SourceEntry;
pub use error::SpriteError;
pub use hash::{DEFAULT_HASH_LENGTH, MAX_HASH_LENGTH};
pub use loader::{LoadPhase, LoadResult, Singleton, SpriteLoader};
pub use naming::{NameContext, Template};
pub use orchestrator::{DEFAULT_TARGET, Orchestrator, SpriteOptions};
pub use pattern::Pattern;
