//! Configuration sections.

mod build;
mod entries;
mod serve;

pub use build::BuildConfig;
pub use entries::deserialize_entries;
pub use serve::ServeConfig;
