//! `entries`: one `[entries]` table or an `[[entries]]` array.
//!
//! ```toml
//! [[entries]]
//! source = "images/icons"
//! includes = ["*.png"]
//!
//! [[entries]]
//! name = "flags"
//! source = "images/flags"
//! class_name = "flag-[name]"
//! ```

use serde::{Deserialize, Deserializer};

use crate::sprite::SourceEntry;

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(SourceEntry),
    Many(Vec<SourceEntry>),
}

pub fn deserialize_entries<'de, D>(deserializer: D) -> Result<Vec<SourceEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(entry) => vec![entry],
        OneOrMany::Many(entries) => entries,
    })
}
