//! Virtual stylesheet module.
//!
//! Importing `@sprite2css/sprite.css` yields the rules of the current
//! generation. Resolving is pure; loading waits for the loader.

use std::sync::Arc;

use crate::sprite::{SpriteError, SpriteLoader};
use crate::utils::path::join_url;

pub const MODULE_ID: &str = "@sprite2css/sprite.css";

const VIRTUAL_PREFIX: &str = "virtual:";

/// One leading `/` and a `virtual:` prefix are ignored, in either order.
pub fn is_module_id(id: &str) -> bool {
    let id = id.strip_prefix('/').unwrap_or(id);
    let id = match id.strip_prefix(VIRTUAL_PREFIX) {
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => id,
    };
    id == MODULE_ID
}

/// URL path the dev server answers the module at.
pub fn module_url(base: &str) -> String {
    join_url(base, MODULE_ID)
}

/// Request path with `base` removed, or `None` outside `base`.
pub fn strip_base<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    path.strip_prefix(base.trim_end_matches('/'))
        .filter(|rest| rest.starts_with('/'))
}

#[derive(Clone)]
pub struct ModuleBridge {
    loader: SpriteLoader,
}

impl ModuleBridge {
    pub fn new(loader: SpriteLoader) -> Self {
        Self { loader }
    }

    /// Canonical id if `id` names the virtual module.
    pub fn resolve_id(&self, id: &str) -> Option<&'static str> {
        is_module_id(id).then_some(MODULE_ID)
    }

    /// Stylesheet text, or `None` for ids this bridge does not own.
    pub async fn load(&self, id: &str) -> Option<Result<String, Arc<SpriteError>>> {
        if !is_module_id(id) {
            return None;
        }
        Some(self.loader.load().await.map(|sprites| sprites.css()))
    }
}
