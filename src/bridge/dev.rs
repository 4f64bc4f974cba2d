//! Dev-server delivery of sprite sheets.
//!
//! Every request first waits for the current generation. Sheet requests
//! (`<base><target>…`) are answered from memory; everything else is handed
//! back to the server untouched.

use std::sync::Arc;

use anyhow::Result;
use tiny_http::{Method, Request};
use tokio::runtime::Handle;

use crate::cli::serve::response;
use crate::logger;
use crate::sprite::{LoadPhase, SpriteLoader, SpriteOptions, SpriteSet};
use crate::utils::mime::types::PNG;
use crate::utils::path::{join_url, request_path};

/// Outcome of [`DevBridge::intercept`].
pub enum Handled {
    /// A response was sent.
    Done,
    /// Not a sprite request; the server should handle it.
    Next(Request),
}

pub struct DevBridge {
    loader: SpriteLoader,
    runtime: Handle,
    base: String,
    /// `join(base, target)`
    prefix: String,
}

impl DevBridge {
    pub fn new(loader: SpriteLoader, runtime: Handle, options: &SpriteOptions) -> Self {
        Self {
            loader,
            runtime,
            base: options.base.clone(),
            prefix: join_url(&options.base, &options.target),
        }
    }

    /// Called from the server's request threads (outside the runtime).
    pub fn intercept(&self, request: Request) -> Result<Handled> {
        let sprites = match self.current() {
            Ok(sprites) => sprites,
            Err(e) => {
                logger::status_error("sprite generation failed", &format!("{e:#}"));
                response::respond_error(request, &e)?;
                return Ok(Handled::Done);
            }
        };

        if !matches!(request.method(), Method::Get | Method::Head) {
            return Ok(Handled::Next(request));
        }

        let path = request_path(request.url());
        let Some(bytes) = self.lookup(&sprites, &path) else {
            return Ok(Handled::Next(request));
        };

        crate::debug!("serve"; "sprite {}", path);
        response::respond_bytes(request, PNG, bytes.to_vec())?;
        Ok(Handled::Done)
    }

    /// Wait for the current generation.
    ///
    /// `load()` spawns onto the runtime, so it is called inside `block_on`.
    pub fn current(&self) -> Result<Arc<SpriteSet>> {
        if self.loader.phase() != LoadPhase::Loaded {
            crate::debug!("serve"; "waiting for sprite generation");
        }
        self.runtime
            .block_on(async { self.loader.load().await })
            .map_err(anyhow::Error::new)
    }

    fn lookup<'a>(&self, sprites: &'a SpriteSet, path: &str) -> Option<&'a [u8]> {
        sprite_key(&self.base, &self.prefix, path).and_then(|key| sprites.image(&key))
    }
}

/// Cache key of a request path, if it lies under `prefix`.
///
/// `base` is removed so the key matches the output path recorded by the
/// orchestrator (`/assets/...`).
pub fn sprite_key(base: &str, prefix: &str, path: &str) -> Option<String> {
    if !path.starts_with(prefix) {
        return None;
    }
    let rest = path.strip_prefix(base.trim_end_matches('/')).unwrap_or(path);
    Some(join_url("/", rest))
}
