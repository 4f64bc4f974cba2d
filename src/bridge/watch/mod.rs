//! Source watcher
//!
//! Resets the sprite loader when anything under a source directory changes.
//!
//! ```text
//! notify → Debouncer (300ms, under-source filter) → SpriteLoader::reset
//! ```
//!
//! The reset only forgets the current generation; the next request to the
//! dev server starts the new one.

mod debouncer;
mod watch_roots;

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;

use crate::logger;
use crate::sprite::SpriteLoader;
use debouncer::Debouncer;
use watch_roots::WatchRoots;

/// Upper bound between checks for re-created source directories.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct SourceWatcher {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    debouncer: Debouncer,
    loader: SpriteLoader,
}

impl SourceWatcher {
    /// Start watching `sources` immediately; events buffer until `run`.
    pub fn new(sources: Vec<PathBuf>, loader: SpriteLoader) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let debouncer = Debouncer::new(&sources);
        let mut watch_roots = WatchRoots::new(sources);
        watch_roots.attach_existing(&mut watcher)?;

        crate::debug!("watch"; "watching {} source(s)", watch_roots.attached_count());

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            debouncer,
            loader,
        })
    }

    /// Event loop. Runs until the runtime shuts down or notify stops.
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            mut debouncer,
            loader,
        } = self;

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            let sleep = debouncer.sleep_duration().min(MAINTAIN_INTERVAL);
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(sleep) => {
                    if watch_roots.maintain(&mut watcher) {
                        reset(&loader, "source directory appeared").await;
                    }
                    if let Some(changes) = debouncer.take_if_ready() {
                        for path in &changes {
                            crate::debug!("watch"; "changed: {}", path.display());
                        }
                        reset(&loader, &format!("{} file(s) changed", changes.len())).await;
                    }
                }
            }
        }
    }
}

async fn reset(loader: &SpriteLoader, reason: &str) {
    loader.reset().await;
    logger::status_success(&format!("{reason}, sprites will regenerate"));
}
