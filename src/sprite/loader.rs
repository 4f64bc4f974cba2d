//! Memoized, resettable sprite generation.
//!
//! ```text
//!            load()                run settles Ok
//! Unloaded ─────────→ Loading ─────────────────────→ Loaded
//!    ↑                   │  run settles Err             │
//!    └───────────────────┴──────────────────────────────┘
//!                        reset()
//! ```
//!
//! Every `load()` issued while `Loading` receives the same shared run, so
//! one generation executes the task exactly once no matter how many
//! callers race. `reset()` forgets the generation immediately, but its
//! future completes only after the forgotten run has settled.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use super::orchestrator::Orchestrator;
use super::{SpriteError, SpriteSet};

/// Result shared by every caller awaiting one generation.
pub type LoadResult<T> = Result<Arc<T>, Arc<SpriteError>>;

type Task<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, SpriteError>> + Send + Sync>;
type SharedRun<T> = Shared<BoxFuture<'static, LoadResult<T>>>;

/// Observable loader phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Unloaded,
    Loading,
    Loaded,
}

enum State<T> {
    Unloaded,
    Loading { generation: u64, run: SharedRun<T> },
    Loaded { generation: u64, value: Arc<T> },
}

struct Inner<T> {
    state: Mutex<State<T>>,
    generations: AtomicU64,
    task: Task<T>,
}

/// Runs `task` at most once per generation.
pub struct Singleton<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Singleton<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A generation is one full orchestration run.
pub type SpriteLoader = Singleton<SpriteSet>;

impl SpriteLoader {
    pub fn for_orchestrator(orchestrator: Orchestrator) -> Self {
        let orchestrator = Arc::new(orchestrator);
        Self::new(move || Arc::clone(&orchestrator).run().boxed())
    }
}

impl<T: Send + Sync + 'static> Singleton<T> {
    pub fn new<F>(task: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, SpriteError>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Unloaded),
                generations: AtomicU64::new(0),
                task: Arc::new(task),
            }),
        }
    }

    pub fn phase(&self) -> LoadPhase {
        match &*self.inner.state.lock() {
            State::Unloaded => LoadPhase::Unloaded,
            State::Loading { .. } => LoadPhase::Loading,
            State::Loaded { .. } => LoadPhase::Loaded,
        }
    }

    /// Result of the current generation, starting one if needed.
    ///
    /// Must be called inside a Tokio runtime: a new generation is spawned
    /// so it runs to completion even if every caller stops waiting.
    pub fn load(&self) -> BoxFuture<'static, LoadResult<T>> {
        let mut state = self.inner.state.lock();
        match &*state {
            State::Loaded { value, .. } => return future::ready(Ok(Arc::clone(value))).boxed(),
            State::Loading { run, .. } => return run.clone().boxed(),
            State::Unloaded => {}
        }

        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
        crate::debug!("loader"; "starting generation {}", generation);

        // `settle` needs the state lock, which is held until `Loading` is stored.
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = (inner.task)().await.map(Arc::new).map_err(Arc::new);
            inner.settle(generation, &result);
            result
        });

        let inner = Arc::clone(&self.inner);
        let run = handle
            .map(move |joined| {
                let result = joined.unwrap_or_else(|e| Err(Arc::new(SpriteError::from(e))));
                inner.settle(generation, &result);
                result
            })
            .boxed()
            .shared();

        *state = State::Loading {
            generation,
            run: run.clone(),
        };
        run.boxed()
    }

    /// Forget the current generation.
    ///
    /// The state is cleared when this is called, not when the returned
    /// future is polled. The future completes once the in-flight run of
    /// the forgotten generation (if any) has settled. Never fails.
    pub fn reset(&self) -> impl Future<Output = ()> + Send + 'static {
        let previous = std::mem::replace(&mut *self.inner.state.lock(), State::Unloaded);
        let pending = match previous {
            State::Loading { generation, run } => {
                crate::debug!("loader"; "reset while generation {} in flight", generation);
                Some(run)
            }
            State::Loaded { .. } | State::Unloaded => None,
        };

        async move {
            if let Some(run) = pending {
                let _ = run.await;
            }
        }
    }
}

impl<T> Inner<T> {
    /// Record the outcome of `generation` unless it was reset meanwhile.
    fn settle(&self, generation: u64, result: &LoadResult<T>) {
        let mut state = self.state.lock();
        let State::Loading { generation: current, .. } = &*state else {
            return;
        };
        if *current != generation {
            return;
        }

        *state = match result {
            Ok(value) => State::Loaded {
                generation,
                value: Arc::clone(value),
            },
            Err(_) => State::Unloaded,
        };
    }
}
