//! Background model loading
//!
//! Imports run on a tokio runtime used purely as a bounded pool of blocking
//! threads. Each finished import is sent back as a [`LoadOutcome`] over a
//! flume channel that the UI thread drains once per frame; an optional
//! notifier wakes the event loop when an outcome is ready. Only one load may
//! be in flight at a time.

use log::{error, info};
use meshview_core::{Content, Observable};
use meshview_io::{ImportError, ImporterRegistry};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Observable loader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
}

/// The load currently in flight
#[derive(Debug, Clone)]
pub struct LoadSession {
    pub path: PathBuf,
    pub started: Instant,
}

/// Why a load that reached the worker did not produce content
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Importer panicked: {0}")]
    Panicked(String),
}

/// Result of one import, delivered on the UI thread
#[derive(Debug)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub result: std::result::Result<Content, LoadFailure>,
    pub elapsed: Duration,
}

impl LoadOutcome {
    /// Status line text for this outcome
    pub fn status_text(&self) -> String {
        match &self.result {
            Ok(_) => format!("Loaded file {}", self.path.display()),
            Err(LoadFailure::Import(e)) if e.is_resource_exhausted() => {
                format!("Not enough memory to load file {}", self.path.display())
            }
            Err(LoadFailure::Import(ImportError::MissingDependency { dependency, .. })) => {
                format!("Dependency {} could not be loaded", dependency)
            }
            Err(_) => format!("Failed to load file {}", self.path.display()),
        }
    }
}

/// Errors raised when a load cannot be started
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("A load of {} is already in progress", path.display())]
    Busy { path: PathBuf },

    #[error(transparent)]
    Rejected(#[from] ImportError),

    #[error("Failed to start loader runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;

type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Runs imports off the UI thread, one at a time
pub struct LoadOrchestrator {
    runtime: tokio::runtime::Runtime,
    registry: Arc<ImporterRegistry>,
    sender: flume::Sender<LoadOutcome>,
    receiver: flume::Receiver<LoadOutcome>,
    session: Option<LoadSession>,
    state: Observable<LoadState>,
    notifier: Option<Notifier>,
}

impl LoadOrchestrator {
    /// Create an orchestrator with at most `max_threads` concurrent import threads
    pub fn new(registry: ImporterRegistry, max_threads: usize) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_threads.max(1))
            .thread_name("meshview-loader")
            .build()
            .map_err(LoadError::Runtime)?;
        let (sender, receiver) = flume::unbounded();

        Ok(Self {
            runtime,
            registry: Arc::new(registry),
            sender,
            receiver,
            session: None,
            state: Observable::new(LoadState::Idle),
            notifier: None,
        })
    }

    /// Call `notifier` from the worker after each outcome is queued
    pub fn with_notifier(mut self, notifier: impl Fn() + Send + Sync + 'static) -> Self {
        self.set_notifier(notifier);
        self
    }

    pub fn set_notifier(&mut self, notifier: impl Fn() + Send + Sync + 'static) {
        self.notifier = Some(Arc::new(notifier));
    }

    pub fn registry(&self) -> &ImporterRegistry {
        &self.registry
    }

    pub fn state(&self) -> LoadState {
        *self.state.get()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&LoadSession> {
        self.session.as_ref()
    }

    pub fn subscribe_state(&mut self, subscriber: impl FnMut(&LoadState) + 'static) {
        self.state.subscribe(subscriber);
    }

    /// Whether [`start`](Self::start) would accept `path` right now
    pub fn check(&self, path: &Path) -> Result<()> {
        if let Some(session) = &self.session {
            return Err(LoadError::Busy {
                path: session.path.clone(),
            });
        }
        self.registry.check(path)?;
        Ok(())
    }

    /// Validate the path and hand the import to a worker.
    ///
    /// Unknown extensions are rejected here, before any worker is involved.
    pub fn start(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.check(&path)?;

        info!("Loading {}", path.display());
        let started = Instant::now();
        self.session = Some(LoadSession {
            path: path.clone(),
            started,
        });
        self.state.set_if_changed(LoadState::Loading);

        let registry = Arc::clone(&self.registry);
        let sender = self.sender.clone();
        let notifier = self.notifier.clone();
        self.runtime.spawn_blocking(move || {
            let result = import(&registry, &path);
            let outcome = LoadOutcome {
                path,
                result,
                elapsed: started.elapsed(),
            };
            if sender.send(outcome).is_ok() {
                if let Some(notify) = notifier {
                    notify();
                }
            }
        });
        Ok(())
    }

    /// Take the finished outcome, if any, returning to idle
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let outcome = self.receiver.try_recv().ok()?;
        Some(self.finish(outcome))
    }

    /// Block until the in-flight load finishes or `timeout` passes
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        if self.session.is_none() {
            return self.poll();
        }
        let outcome = self.receiver.recv_timeout(timeout).ok()?;
        Some(self.finish(outcome))
    }

    fn finish(&mut self, outcome: LoadOutcome) -> LoadOutcome {
        self.session = None;
        self.state.set_if_changed(LoadState::Idle);
        match &outcome.result {
            Ok(content) => info!(
                "Loaded {} ({} triangles) in {:.2?}",
                outcome.path.display(),
                content.root().face_count(),
                outcome.elapsed
            ),
            Err(e) => error!("Failed to load {}: {}", outcome.path.display(), error_chain(e)),
        }
        outcome
    }
}

fn import(registry: &ImporterRegistry, path: &Path) -> std::result::Result<Content, LoadFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| registry.load(path))) {
        Ok(result) => result.map_err(LoadFailure::from),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(LoadFailure::Panicked(message))
        }
    }
}

/// `outer: inner: innermost`, skipping causes already quoted by their parent
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
