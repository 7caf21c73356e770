// src/classify/handle.rs
/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

use super::{ClassificationResult, Classifier, ClassifierConfig};
use crate::article::ArticleCandidate;
use crate::debug::is_dev_env;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

pub const ENV_HOT_RELOAD: &str = "HSA_FILTER_HOT_RELOAD";

/// A threadsafe handle that can hot-reload the underlying classifier in dev/local.
/// - Enable by setting HSA_FILTER_HOT_RELOAD=1
/// - Dev-gated: active only if cfg!(debug_assertions) OR HSA_FILTER_ENV is "local"/"development"/"dev".
#[derive(Clone)]
pub struct ClassifierHandle {
    inner: Arc<RwLock<Arc<Classifier>>>,
}

impl ClassifierHandle {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(classifier))),
        }
    }

    /// Snapshot of the current classifier; batch work keeps using it even if a reload lands.
    pub fn current(&self) -> Arc<Classifier> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn classify(&self, article: &ArticleCandidate) -> ClassificationResult {
        self.current().classify(article)
    }

    pub fn replace(&self, classifier: Classifier) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Arc::new(classifier),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(classifier),
        }
    }

    /// Rebuild from `path` (env overrides included) and swap it in. On error
    /// the current classifier stays.
    pub fn reload_from(&self, path: &Path) -> Result<()> {
        let fresh = ClassifierConfig::load(Some(path)).and_then(Classifier::new)?;
        self.replace(fresh);
        Ok(())
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    cfg!(debug_assertions) || is_dev_env()
}

/// Start a simple polling watcher on `path` to hot-reload into `handle`.
/// Polls mtime every 2s. A config that fails to parse or compile is ignored.
pub fn start_hot_reload_thread(handle: ClassifierHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }
    info!(path = %path.display(), "classifier hot reload enabled");

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => {
                        last_mtime = Some(mtime);
                        false
                    }
                    Some(prev) => mtime > prev,
                };
                if changed {
                    match handle.reload_from(&path) {
                        Ok(()) => info!(path = %path.display(), "classifier reloaded"),
                        Err(e) => warn!(error = %e, "classifier reload failed; keeping previous"),
                    }
                    last_mtime = Some(mtime);
                }
            }
            thread::sleep(poll);
        }
    });
}
