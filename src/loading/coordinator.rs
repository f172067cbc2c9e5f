//! Loading Coordinator
//!
//! Owns the one `VectorStore` of the process. The load runs on a blocking
//! background task while readers poll the published state snapshot.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::state::{LoadingState, TransitionError};
use crate::error::{LoadError, Result, WordVecError};
use crate::vector::{LoadStage, VectorStore};

const STARTING_MESSAGE: &str = "Starting up...";

/// Single-owner model lifecycle
#[derive(Debug, Default)]
pub struct LoadingCoordinator {
    /// Latest published snapshot
    state: RwLock<LoadingState>,
    /// Set exactly once, together with the `Ready` snapshot
    store: OnceLock<VectorStore>,
}

impl LoadingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state snapshot
    pub fn status(&self) -> LoadingState {
        self.state.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.store.get().is_some()
    }

    /// The loaded store, or `NotReady` without waiting
    pub fn store(&self) -> Result<&VectorStore> {
        self.store.get().ok_or(WordVecError::NotReady)
    }

    /// Begin loading `path` on a background task
    pub fn start(
        self: &Arc<Self>,
        path: impl Into<PathBuf>,
    ) -> std::result::Result<JoinHandle<()>, TransitionError> {
        self.begin()?;

        let path = path.into();
        let coordinator = Arc::clone(self);
        Ok(tokio::task::spawn_blocking(move || {
            // Failure is already published as the Failed state
            let _ = coordinator.run_load(&path);
        }))
    }

    /// Load `path` on the current thread
    pub fn load_blocking(&self, path: &Path) -> Result<&VectorStore> {
        self.begin()?;
        self.run_load(path)?;
        self.store()
    }

    /// `NotStarted -> Loading(0)`. Only the first call succeeds.
    pub(crate) fn begin(&self) -> std::result::Result<(), TransitionError> {
        let mut state = self.state.write();
        let next = LoadingState::Loading {
            progress: 0,
            message: STARTING_MESSAGE.to_string(),
        };
        if !matches!(*state, LoadingState::NotStarted) {
            return Err(TransitionError {
                from: state.name(),
                to: next.name(),
            });
        }
        state.check_transition(&next)?;
        *state = next;
        Ok(())
    }

    fn run_load(&self, path: &Path) -> std::result::Result<(), LoadError> {
        info!(path = %path.display(), "Loading word vectors");
        let started = Instant::now();

        let result = VectorStore::load_with_progress(path, &mut |percent, stage| {
            self.report_progress(percent, stage)
        });

        match result {
            Ok(store) => {
                info!(
                    vocabulary_size = store.len(),
                    dimension = store.dimension(),
                    elapsed = ?started.elapsed(),
                    "Word vectors loaded"
                );
                if let Err(e) = self.complete(store) {
                    warn!(error = %e, "Discarding loaded store");
                }
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load word vectors");
                if let Err(te) = self.fail(e.to_string()) {
                    warn!(error = %te, "Could not record load failure");
                }
                Err(e)
            }
        }
    }

    /// Publish a progress milestone. Never moves progress backwards and
    /// never reaches 100 before `Ready`.
    pub(crate) fn report_progress(&self, percent: u8, stage: LoadStage) {
        let mut state = self.state.write();
        let current = match &*state {
            LoadingState::Loading { progress, .. } => *progress,
            _ => return,
        };

        let progress = percent.min(99).max(current);
        debug!(progress, stage = %stage, "Load progress");
        *state = LoadingState::Loading {
            progress,
            message: stage.message().to_string(),
        };
    }

    /// `Loading -> Ready`, publishing the store under the state lock
    pub(crate) fn complete(&self, store: VectorStore) -> std::result::Result<(), TransitionError> {
        let mut state = self.state.write();
        let next = LoadingState::Ready {
            vocabulary_size: store.len(),
        };
        state.check_transition(&next)?;

        if self.store.set(store).is_err() {
            return Err(TransitionError {
                from: state.name(),
                to: next.name(),
            });
        }
        *state = next;
        Ok(())
    }

    /// `Loading -> Failed`
    pub(crate) fn fail(&self, error: String) -> std::result::Result<(), TransitionError> {
        let mut state = self.state.write();
        let next = LoadingState::Failed { error };
        state.check_transition(&next)?;
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vectors_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const TOY: &str = "king 1.0 1.0 0.0\nqueen -1.0 1.0 0.0\nman 1.0 0.0 0.0\n\
                       woman -1.0 0.0 0.0\ndog 0.0 0.0 1.0\n";

    #[test]
    fn test_not_ready_before_start() {
        let coordinator = LoadingCoordinator::new();
        assert_eq!(coordinator.status(), LoadingState::NotStarted);
        assert!(!coordinator.is_ready());
        assert!(matches!(coordinator.store(), Err(WordVecError::NotReady)));
    }

    #[test]
    fn test_queries_fail_fast_while_loading() {
        let coordinator = LoadingCoordinator::new();
        coordinator.begin().unwrap();
        coordinator.report_progress(40, LoadStage::Parsing);

        assert_eq!(
            coordinator.status(),
            LoadingState::Loading {
                progress: 40,
                message: LoadStage::Parsing.message().to_string(),
            }
        );
        assert!(matches!(coordinator.store(), Err(WordVecError::NotReady)));
    }

    #[test]
    fn test_progress_is_monotonic_and_capped() {
        let coordinator = LoadingCoordinator::new();
        coordinator.begin().unwrap();

        coordinator.report_progress(60, LoadStage::Parsing);
        coordinator.report_progress(30, LoadStage::Parsing);
        assert_eq!(coordinator.status().progress(), 60);

        coordinator.report_progress(150, LoadStage::Indexing);
        assert_eq!(coordinator.status().progress(), 99);
    }

    #[test]
    fn test_progress_ignored_outside_loading() {
        let coordinator = LoadingCoordinator::new();
        coordinator.report_progress(50, LoadStage::Parsing);
        assert_eq!(coordinator.status(), LoadingState::NotStarted);
    }

    #[tokio::test]
    async fn test_background_load_reaches_ready() {
        let file = vectors_file(TOY);
        let coordinator = Arc::new(LoadingCoordinator::new());

        let handle = coordinator.start(file.path()).unwrap();
        assert!(!matches!(coordinator.status(), LoadingState::NotStarted));
        handle.await.unwrap();

        assert_eq!(
            coordinator.status(),
            LoadingState::Ready { vocabulary_size: 5 }
        );
        let store = coordinator.store().unwrap();
        assert!((store.similarity("king", "king").unwrap() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_second_start_rejected() {
        let file = vectors_file(TOY);
        let coordinator = Arc::new(LoadingCoordinator::new());

        let handle = coordinator.start(file.path()).unwrap();
        assert!(coordinator.start(file.path()).is_err());
        handle.await.unwrap();

        assert!(coordinator.start(file.path()).is_err());
        assert_eq!(coordinator.status().vocabulary_size(), 5);
    }

    #[tokio::test]
    async fn test_missing_file_fails_terminally() {
        let dir = tempfile::TempDir::new().unwrap();
        let coordinator = Arc::new(LoadingCoordinator::new());

        coordinator
            .start(dir.path().join("missing.txt"))
            .unwrap()
            .await
            .unwrap();

        let status = coordinator.status();
        assert!(status.is_failed());
        assert!(status.message().starts_with("Error: vector file not found"));
        assert!(matches!(coordinator.store(), Err(WordVecError::NotReady)));
        assert!(coordinator.start(dir.path().join("missing.txt")).is_err());
    }

    #[tokio::test]
    async fn test_malformed_file_fails() {
        let file = vectors_file("cat 1.0 2.0\ndog 1.0\n");
        let coordinator = Arc::new(LoadingCoordinator::new());

        coordinator.start(file.path()).unwrap().await.unwrap();

        match coordinator.status() {
            LoadingState::Failed { error } => assert!(error.contains("line 2")),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_load_blocking() {
        let file = vectors_file(TOY);
        let coordinator = LoadingCoordinator::new();

        let store = coordinator.load_blocking(file.path()).unwrap();
        assert_eq!(store.len(), 5);
        assert!(coordinator.status().is_ready());
    }

    #[test]
    fn test_load_blocking_surfaces_load_error() {
        let file = vectors_file("");
        let coordinator = LoadingCoordinator::new();

        let err = coordinator.load_blocking(file.path()).unwrap_err();
        assert!(matches!(err, WordVecError::Load(LoadError::Empty)));
        assert!(coordinator.status().is_failed());
    }

    #[test]
    fn test_begin_only_once_while_loading() {
        let coordinator = LoadingCoordinator::new();
        coordinator.begin().unwrap();
        assert_eq!(coordinator.status().progress(), 0);

        let err = coordinator.begin().unwrap_err();
        assert_eq!(err.from, "loading");
        assert_eq!(coordinator.status().progress(), 0);
    }

    #[tokio::test]
    async fn test_start_rejected_before_first_progress() {
        let file = vectors_file(TOY);
        let coordinator = Arc::new(LoadingCoordinator::new());
        coordinator.begin().unwrap();

        assert!(coordinator.start(file.path()).is_err());
        assert!(matches!(
            coordinator.status(),
            LoadingState::Loading { progress: 0, .. }
        ));
    }

    #[test]
    fn test_second_load_blocking_reports_transition() {
        let file = vectors_file(TOY);
        let coordinator = LoadingCoordinator::new();
        coordinator.load_blocking(file.path()).unwrap();

        let err = coordinator.load_blocking(file.path()).unwrap_err();
        assert!(matches!(err, WordVecError::Transition(ref e) if e.from == "ready"));
        assert_eq!(coordinator.status().vocabulary_size(), 5);
    }
}
