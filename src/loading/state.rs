//! Loading State
//!
//! Lifecycle of the single vector store: `NotStarted -> Loading -> Ready`
//! or `Loading -> Failed`.

use serde::Serialize;

/// Snapshot of the model load lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    NotStarted,
    Loading { progress: u8, message: String },
    Ready { vocabulary_size: usize },
    Failed { error: String },
}

/// Rejected lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid loading transition from {from} to {to}")]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

impl LoadingState {
    /// Short name of the variant
    pub fn name(&self) -> &'static str {
        match self {
            LoadingState::NotStarted => "not_started",
            LoadingState::Loading { .. } => "loading",
            LoadingState::Ready { .. } => "ready",
            LoadingState::Failed { .. } => "failed",
        }
    }

    /// Percentage shown to clients
    pub fn progress(&self) -> u8 {
        match self {
            LoadingState::NotStarted | LoadingState::Failed { .. } => 0,
            LoadingState::Loading { progress, .. } => *progress,
            LoadingState::Ready { .. } => 100,
        }
    }

    /// Human-readable status line
    pub fn message(&self) -> String {
        match self {
            LoadingState::NotStarted => "Not started".to_string(),
            LoadingState::Loading { message, .. } => message.clone(),
            LoadingState::Ready { .. } => "Ready!".to_string(),
            LoadingState::Failed { error } => format!("Error: {}", error),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadingState::Ready { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadingState::Failed { .. })
    }

    /// `Ready` and `Failed` never change again
    pub fn is_terminal(&self) -> bool {
        self.is_ready() || self.is_failed()
    }

    /// Vocabulary size once ready, zero otherwise
    pub fn vocabulary_size(&self) -> usize {
        match self {
            LoadingState::Ready { vocabulary_size } => *vocabulary_size,
            _ => 0,
        }
    }

    /// Whether moving to `next` keeps the lifecycle forward-only
    pub fn can_transition_to(&self, next: &LoadingState) -> bool {
        match (self, next) {
            (LoadingState::NotStarted, LoadingState::Loading { progress, .. }) => *progress < 100,
            (LoadingState::Loading { progress: cur, .. }, LoadingState::Loading { progress, .. }) => {
                progress >= cur && *progress < 100
            }
            (LoadingState::Loading { .. }, LoadingState::Ready { .. }) => true,
            (LoadingState::Loading { .. }, LoadingState::Failed { .. }) => true,
            _ => false,
        }
    }

    /// Check a transition, producing the error a caller can log
    pub fn check_transition(&self, next: &LoadingState) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.name(),
                to: next.name(),
            })
        }
    }
}
