//! Health Checks
//!
//! Readiness and the `/health` payload, derived from the
//! loading lifecycle.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::loading::{LoadingCoordinator, LoadingState};

pub const SERVICE_NAME: &str = "Word Vector API";

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ready,
    Initializing,
    Failed,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Ready => write!(f, "ready"),
            HealthStatus::Initializing => write!(f, "initializing"),
            HealthStatus::Failed => write!(f, "failed"),
        }
    }
}

impl From<&LoadingState> for HealthStatus {
    fn from(state: &LoadingState) -> Self {
        match state {
            LoadingState::Ready { .. } => HealthStatus::Ready,
            LoadingState::Failed { .. } => HealthStatus::Failed,
            LoadingState::NotStarted | LoadingState::Loading { .. } => HealthStatus::Initializing,
        }
    }
}

/// Health summary served at `/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub service: &'static str,
    pub timestamp: String,
    pub model_loaded: bool,
    pub vocabulary_size: usize,
    pub uptime_secs: u64,
    pub version: &'static str,
}

/// Health check manager
#[derive(Debug, Clone)]
pub struct HealthCheck {
    coordinator: Arc<LoadingCoordinator>,
    start_time: Instant,
}

impl HealthCheck {
    pub fn new(coordinator: Arc<LoadingCoordinator>) -> Self {
        Self {
            coordinator,
            start_time: Instant::now(),
        }
    }

    /// Snapshot the current health
    pub fn check(&self) -> HealthReport {
        let state = self.coordinator.status();

        HealthReport {
            status: HealthStatus::from(&state),
            service: SERVICE_NAME,
            timestamp: chrono::Utc::now().to_rfc3339(),
            model_loaded: state.is_ready(),
            vocabulary_size: state.vocabulary_size(),
            uptime_secs: self.uptime().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Readiness check (vectors loaded)
    pub fn readiness(&self) -> bool {
        self.coordinator.is_ready()
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::LoadStage;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HealthStatus::from(&LoadingState::NotStarted),
            HealthStatus::Initializing
        );
        assert_eq!(
            HealthStatus::from(&LoadingState::Ready { vocabulary_size: 1 }),
            HealthStatus::Ready
        );
        assert_eq!(
            HealthStatus::from(&LoadingState::Failed {
                error: "x".to_string()
            }),
            HealthStatus::Failed
        );
        assert_eq!(HealthStatus::Initializing.to_string(), "initializing");
    }

    #[test]
    fn test_health_while_loading() {
        let coordinator = Arc::new(LoadingCoordinator::new());
        coordinator.begin().unwrap();
        coordinator.report_progress(30, LoadStage::Parsing);

        let health = HealthCheck::new(coordinator);
        let report = health.check();

        assert_eq!(report.status, HealthStatus::Initializing);
        assert!(!report.model_loaded);
        assert_eq!(report.vocabulary_size, 0);
        assert!(!health.readiness());
    }

    #[test]
    fn test_health_json() {
        let coordinator = Arc::new(LoadingCoordinator::new());
        coordinator.begin().unwrap();
        coordinator.fail("vector file contains no vectors".to_string()).unwrap();

        let report = HealthCheck::new(coordinator).check();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["service"], SERVICE_NAME);
        assert_eq!(json["model_loaded"], false);
        assert!(json["version"].is_string());
    }
}
