//! Observability Module
//!
//! Health checks and readiness probes.

mod health;

pub use health::{HealthCheck, HealthReport, HealthStatus, SERVICE_NAME};
