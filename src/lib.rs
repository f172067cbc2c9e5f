//! wordvec - Word Embedding Lookup Service
//!
//! Loads a pre-trained word vector file into memory in the background and
//! serves cosine similarity, nearest-neighbor and analogy queries over HTTP.

pub mod error;
pub mod loading;
pub mod metrics;
pub mod observability;
pub mod server;
pub mod vector;

pub use error::{LoadError, Result, WordVecError};
pub use loading::{LoadingCoordinator, LoadingState};
pub use metrics::Metrics;
pub use observability::{HealthCheck, HealthStatus};
pub use server::{Config, Server};
pub use vector::{AnalogyQuery, AnalogySolver, Neighbor, VectorStore};
