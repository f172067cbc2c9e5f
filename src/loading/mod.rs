//! Loading Module
//!
//! Background model load and its observable lifecycle.

mod coordinator;
mod state;

pub use coordinator::LoadingCoordinator;
pub use state::{LoadingState, TransitionError};
