//! Shared types for the auction orchestration service.

mod snapshot;
mod types;

pub use snapshot::Snapshot;
pub use types::{Address, InstanceId};
