//! Operation registry and the runtime facade.
//!
//! The registry names every operation the orchestration layer hosts and the
//! queue it dispatches on; the [`Runtime`] is the upward interface callers
//! use to start sagas, query their persisted status, drive co-signing
//! sessions and subscribe to live resource snapshots.

mod config;
mod error;
pub mod operations;
mod runtime;
mod sessions;
mod telemetry;

pub use config::Config;
pub use error::{RegistryError, Result};
pub use operations::{MONITOR_QUEUE, OPERATIONS, OperationSpec, SAGA_QUEUE, operation};
pub use runtime::{Runtime, StatusReport};
pub use sessions::SessionDirectory;
pub use telemetry::init_tracing;
