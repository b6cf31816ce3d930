//! Persisted saga state.
//!
//! Instead of a replay-based durable-execution engine, each saga commits an
//! explicit [`SagaRecord`] — instance ID, current step, accumulated step
//! outputs, terminal status — to a [`StateStore`] after every step
//! transition. A restarted process resumes from the persisted step rather
//! than re-executing side-effecting calls, and status queries read the
//! record without touching the running saga.

mod error;
mod memory;
mod record;
mod store;

pub use error::{Result, StateStoreError};
pub use memory::InMemoryStateStore;
pub use record::{SagaRecord, SagaStatus};
pub use store::StateStore;
