//! Monitor hubs: live-state fan-out for shared on-chain resources.
//!
//! At most one refresh loop runs per tracked resource no matter how many
//! orchestration instances observe it. A [`MonitorHub`] owns the loop and a
//! set of weak subscriber addresses; the [`MonitorDirectory`] is the
//! attach-or-create entry point, keyed by resource ID under a single lock so
//! there is no race between "hub died" and "caller attaches".
//!
//! Instances never share memory with a hub: registration and refresh nudges
//! are messages into the hub's mailbox, snapshots come back over each
//! subscriber's own channel, and a failed delivery is the hub's only
//! eviction signal.

mod directory;
mod hub;
mod source;

pub use directory::MonitorDirectory;
pub use hub::{HubHandle, MonitorConfig, MonitorHub, Subscriber};
pub use source::{FetchFault, SnapshotSource};
