/// A point-in-time copy of an external resource's observable state.
///
/// Snapshots are immutable value objects: each refresh cycle replaces the
/// whole snapshot rather than mutating it in place. A snapshot whose
/// identity field is still the chain's empty marker is "not yet resolvable"
/// and must never be handed to observers as a resolved resource.
pub trait Snapshot: Clone + Send + Sync + 'static {
    /// Returns true once the snapshot's identity field is populated.
    fn is_resolved(&self) -> bool;
}
