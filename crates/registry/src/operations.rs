//! The static operation registry.

/// One registered operation: its logical name, the dispatch queue its
/// instances run on, and the state a caller can query while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub name: &'static str,
    pub queue: &'static str,
    pub queryable: &'static str,
}

/// Queue for saga operations.
pub const SAGA_QUEUE: &str = "auction-task-queue";
/// Queue for long-lived monitor operations.
pub const MONITOR_QUEUE: &str = "auction";

/// Every operation this runtime can host.
pub const OPERATIONS: [OperationSpec; 6] = [
    OperationSpec {
        name: saga::steps::CREATE_AUCTION,
        queue: SAGA_QUEUE,
        queryable: "status",
    },
    OperationSpec {
        name: saga::steps::PLACE_BID,
        queue: SAGA_QUEUE,
        queryable: "status, unsigned_artifact",
    },
    OperationSpec {
        name: saga::steps::REFUND,
        queue: SAGA_QUEUE,
        queryable: "status",
    },
    OperationSpec {
        name: saga::steps::WITHDRAW,
        queue: SAGA_QUEUE,
        queryable: "status",
    },
    OperationSpec {
        name: "monitor-auction",
        queue: MONITOR_QUEUE,
        queryable: "auction snapshot stream",
    },
    OperationSpec {
        name: "monitor-bid",
        queue: MONITOR_QUEUE,
        queryable: "bid snapshot stream",
    },
];

/// Looks up an operation by its logical name.
pub fn operation(name: &str) -> Option<&'static OperationSpec> {
    OPERATIONS.iter().find(|op| op.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_saga_operation_is_registered() {
        for name in ["create-auction", "place-bid", "refund", "withdraw"] {
            let op = operation(name).unwrap();
            assert_eq!(op.queue, SAGA_QUEUE);
        }
    }

    #[test]
    fn monitor_operations_run_on_their_own_queue() {
        assert_eq!(operation("monitor-auction").unwrap().queue, MONITOR_QUEUE);
        assert_eq!(operation("monitor-bid").unwrap().queue, MONITOR_QUEUE);
    }

    #[test]
    fn unknown_operation_is_absent() {
        assert!(operation("cancel-auction").is_none());
    }
}
