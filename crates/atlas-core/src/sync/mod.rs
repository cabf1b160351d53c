//! Last-request-wins generations for asynchronous fetches

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Handle identifying one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Last-request-wins gate for asynchronous fetches.
///
/// Each new request supersedes every earlier one: only the response holding
/// the most recent ticket may be merged into state.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    latest: Arc<AtomicU64>,
}

impl RequestGate {
    /// Create a new gate with no request in flight
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new request, superseding all earlier ones
    pub fn begin(&self) -> RequestTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Request issued");
        RequestTicket { generation }
    }

    /// Whether the ticket still belongs to the latest request
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.generation
    }

    /// Cancel whatever is in flight without issuing a new request
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Hand back `value` only when the ticket is still current
    pub fn accept<T>(&self, ticket: &RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(generation = ticket.generation, "Dropping superseded response");
            None
        }
    }

    /// Generation of the most recent request
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_supersedes_older() {
        let gate = RequestGate::new();
        let first = gate.begin();
        let second = gate.begin();

        assert!(!gate.is_current(&first));
        assert!(gate.is_current(&second));
        assert_eq!(gate.accept(&first, "stale"), None);
        assert_eq!(gate.accept(&second, "fresh"), Some("fresh"));
    }

    #[test]
    fn test_cancel_invalidates_in_flight() {
        let gate = RequestGate::new();
        let ticket = gate.begin();
        gate.cancel();
        assert!(!gate.is_current(&ticket));
    }

    #[test]
    fn test_clones_share_generation() {
        let gate = RequestGate::new();
        let clone = gate.clone();
        let ticket = gate.begin();
        clone.begin();
        assert!(!gate.is_current(&ticket));
        assert_eq!(gate.latest_generation(), 2);
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_latest() {
        let gate = RequestGate::new();
        let slow = gate.begin();
        let fast = gate.begin();

        let slow_task = {
            let gate = gate.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                gate.accept(&slow, 1)
            })
        };
        let fast_task = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.accept(&fast, 2) })
        };

        assert_eq!(fast_task.await.unwrap(), Some(2));
        assert_eq!(slow_task.await.unwrap(), None);
    }
}
