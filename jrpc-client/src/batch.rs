//! Batch accumulation for one client session
//!
//! [`BatchCoordinator`] is the client-side state machine:
//!
//! ```text
//! idle --begin_batch()--> batching --take()-------> idle
//!                                  --rollback()---> idle
//! ```
//!
//! While batching, calls that expect a response and notifications are kept
//! in separate buckets. Nothing goes over the wire until the batch is taken
//! for a commit. Correlation ids come from a counter owned by the coordinator,
//! so two sessions never share id state.

use jrpc_core::{Call, Id, Params};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// Each call is its own round trip
    #[default]
    Idle,
    /// Calls accumulate until commit or rollback
    Batching,
}

/// Accumulates a session's calls and assigns their correlation ids
#[derive(Debug)]
pub struct BatchCoordinator {
    state: BatchState,
    next_id: i64,
    calls: Vec<Call>,
    notifications: Vec<Call>,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self {
            state: BatchState::Idle,
            next_id: 1,
            calls: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn is_batching(&self) -> bool {
        self.state == BatchState::Batching
    }

    /// Build a call with the next session id
    pub fn create_call(&mut self, method: impl Into<String>, params: Option<Params>) -> Call {
        let id = Id::Number(self.next_id);
        self.next_id += 1;
        Call::new(method, params, id)
    }

    /// Enter the batching state
    ///
    /// Returns `false`, leaving the open batch untouched, when already
    /// batching.
    pub fn begin_batch(&mut self) -> bool {
        if self.is_batching() {
            return false;
        }
        self.calls.clear();
        self.notifications.clear();
        self.state = BatchState::Batching;
        true
    }

    /// Queue a call in the bucket matching its kind
    pub fn enqueue(&mut self, call: Call) {
        if call.is_notification() {
            self.notifications.push(call);
        } else {
            self.calls.push(call);
        }
    }

    /// Number of queued calls and notifications
    pub fn len(&self) -> usize {
        self.calls.len() + self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything queued for a commit and return to idle
    ///
    /// Calls expecting a response come first, then notifications. Returns
    /// `None` when idle or when nothing was queued.
    pub fn take(&mut self) -> Option<Vec<Call>> {
        if !self.is_batching() {
            return None;
        }
        self.state = BatchState::Idle;

        let mut batch = std::mem::take(&mut self.calls);
        batch.append(&mut self.notifications);
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }

    /// Drop everything queued without sending and return to idle
    ///
    /// Returns the number of discarded entries.
    pub fn rollback(&mut self) -> usize {
        let discarded = self.len();
        self.calls.clear();
        self.notifications.clear();
        self.state = BatchState::Idle;
        discarded
    }
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_per_session() {
        let mut first = BatchCoordinator::new();
        let mut second = BatchCoordinator::new();

        assert_eq!(first.create_call("a", None).id, Some(Id::Number(1)));
        assert_eq!(first.create_call("b", None).id, Some(Id::Number(2)));
        assert_eq!(second.create_call("c", None).id, Some(Id::Number(1)));
    }

    #[test]
    fn test_begin_batch_twice() {
        let mut coordinator = BatchCoordinator::new();
        assert!(coordinator.begin_batch());

        let call = coordinator.create_call("a", None);
        coordinator.enqueue(call);

        assert!(!coordinator.begin_batch());
        assert_eq!(coordinator.len(), 1);
        assert!(coordinator.is_batching());
    }

    #[test]
    fn test_take_orders_calls_before_notifications() {
        let mut coordinator = BatchCoordinator::new();
        coordinator.begin_batch();

        coordinator.enqueue(Call::notification("log", None));
        let call = coordinator.create_call("sum", None);
        coordinator.enqueue(call);

        let batch = coordinator.take().unwrap();
        assert_eq!(batch[0].method, "sum");
        assert_eq!(batch[1].method, "log");
        assert_eq!(coordinator.state(), BatchState::Idle);
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_take_when_idle_or_empty() {
        let mut coordinator = BatchCoordinator::new();
        assert!(coordinator.take().is_none());

        coordinator.begin_batch();
        assert!(coordinator.take().is_none());
        assert!(!coordinator.is_batching());
    }

    #[test]
    fn test_rollback_discards_both_buckets() {
        let mut coordinator = BatchCoordinator::new();
        coordinator.begin_batch();
        let call = coordinator.create_call("a", None);
        coordinator.enqueue(call);
        coordinator.enqueue(Call::notification("b", None));

        assert_eq!(coordinator.rollback(), 2);
        assert!(!coordinator.is_batching());

        coordinator.begin_batch();
        assert!(coordinator.take().is_none());
    }

    #[test]
    fn test_ids_keep_counting_across_batches() {
        let mut coordinator = BatchCoordinator::new();
        coordinator.begin_batch();
        let call = coordinator.create_call("a", None);
        coordinator.enqueue(call);
        coordinator.rollback();

        assert_eq!(coordinator.create_call("b", None).id, Some(Id::Number(2)));
    }
}
