//! Matches fire-and-forget requests to their eventually-arriving responses.
//!
//! One table, one lock: correlation id → pending oneshot sender. `submit`
//! allocates the id, registers the sender and forwards the envelope; the
//! dispatcher feeds responses back through [`RequestCorrelator::resolve`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::oneshot;

use crate::adapter::{ProtocolAdapter, Request, RequestEnvelope, Response};
use crate::errors::RpcError;

/// The outcome a pending request resolves to.
pub(crate) type RequestResult = Result<Response, RpcError>;

/// Awaitable handle for one submitted request.
///
/// Receiving `Err(RecvError)` means the request was abandoned at shutdown —
/// the caller-facing rendering of that is [`crate::ClientError::Dropped`].
pub(crate) type ResponseHandle = oneshot::Receiver<RequestResult>;

pub(crate) struct RequestCorrelator {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<RequestResult>>>,
    closed:  AtomicBool,
}

impl RequestCorrelator {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
            closed:  AtomicBool::new(false),
        }
    }

    /// Allocate a fresh correlation id, register a pending entry and forward
    /// the request. Never blocks the calling context.
    ///
    /// After [`RequestCorrelator::abandon_all`] nothing is registered or
    /// forwarded any more; the returned handle resolves as dropped right
    /// away instead of waiting on a response that can never arrive.
    pub(crate) fn submit(&self, adapter: &dyn ProtocolAdapter, request: Request) -> ResponseHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            // Checked under the pending lock; abandon_all flips the flag
            // while holding it, so no entry can slip in after the sweep.
            if self.closed.load(Ordering::SeqCst) {
                tracing::debug!("req #{id} refused: correlator is closed");
                drop(tx);
                return rx;
            }
            let previous = pending.insert(id, tx);
            debug_assert!(previous.is_none(), "correlation id {id} reused");
        }
        tracing::debug!("→ req #{id}: {request:?}");
        adapter.send(RequestEnvelope { id, request });
        rx
    }

    /// Resolve the pending request with this id.
    ///
    /// A response for an unknown id (already resolved, or never issued) is an
    /// adapter anomaly: logged and discarded, never propagated.
    pub(crate) fn resolve(&self, id: u64, result: RequestResult) {
        let tx = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(&id)
        };
        match tx {
            // The receiver may have been dropped by an uninterested caller;
            // that is fine, the entry is gone either way.
            Some(tx) => { let _ = tx.send(result); }
            None => tracing::warn!("response for unknown correlation id {id} — discarded"),
        }
    }

    /// Drop every pending entry and refuse all future registrations.
    /// Awaiting callers observe a closed channel.
    pub(crate) fn abandon_all(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        self.closed.store(true, Ordering::SeqCst);
        let n = pending.len();
        pending.clear();
        if n > 0 {
            tracing::info!("abandoned {n} pending request(s) at shutdown");
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Adapter double that remembers every envelope it was given.
    struct RecordingAdapter {
        sent: Mutex<Vec<RequestEnvelope>>,
    }

    impl RecordingAdapter {
        fn new() -> Self {
            Self { sent: Mutex::new(Vec::new()) }
        }
    }

    impl ProtocolAdapter for RecordingAdapter {
        fn send(&self, envelope: RequestEnvelope) {
            self.sent.lock().unwrap().push(envelope);
        }
        fn close(&self) {}
    }

    #[tokio::test]
    async fn ids_are_unique_and_strictly_increasing() {
        let correlator = Arc::new(RequestCorrelator::new());
        let adapter = RecordingAdapter::new();

        for _ in 0..100 {
            let _rx = correlator.submit(&adapter, Request::LoadChats { limit: 50 });
        }

        let sent = adapter.sent.lock().unwrap();
        assert_eq!(sent.len(), 100);
        for (i, env) in sent.iter().enumerate() {
            assert_eq!(env.id, i as u64);
        }
    }

    #[tokio::test]
    async fn response_resolves_exactly_one_handle() {
        let correlator = RequestCorrelator::new();
        let adapter = RecordingAdapter::new();

        let rx_a = correlator.submit(&adapter, Request::LoadChats { limit: 1 });
        let rx_b = correlator.submit(&adapter, Request::LoadChats { limit: 2 });

        correlator.resolve(1, Ok(Response::Ok));
        assert_eq!(rx_b.await.unwrap(), Ok(Response::Ok));
        assert_eq!(correlator.pending_count(), 1);

        correlator.resolve(0, Err(RpcError::new(420, "FLOOD_WAIT")));
        assert!(rx_a.await.unwrap().is_err());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn unknown_id_is_discarded() {
        let correlator = RequestCorrelator::new();
        // Never issued — must not panic.
        correlator.resolve(999, Ok(Response::Ok));
    }

    #[tokio::test]
    async fn abandon_all_closes_pending_handles() {
        let correlator = RequestCorrelator::new();
        let adapter = RecordingAdapter::new();

        let rx = correlator.submit(&adapter, Request::GetChatHistory {
            chat_id: 42, from_message_id: 0, limit: 10,
        });
        correlator.abandon_all();
        assert!(rx.await.is_err(), "abandoned handle must observe a closed channel");
    }

    #[tokio::test]
    async fn late_submit_after_abandon_registers_nothing() {
        // A task may race the shutdown path and reach submit only after the
        // table was swept. Its handle must resolve right away, with no entry
        // left pending and nothing forwarded to the adapter.
        let correlator = RequestCorrelator::new();
        let adapter = RecordingAdapter::new();

        correlator.abandon_all();
        let rx = correlator.submit(&adapter, Request::LoadChats { limit: 1 });

        assert!(rx.await.is_err(), "late handle must resolve as dropped, not hang");
        assert_eq!(correlator.pending_count(), 0);
        assert!(adapter.sent.lock().unwrap().is_empty());
    }
}
