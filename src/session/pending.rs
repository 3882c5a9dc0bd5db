//! Pending requests
//!
//! The in-flight table and the handle callers wait on.
//!
//! A `send` registers its entry before the frame is written, so a
//! response can never beat its waiter into the table. Entries leave the
//! table exactly once: response arrival, deadline eviction, cancellation,
//! or session teardown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::codec::Response;
use crate::error::{OciError, Result};
use crate::schema::SchemaDef;

/// One in-flight request
pub(crate) struct PendingRequest {
    /// Schema the response will be deserialized against
    pub schema: Arc<SchemaDef>,

    /// Fulfillment channel to the waiting caller
    pub tx: Sender<Result<Response>>,

    /// Past this instant the entry is evicted with a timeout failure
    pub deadline: Instant,
}

/// The shared in-flight table
///
/// Mutated by the send path (insert), the receive path (remove), the
/// sweep (remove) and cancellation (remove); all under one lock.
pub(crate) struct PendingTable {
    inner: Mutex<HashMap<u64, PendingRequest>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Insert an entry and hand back the caller's handle
    pub fn register(
        self: &Arc<Self>,
        correlation_id: u64,
        schema: Arc<SchemaDef>,
        deadline: Instant,
    ) -> ResponseHandle {
        let (tx, rx) = bounded(1);
        self.inner.lock().insert(
            correlation_id,
            PendingRequest {
                schema,
                tx,
                deadline,
            },
        );
        ResponseHandle {
            correlation_id,
            rx,
            table: Arc::clone(self),
        }
    }

    /// Remove an entry, if it is still in flight
    pub fn remove(&self, correlation_id: u64) -> Option<PendingRequest> {
        self.inner.lock().remove(&correlation_id)
    }

    /// Evict every entry past its deadline, fulfilling each waiter with a
    /// timeout failure; returns how many were evicted
    ///
    /// Eviction is mandatory — the table must never grow unboundedly.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let expired: Vec<PendingRequest> = {
            let mut inner = self.inner.lock();
            let ids: Vec<u64> = inner
                .iter()
                .filter(|(_, request)| request.deadline <= now)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| inner.remove(id)).collect()
        };

        let count = expired.len();
        for request in expired {
            let _ = request.tx.send(Ok(Response::timeout()));
        }
        count
    }

    /// Drain the table, failing every waiter with a transport loss;
    /// returns how many were failed
    pub fn fail_all(&self, message: &str) -> usize {
        let drained: Vec<PendingRequest> = {
            let mut inner = self.inner.lock();
            inner.drain().map(|(_, request)| request).collect()
        };

        let count = drained.len();
        for request in drained {
            let _ = request.tx.send(Ok(Response::transport_lost(message)));
        }
        count
    }

    /// Number of requests in flight
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// A caller's handle to one in-flight request
///
/// `send` returns immediately after the frame is written; the suspension
/// happens here, on the caller's side, which is what allows many commands
/// in flight concurrently on one connection.
pub struct ResponseHandle {
    correlation_id: u64,
    rx: Receiver<Result<Response>>,
    table: Arc<PendingTable>,
}

impl ResponseHandle {
    /// The correlation id assigned to this request
    pub fn correlation_id(&self) -> u64 {
        self.correlation_id
    }

    /// Block until the response, timeout eviction, or session teardown
    pub fn wait(&self) -> Result<Response> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(terminated()),
        }
    }

    /// Block up to `timeout`; `None` means still in flight
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<Response>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(terminated())),
        }
    }

    /// Poll without blocking; `None` means still in flight
    pub fn try_wait(&self) -> Option<Result<Response>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(terminated())),
        }
    }

    /// Withdraw the request from the pending table
    ///
    /// Idempotent: cancelling twice, or after fulfillment, is a no-op.
    /// The frame may already be on the wire; a late response is then
    /// discarded as orphaned by the receive loop.
    pub fn cancel(&self) {
        if self.table.remove(self.correlation_id).is_some() {
            tracing::debug!("Cancelled request {}", self.correlation_id);
        }
    }
}

fn terminated() -> OciError {
    OciError::Transport("session terminated before the response was delivered".to_string())
}
