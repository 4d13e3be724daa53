//! Decode service - manages worker pool, in-flight requests and cache

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};

use super::cache::StreamCache;
use super::request::{DecodeRequest, DecodeResponse, RequestId};
use super::types::{DecodedStream, StreamContent};
use super::worker::{WorkerContext, decode_worker};
use super::{
    DEFAULT_STRUCTURED_LIMIT, DEFAULT_WORKERS, DerOutline, StreamDecoder, StructuredDecoder,
};
use crate::graph::ObjectRef;

/// A decode that finished since the last poll
#[derive(Clone, Debug)]
pub struct DecodeEvent {
    pub target: ObjectRef,
    pub stream: Arc<DecodedStream>,
}

struct InFlight {
    id: RequestId,
    /// Handed out to every caller that joins this request
    pending: Arc<DecodedStream>,
}

/// Decodes stream objects of one document on worker threads.
///
/// At most one decode runs per [`ObjectRef`]; repeated requests join the
/// running one and later requests are answered from the cache.
pub struct DecodeService {
    request_tx: Sender<DecodeRequest>,
    response_rx: Receiver<DecodeResponse>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, ObjectRef>,
    in_flight: HashMap<ObjectRef, InFlight>,
    cache: Arc<Mutex<StreamCache>>,
    abandoned: Arc<AtomicBool>,
    num_workers: usize,
    closed: bool,
}

impl DecodeService {
    /// Create a service with the default worker count and DER outline decoder
    #[must_use]
    pub fn new(decoder: Arc<dyn StreamDecoder>) -> Self {
        Self::with_config(
            decoder,
            Arc::new(DerOutline),
            DEFAULT_WORKERS,
            DEFAULT_STRUCTURED_LIMIT,
        )
    }

    #[must_use]
    pub fn with_config(
        decoder: Arc<dyn StreamDecoder>,
        structured: Arc<dyn StructuredDecoder>,
        num_workers: usize,
        structured_limit: usize,
    ) -> Self {
        let cache = Arc::new(Mutex::new(StreamCache::new()));
        let abandoned = Arc::new(AtomicBool::new(false));

        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let ctx = WorkerContext {
            decoder,
            structured,
            structured_limit,
            cache: Arc::clone(&cache),
            abandoned: Arc::clone(&abandoned),
        };

        for _ in 0..num_workers.max(1) {
            let ctx = ctx.clone();
            let rx = request_rx.clone();
            let tx = response_tx.clone();

            std::thread::spawn(move || {
                decode_worker(ctx, rx, tx);
            });
        }

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            pending_requests: HashMap::new(),
            in_flight: HashMap::new(),
            cache,
            abandoned,
            num_workers: num_workers.max(1),
            closed: false,
        }
    }

    /// Request the decoded form of `target`.
    ///
    /// Returns the cached result when there is one. Otherwise a pending
    /// snapshot is returned and the final result arrives through [`poll`].
    ///
    /// [`poll`]: Self::poll
    pub fn open(&mut self, target: ObjectRef, content: StreamContent) -> Arc<DecodedStream> {
        if self.closed {
            return Arc::new(DecodedStream::failed(target, content, "document closed"));
        }

        if let Some(stream) = self.cached(target) {
            debug!("Cache hit for {target}");
            return stream;
        }

        if let Some(running) = self.in_flight.get(&target) {
            debug!("Joining in-flight decode of {target}");
            return Arc::clone(&running.pending);
        }

        let id = self.next_id();
        let pending = Arc::new(DecodedStream::pending(target, content));
        debug!("Dispatching decode of {target} as request {}", id.0);

        let _ = self.request_tx.send(DecodeRequest::Decode {
            id,
            target,
            content,
        });
        self.pending_requests.insert(id, target);
        self.in_flight.insert(
            target,
            InFlight {
                id,
                pending: Arc::clone(&pending),
            },
        );

        pending
    }

    /// Drain finished decodes without blocking
    pub fn poll(&mut self) -> Vec<DecodeEvent> {
        let mut events = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response, &mut events);
        }
        events
    }

    /// Block until no decode is in flight or `timeout` passes.
    ///
    /// Returns every event received while waiting.
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<DecodeEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.poll();

        while !self.pending_requests.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.response_rx.recv_timeout(remaining) {
                Ok(response) => self.handle_response(response, &mut events),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }

        events
    }

    fn handle_response(&mut self, response: DecodeResponse, events: &mut Vec<DecodeEvent>) {
        match response {
            DecodeResponse::Decoded { id, stream } => {
                let Some(target) = self.pending_requests.remove(&id) else {
                    return;
                };
                if self.in_flight.get(&target).is_some_and(|r| r.id == id) {
                    self.in_flight.remove(&target);
                }
                events.push(DecodeEvent { target, stream });
            }
            DecodeResponse::Abandoned(id) => {
                if let Some(target) = self.pending_requests.remove(&id) {
                    self.in_flight.remove(&target);
                }
            }
        }
    }

    /// Cached result for `target`, if its decode has finished
    #[must_use]
    pub fn cached(&self, target: ObjectRef) -> Option<Arc<DecodedStream>> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&target)
    }

    #[must_use]
    pub fn is_in_flight(&self, target: ObjectRef) -> bool {
        self.in_flight.contains_key(&target)
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_requests.is_empty()
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Abandon all pending decodes and stop the workers.
    ///
    /// Results of abandoned decodes are discarded and never cached.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        info!(
            "Closing decode service, abandoning {} pending decodes",
            self.pending_requests.len()
        );
        {
            let _cache = self
                .cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            self.abandoned.store(true, Ordering::Release);
        }
        self.closed = true;
        self.pending_requests.clear();
        self.in_flight.clear();
        while self.response_rx.try_recv().is_ok() {}
        self.shutdown();
    }

    fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(DecodeRequest::Shutdown);
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for DecodeService {
    fn drop(&mut self) {
        if !self.closed {
            self.abandoned.store(true, Ordering::Release);
            self.shutdown();
        }
    }
}
