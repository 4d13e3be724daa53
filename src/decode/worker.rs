//! Stream decode worker - runs in separate thread(s)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::cache::StreamCache;
use super::request::{DecodeRequest, DecodeResponse, RequestId, StructuredDecodeError};
use super::types::{DecodeStatus, DecodedStream, StreamContent, Structured};
use super::{StreamDecoder, StructuredDecoder};
use crate::graph::ObjectRef;

/// Everything a worker needs, shared between all workers of one document
#[derive(Clone)]
pub struct WorkerContext {
    pub decoder: Arc<dyn StreamDecoder>,
    pub structured: Arc<dyn StructuredDecoder>,
    /// Bodies larger than this are not handed to the structured decoder
    pub structured_limit: usize,
    pub cache: Arc<Mutex<StreamCache>>,
    /// Set when the owning document closes
    pub abandoned: Arc<AtomicBool>,
}

/// Main worker function - runs in a dedicated thread
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn decode_worker(
    ctx: WorkerContext,
    requests: Receiver<DecodeRequest>,
    responses: Sender<DecodeResponse>,
) {
    for request in requests {
        match request {
            DecodeRequest::Decode {
                id,
                target,
                content,
            } => {
                handle_decode_request(&ctx, id, target, content, &responses);
            }

            DecodeRequest::Shutdown => break,
        }
    }
}

fn handle_decode_request(
    ctx: &WorkerContext,
    id: RequestId,
    target: ObjectRef,
    content: StreamContent,
    responses: &Sender<DecodeResponse>,
) {
    if ctx.abandoned.load(Ordering::Acquire) {
        let _ = responses.send(DecodeResponse::Abandoned(id));
        return;
    }

    let cached = ctx
        .cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&target);
    if let Some(stream) = cached {
        let _ = responses.send(DecodeResponse::Decoded { id, stream });
        return;
    }

    let decoded = decode_stream(
        ctx.decoder.as_ref(),
        ctx.structured.as_ref(),
        ctx.structured_limit,
        target,
        content,
    );

    // The flag is set under the cache lock, so a closed document never
    // gains entries after close returns
    let stream = {
        let mut cache = ctx
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if ctx.abandoned.load(Ordering::Acquire) {
            None
        } else {
            Some(cache.insert(decoded))
        }
    };
    let response = match stream {
        Some(stream) => DecodeResponse::Decoded { id, stream },
        None => DecodeResponse::Abandoned(id),
    };
    let _ = responses.send(response);
}

/// Decode one stream synchronously.
///
/// Raw bytes come from `decoder`; a failure there is the only way to end up
/// with [`DecodeStatus::Failed`]. For structured content the raw bytes are
/// then passed to `structured`, whose failure is recorded next to the bytes.
#[must_use]
pub fn decode_stream(
    decoder: &dyn StreamDecoder,
    structured: &dyn StructuredDecoder,
    structured_limit: usize,
    target: ObjectRef,
    content: StreamContent,
) -> DecodedStream {
    let raw = match decoder.decode(target) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to decode stream {target}: {e}");
            return DecodedStream::failed(target, content, e.to_string());
        }
    };

    let structured = if !content.is_structured() {
        Structured::NotApplicable
    } else if raw.data.len() > structured_limit {
        Structured::Failed(
            StructuredDecodeError::TooLarge {
                size: raw.data.len(),
                limit: structured_limit,
            }
            .to_string(),
        )
    } else {
        match structured.parse(&raw.data) {
            Ok(tree) => Structured::Parsed(tree),
            Err(e) => {
                warn!("Structured decode of {target} failed: {e}");
                Structured::Failed(e.to_string())
            }
        }
    };

    debug!(
        "Decoded {target}: {} bytes, filters {:?}",
        raw.data.len(),
        raw.filters
    );

    DecodedStream {
        target,
        content,
        status: DecodeStatus::Success,
        raw: raw.data,
        filters: raw.filters,
        structured,
    }
}
