//! Decode request and response types

use std::sync::Arc;

use super::types::{DecodedStream, StreamContent};
use crate::graph::ObjectRef;

/// Unique identifier for decode requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to decode workers
#[derive(Debug)]
pub enum DecodeRequest {
    /// Decode a stream body and, for structured content, interpret it
    Decode {
        id: RequestId,
        target: ObjectRef,
        content: StreamContent,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Response from decode workers
#[derive(Debug)]
pub enum DecodeResponse {
    /// Final result, success or failure
    Decoded {
        id: RequestId,
        stream: Arc<DecodedStream>,
    },

    /// The owning document was closed before the result could be delivered
    Abandoned(RequestId),
}

/// Failure to obtain a stream's raw bytes
#[derive(Debug, thiserror::Error)]
pub enum DecodeFault {
    #[error("object {0} does not exist")]
    Missing(ObjectRef),

    #[error("object {0} is not a stream")]
    NotAStream(ObjectRef),

    #[error("unsupported filter /{0}")]
    UnsupportedFilter(String),

    #[error("corrupt /{filter} data: {detail}")]
    Corrupt { filter: String, detail: String },
}

/// Failure of the structured (ASN.1) interpretation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuredDecodeError {
    #[error("no data")]
    Empty,

    #[error("truncated element at offset {offset}")]
    Truncated { offset: usize },

    #[error("unsupported length encoding at offset {offset}")]
    BadLength { offset: usize },

    #[error("nesting deeper than {limit} levels at offset {offset}")]
    TooDeep { offset: usize, limit: usize },

    #[error("{size} bytes exceeds the structured decode limit of {limit}")]
    TooLarge { size: usize, limit: usize },
}
