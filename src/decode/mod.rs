//! Stream decode pipeline

mod cache;
mod der;
pub mod filters;
mod request;
mod service;
mod types;
mod worker;

pub use cache::StreamCache;
pub use der::DerOutline;
pub use request::{DecodeFault, DecodeRequest, DecodeResponse, RequestId, StructuredDecodeError};
pub use service::{DecodeEvent, DecodeService};
pub use types::*;
pub use worker::{WorkerContext, decode_stream, decode_worker};

use crate::graph::ObjectRef;

/// Default number of decode worker threads
pub const DEFAULT_WORKERS: usize = 2;

/// Largest body handed to the structured decoder (4 MiB)
pub const DEFAULT_STRUCTURED_LIMIT: usize = 4 * 1024 * 1024;

/// Produces the fully decoded bytes of a stream object
pub trait StreamDecoder: Send + Sync {
    fn decode(&self, target: ObjectRef) -> Result<RawStream, DecodeFault>;
}

/// Interprets decoded bytes of structured content, e.g. a signature container
pub trait StructuredDecoder: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<StructuredNode, StructuredDecodeError>;
}
