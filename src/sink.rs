//! Delivery capabilities the relay publishes through.
//!
//! Handlers and the batch accumulator only depend on these traits; the
//! Firehose and Kafka clients implement them, and tests substitute
//! in-memory recorders.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Accepts one opaque blob per call for a destination.
///
/// A zero-length blob must be accepted as a no-op. Implementations do no
/// batching or retries of their own.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn publish_batch(&self, destination: &str, blob: Bytes) -> Result<()>;
}

/// Publishes exactly one message per call.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<()>;
}
