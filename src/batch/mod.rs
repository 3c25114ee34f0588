//! Size-bounded batching of change records.
//!
//! Records flow from the invocation handler through a bounded channel into a
//! single accumulator task. The accumulator base64-encodes each record,
//! packs newline-terminated units into buffers of at most
//! [`BATCH_BYTE_BUDGET`] bytes, and publishes each completed buffer to a
//! [`BatchSink`](crate::sink::BatchSink) in arrival order. The outcome is
//! reported once, on a single-slot result channel.

pub mod accumulator;
pub mod packer;


pub use accumulator::{Accumulator, BatchPipeline, BatchReport};
pub use packer::{decode_batch, Batch, BatchPacker};

/// Maximum bytes per published batch.
pub const BATCH_BYTE_BUDGET: usize = 999;

/// Capacity of the channel between the handler and the accumulator.
pub const CHANNEL_CAPACITY: usize = 32;

/// Terminates every encoded unit.
pub const DELIMITER: u8 = b'\n';

/// Length of the padded standard base64 encoding of `raw_len` bytes.
pub const fn encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}
