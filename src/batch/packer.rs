use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};

use super::{encoded_len, DELIMITER};

/// A completed batch: newline-terminated base64 units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub data: Bytes,
    pub units: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Packs encoded units into a buffer bounded by a byte budget.
///
/// The packer never splits a unit. A unit larger than the whole budget is
/// accepted into an empty buffer and forms an over-budget batch on its own.
#[derive(Debug)]
pub struct BatchPacker {
    buf: BytesMut,
    units: usize,
    budget: usize,
}

impl BatchPacker {
    pub fn new(budget: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(budget),
            units: 0,
            budget,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether a record of `raw_len` bytes must start a new batch.
    ///
    /// Counts the delimiter byte, so an accepted unit never pushes a
    /// non-empty buffer past the budget.
    pub fn would_overflow(&self, raw_len: usize) -> bool {
        !self.buf.is_empty() && self.buf.len() + encoded_len(raw_len) + 1 > self.budget
    }

    pub fn append(&mut self, record: &[u8]) {
        self.buf.reserve(encoded_len(record.len()) + 1);
        self.buf.extend_from_slice(STANDARD.encode(record).as_bytes());
        self.buf.extend_from_slice(&[DELIMITER]);
        self.units += 1;
    }

    /// Takes the buffered units, leaving the packer empty.
    pub fn take(&mut self) -> Batch {
        let units = std::mem::take(&mut self.units);
        let data = self.buf.split().freeze();
        self.buf.reserve(self.budget);
        Batch { data, units }
    }
}

/// Decodes a batch blob back into its records, in order.
///
/// Every unit, including the last, is newline-terminated; an empty line is
/// an empty record.
pub fn decode_batch(blob: &[u8]) -> Result<Vec<Vec<u8>>, base64::DecodeError> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }
    let body = blob.strip_suffix(&[DELIMITER]).unwrap_or(blob);
    body.split(|b| *b == DELIMITER)
        .map(|unit| STANDARD.decode(unit))
        .collect()
}
