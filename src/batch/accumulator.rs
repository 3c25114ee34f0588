use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::packer::BatchPacker;
use super::{BATCH_BYTE_BUDGET, CHANNEL_CAPACITY};
use crate::sink::BatchSink;
use crate::{Error, Result};

/// Totals for a successful accumulator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Publish calls made, including the final one.
    pub batches: usize,
    pub records: usize,
    pub bytes: usize,
}

/// Packs records into byte-bounded batches for one destination.
pub struct Accumulator<S: ?Sized> {
    sink: Arc<S>,
    destination: String,
    budget: usize,
    capacity: usize,
}

impl<S: BatchSink + ?Sized + 'static> Accumulator<S> {
    pub fn new(sink: Arc<S>, destination: impl Into<String>) -> Self {
        Self {
            sink,
            destination: destination.into(),
            budget: BATCH_BYTE_BUDGET,
            capacity: CHANNEL_CAPACITY,
        }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Spawns the accumulator task and returns the producer side.
    pub fn start(self) -> BatchPipeline {
        let (tx, mut rx) = mpsc::channel(self.capacity);
        let (result_tx, result_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let outcome = self.run(&mut rx, token).await;
            if outcome.is_err() {
                discard(&mut rx);
            }
            // The receiver may already be gone if the producer gave up.
            let _ = result_tx.send(outcome);
        });

        BatchPipeline {
            tx,
            result: result_rx,
            cancel,
        }
    }

    async fn run(
        &self,
        rx: &mut mpsc::Receiver<Bytes>,
        cancel: CancellationToken,
    ) -> Result<BatchReport> {
        let mut packer = BatchPacker::new(self.budget);
        let mut report = BatchReport::default();

        loop {
            let record = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(
                        destination = %self.destination,
                        pending_bytes = packer.len(),
                        "Accumulator cancelled, dropping partial batch"
                    );
                    return Err(Error::Cancelled);
                }
                record = rx.recv() => record,
            };

            let Some(record) = record else {
                break;
            };

            if packer.would_overflow(record.len()) {
                self.flush(&mut packer, &mut report).await?;
            }
            packer.append(&record);
            report.records += 1;
        }

        // Always flush once at end of input, even when nothing is buffered.
        self.flush(&mut packer, &mut report).await?;
        Ok(report)
    }

    async fn flush(&self, packer: &mut BatchPacker, report: &mut BatchReport) -> Result<()> {
        let batch = packer.take();
        if batch.len() > self.budget {
            debug!(
                destination = %self.destination,
                bytes = batch.len(),
                budget = self.budget,
                "Publishing over-budget single-record batch"
            );
        }
        trace!(
            destination = %self.destination,
            units = batch.units,
            bytes = batch.len(),
            "Publishing batch"
        );

        let bytes = batch.len();
        if let Err(e) = self.sink.publish_batch(&self.destination, batch.data).await {
            error!(
                destination = %self.destination,
                batches_published = report.batches,
                "Batch publish failed: {}",
                e
            );
            return Err(e);
        }

        report.batches += 1;
        report.bytes += bytes;
        Ok(())
    }
}

/// Closes the input and throws away whatever is still queued, so a producer
/// blocked on a full channel is released.
fn discard(rx: &mut mpsc::Receiver<Bytes>) {
    rx.close();
    let mut discarded = 0usize;
    while rx.try_recv().is_ok() {
        discarded += 1;
    }
    if discarded > 0 {
        warn!(discarded, "Discarded queued records after accumulator failure");
    }
}

/// Producer side of a running accumulator.
pub struct BatchPipeline {
    tx: mpsc::Sender<Bytes>,
    result: oneshot::Receiver<Result<BatchReport>>,
    cancel: CancellationToken,
}

impl BatchPipeline {
    /// Queues a record, waiting while the channel is full.
    ///
    /// Fails with [`Error::PipelineClosed`] once the accumulator has stopped;
    /// the reason is then available from [`finish`](Self::finish).
    pub async fn send(&self, record: impl Into<Bytes>) -> Result<()> {
        self.tx
            .send(record.into())
            .await
            .map_err(|_| Error::PipelineClosed)
    }

    /// Closes the input and waits for the terminal result.
    pub async fn finish(self) -> Result<BatchReport> {
        let Self { tx, result, .. } = self;
        drop(tx);
        result.await.map_err(|_| Error::AccumulatorLost)?
    }

    /// Stops the accumulator without flushing its partial batch.
    pub async fn cancel(self) -> Result<BatchReport> {
        self.cancel.cancel();
        self.finish().await
    }
}
