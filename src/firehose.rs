use async_trait::async_trait;
use aws_sdk_firehose::error::DisplayErrorContext;
use aws_sdk_firehose::primitives::Blob;
use aws_sdk_firehose::types::Record;
use aws_sdk_firehose::Client;
use bytes::Bytes;
use tracing::{debug, instrument};

use crate::sink::BatchSink;
use crate::{Error, Result};

/// Publishes batches as single Firehose records.
#[derive(Clone, Debug)]
pub struct FirehoseSink {
    client: Client,
}

impl FirehoseSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

#[async_trait]
impl BatchSink for FirehoseSink {
    #[instrument(skip(self, blob), fields(bytes = blob.len()))]
    async fn publish_batch(&self, destination: &str, blob: Bytes) -> Result<()> {
        if blob.is_empty() {
            return Ok(());
        }

        let record = Record::builder()
            .data(Blob::new(blob.to_vec()))
            .build()
            .map_err(|e| Error::Publish {
                destination: destination.to_string(),
                message: e.to_string(),
            })?;

        let output = self
            .client
            .put_record()
            .delivery_stream_name(destination)
            .record(record)
            .send()
            .await
            .map_err(|e| Error::Publish {
                destination: destination.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(record_id = %output.record_id(), "Delivered batch to Firehose");
        Ok(())
    }
}
