use async_trait::async_trait;
use bytes::Bytes;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::url::endpoints;
use crate::config::BusConfig;
use crate::sink::MessageSink;
use crate::{Error, Result};

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Publishes one Kafka message per change record.
pub struct KafkaProducer {
    producer: FutureProducer,
    cluster_id: String,
}

impl KafkaProducer {
    pub fn new(config: &BusConfig) -> Result<Self> {
        let producer: FutureProducer = client_config(config)?.create()?;

        Ok(Self {
            producer,
            cluster_id: config.cluster_id.clone(),
        })
    }

    /// Creates the producer and waits until the cluster answers a metadata
    /// request.
    pub async fn connect(config: &BusConfig) -> Result<Self> {
        let producer = Self::new(config)?;
        info!(cluster_id = %producer.cluster_id, "Attempting to connect to bus cluster");

        let probe = producer.producer.clone();
        let brokers = tokio::task::spawn_blocking(move || {
            probe
                .client()
                .fetch_metadata(None, METADATA_TIMEOUT)
                .map(|metadata| metadata.brokers().len())
        })
        .await
        .map_err(|e| Error::Connection(format!("metadata probe failed: {}", e)))?
        .map_err(|e| {
            Error::Connection(format!(
                "unable to connect to bus cluster, {}: {}",
                producer.cluster_id, e
            ))
        })?;

        info!(cluster_id = %producer.cluster_id, brokers, "Successfully connected to bus cluster");
        Ok(producer)
    }
}

/// librdkafka settings for a bus configuration.
pub fn client_config(config: &BusConfig) -> Result<ClientConfig> {
    let endpoints = endpoints(config)?;
    let bootstrap = endpoints
        .iter()
        .map(|e| e.address())
        .collect::<Vec<_>>()
        .join(",");
    let tls = endpoints.iter().any(|e| e.is_tls());

    let client_id = if config.cluster_id.is_empty() {
        format!("change-relay-{}", std::process::id())
    } else {
        format!("{}-{}", config.cluster_id, std::process::id())
    };

    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", bootstrap)
        .set("client.id", client_id)
        .set("acks", "all")
        .set("enable.idempotence", "true");

    match endpoints.iter().find_map(|e| e.credentials()) {
        Some((username, password)) => {
            client
                .set("security.protocol", if tls { "SASL_SSL" } else { "SASL_PLAINTEXT" })
                .set("sasl.mechanisms", "PLAIN")
                .set("sasl.username", username)
                .set("sasl.password", password);
        }
        None if tls => {
            client.set("security.protocol", "SSL");
        }
        None => {}
    }

    Ok(client)
}

#[async_trait]
impl MessageSink for KafkaProducer {
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<()> {
        let record = FutureRecord::<(), [u8]>::to(subject).payload(&payload[..]);

        let (partition, offset) = self
            .producer
            .send(record, rdkafka::util::Timeout::Never)
            .await
            .map_err(|(e, _)| Error::Publish {
                destination: subject.to_string(),
                message: e.to_string(),
            })?;

        debug!(partition, offset, "Published change record");
        Ok(())
    }
}
