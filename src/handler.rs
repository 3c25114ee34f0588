//! Invocation handlers: one stream event in, published changes out.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::batch::{Accumulator, BATCH_BYTE_BUDGET};
use crate::config::{BusRoutes, Settings, SinkKind};
use crate::dynamodb::{changes, table_name, StreamEvent};
use crate::firehose::FirehoseSink;
use crate::kafka::KafkaProducer;
use crate::routing::{
    load_yaml, DeliveryStreamResolver, DestinationResolver, S3ConfigSource, StaticRoutes,
};
use crate::sink::{BatchSink, MessageSink};
use crate::{Error, Result};

/// Outcome of a successful invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationSummary {
    /// Change records handed to the sink.
    pub records: usize,
    /// Sink calls made.
    pub publishes: usize,
}

/// Forwards changes to a delivery stream in byte-bounded batches.
pub struct BatchedHandler<R: ?Sized, S: ?Sized> {
    resolver: Arc<R>,
    sink: Arc<S>,
    budget: usize,
}

impl<R, S> BatchedHandler<R, S>
where
    R: DestinationResolver + ?Sized,
    S: BatchSink + ?Sized + 'static,
{
    pub fn new(resolver: Arc<R>, sink: Arc<S>) -> Self {
        Self {
            resolver,
            sink,
            budget: BATCH_BYTE_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    #[instrument(skip_all, fields(stream_records = event.records.len()))]
    pub async fn handle(&self, event: &StreamEvent) -> Result<InvocationSummary> {
        let Some(first) = event.records.first() else {
            return Ok(InvocationSummary::default());
        };

        let table = table_name(&first.event_source_arn)?;
        let destination = self.resolver.resolve(&table).await?;

        let pipeline = Accumulator::new(self.sink.clone(), destination.clone())
            .with_budget(self.budget)
            .start();

        let mut count = 0;
        for record in &event.records {
            let extracted = match changes(record) {
                Ok(extracted) => extracted,
                Err(e) => {
                    if let Err(outcome) = pipeline.cancel().await {
                        debug!("Accumulator stopped: {}", outcome);
                    }
                    return Err(e);
                }
            };

            for change in extracted {
                if pipeline.send(change.data).await.is_err() {
                    // The accumulator has stopped; its result says why.
                    return Err(pipeline.finish().await.err().unwrap_or(Error::PipelineClosed));
                }
                count += 1;
            }
        }

        let report = pipeline.finish().await?;
        info!(
            %table,
            %destination,
            batches = report.batches,
            bytes = report.bytes,
            "Successfully published {} events",
            count
        );

        Ok(InvocationSummary {
            records: count,
            publishes: report.batches,
        })
    }
}

/// Forwards every change as its own message.
pub struct UnbatchedHandler<R: ?Sized, M: ?Sized> {
    resolver: Arc<R>,
    sink: Arc<M>,
}

impl<R, M> UnbatchedHandler<R, M>
where
    R: DestinationResolver + ?Sized,
    M: MessageSink + ?Sized,
{
    pub fn new(resolver: Arc<R>, sink: Arc<M>) -> Self {
        Self { resolver, sink }
    }

    #[instrument(skip_all, fields(stream_records = event.records.len()))]
    pub async fn handle(&self, event: &StreamEvent) -> Result<InvocationSummary> {
        let Some(first) = event.records.first() else {
            return Ok(InvocationSummary::default());
        };

        let table = table_name(&first.event_source_arn)?;
        let subject = self.resolver.resolve(&table).await?;

        let mut count = 0;
        for record in &event.records {
            for change in changes(record)? {
                self.sink.publish(&subject, change.data).await?;
                count += 1;
            }
        }

        info!(%table, %subject, "Successfully published {} events", count);
        Ok(InvocationSummary {
            records: count,
            publishes: count,
        })
    }
}

/// The handler selected by the process settings.
pub enum Relay {
    Firehose(BatchedHandler<dyn DestinationResolver, dyn BatchSink>),
    Bus(UnbatchedHandler<dyn DestinationResolver, dyn MessageSink>),
}

impl Relay {
    /// Builds AWS clients for the configured region and wires the handler.
    ///
    /// The bus path reads its routing document and connects once here; the
    /// Firehose path re-reads routing on every invocation.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()))
            .load()
            .await;
        let source = Arc::new(S3ConfigSource::from_conf(&sdk_config));

        match settings.sink {
            SinkKind::Firehose => {
                let resolver: Arc<dyn DestinationResolver> =
                    Arc::new(DeliveryStreamResolver::new(source, settings.config_uri.clone()));
                let sink: Arc<dyn BatchSink> = Arc::new(FirehoseSink::from_conf(&sdk_config));
                Ok(Relay::Firehose(BatchedHandler::new(resolver, sink)))
            }
            SinkKind::Bus => {
                let routes: BusRoutes = load_yaml(source.as_ref(), &settings.config_uri).await?;
                let producer = KafkaProducer::connect(&routes.bus).await?;

                let resolver: Arc<dyn DestinationResolver> = Arc::new(StaticRoutes::from(&routes));
                let sink: Arc<dyn MessageSink> = Arc::new(producer);
                Ok(Relay::Bus(UnbatchedHandler::new(resolver, sink)))
            }
        }
    }

    pub async fn handle(&self, event: &StreamEvent) -> Result<InvocationSummary> {
        match self {
            Relay::Firehose(handler) => handler.handle(event).await,
            Relay::Bus(handler) => handler.handle(event).await,
        }
    }
}
