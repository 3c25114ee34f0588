//! Resolution of a source table to the destination its changes go to.

pub mod object_store;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::{BusRoutes, DeliveryStreamRoutes};
use crate::{Error, Result};

pub use object_store::{load_yaml, ConfigSource, ObjectUri, S3ConfigSource};

/// Maps a table name to a delivery stream name or subject.
#[async_trait]
pub trait DestinationResolver: Send + Sync {
    async fn resolve(&self, table: &str) -> Result<String>;
}

/// Resolves Firehose delivery streams from a routing document that is read
/// afresh on every lookup, so edits take effect without a redeploy.
pub struct DeliveryStreamResolver<C: ?Sized> {
    source: Arc<C>,
    uri: String,
}

impl<C: ConfigSource + ?Sized> DeliveryStreamResolver<C> {
    pub fn new(source: Arc<C>, uri: impl Into<String>) -> Self {
        Self {
            source,
            uri: uri.into(),
        }
    }
}

#[async_trait]
impl<C: ConfigSource + ?Sized> DestinationResolver for DeliveryStreamResolver<C> {
    async fn resolve(&self, table: &str) -> Result<String> {
        let routes: DeliveryStreamRoutes = load_yaml(self.source.as_ref(), &self.uri).await?;

        let route = routes.get(table).ok_or_else(|| Error::NoDestination {
            table: table.to_string(),
        })?;
        debug!(table, delivery_stream = %route.delivery_stream, "Resolved delivery stream");
        Ok(route.delivery_stream.clone())
    }
}

/// Fixed table to subject mapping, loaded once at start-up.
#[derive(Debug, Clone, Default)]
pub struct StaticRoutes {
    routes: HashMap<String, String>,
}

impl StaticRoutes {
    pub fn new(routes: HashMap<String, String>) -> Self {
        Self { routes }
    }
}

impl From<&BusRoutes> for StaticRoutes {
    fn from(config: &BusRoutes) -> Self {
        Self::new(
            config
                .streams
                .iter()
                .map(|(table, stream)| (table.clone(), stream.subject.clone()))
                .collect(),
        )
    }
}

#[async_trait]
impl DestinationResolver for StaticRoutes {
    async fn resolve(&self, table: &str) -> Result<String> {
        self.routes
            .get(table)
            .cloned()
            .ok_or_else(|| Error::NoDestination {
                table: table.to_string(),
            })
    }
}
