use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{Error, Result};

const ENV_PREFIX: &str = "CHANGE_RELAY";

/// Process-level settings for the relay binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_region")]
    pub region: String,
    /// Location of the routing document, `s3://bucket/key`.
    pub config_uri: String,
    #[serde(default)]
    pub sink: SinkKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Firehose,
    Bus,
}

/// Routing entry for the Firehose path, keyed by table name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeliveryStreamConfig {
    pub delivery_stream: String,
}

pub type DeliveryStreamRoutes = HashMap<String, DeliveryStreamConfig>;

/// Connection details for the message bus.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BusConfig {
    #[serde(default)]
    pub cluster_id: String,
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StreamConfig {
    pub subject: String,
}

/// Routing document for the message-bus path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusRoutes {
    #[serde(alias = "nats")]
    pub bus: BusConfig,
    #[serde(default)]
    pub streams: HashMap<String, StreamConfig>,
}

impl Settings {
    /// Loads settings from an optional file, `CHANGE_RELAY__*` variables and
    /// the conventional `AWS_DEFAULT_REGION` / `S3_CONFIG` variables, in
    /// increasing order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder().set_default("region", default_region())?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("region", non_empty_var("AWS_DEFAULT_REGION"))?
            .set_override_option("config_uri", non_empty_var("S3_CONFIG"))?
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.config_uri.trim().is_empty() {
            return Err(Error::Config("config_uri must not be empty".to_string()));
        }
        if self.region.trim().is_empty() {
            return Err(Error::Config("region must not be empty".to_string()));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn default_region() -> String {
    "us-west-2".to_string()
}
