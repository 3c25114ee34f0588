//! Error types and result handling for change-relay.
//!
//! This module defines the main error type [`Error`] and a convenience
//! [`Result`] type alias used throughout the crate.
//!
//! # Example
//!
//! ```rust
//! use change_relay::{Error, Result};
//!
//! fn resolve(table: &str) -> Result<String> {
//!     Err(Error::NoDestination { table: table.to_string() })
//! }
//!
//! match resolve("orders") {
//!     Ok(stream) => println!("Publishing to {}", stream),
//!     Err(Error::NoDestination { table }) => eprintln!("No route for {}", table),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for change-relay operations.
///
/// Every failure of an invocation, from loading routing configuration to a
/// sink rejecting a batch, is reported through this enum so that the entry
/// point only ever sees a single terminal value.
#[derive(Error, Debug)]
pub enum Error {
    /// Runtime settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings could not be assembled from file and environment.
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Object-store URI did not have the `s3://bucket/key` shape.
    #[error("invalid s3 uri, {0}.  expected s3://bucket/path")]
    InvalidUri(String),

    /// The object store could not return the configuration document.
    #[error("unable to retrieve content from s3 uri, {uri}: {message}")]
    ObjectStore {
        /// URI that was requested
        uri: String,
        /// Description of the fetch failure
        message: String,
    },

    /// The configuration document was fetched but is not valid YAML for the
    /// expected shape.
    #[error("unable read config from s3 uri, {uri}: {source}")]
    ConfigParse {
        /// URI the document was read from
        uri: String,
        /// Underlying YAML error
        source: serde_yaml::Error,
    },

    /// The event source ARN does not name a DynamoDB table stream.
    #[error("unable to determine table name from event source arn, {0}")]
    InvalidArn(String),

    /// The routing configuration has no entry for the table.
    #[error("no destination defined for table, {table}")]
    NoDestination {
        /// Table name extracted from the event source ARN
        table: String,
    },

    /// The message bus could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A message-bus endpoint could not be parsed.
    #[error("invalid bus url, {0}")]
    InvalidBusUrl(String),

    /// A stream record could not be turned into change records.
    #[error("unable to detect changes from item: {message}")]
    Extraction {
        /// Description of what was invalid
        message: String,
    },

    /// The event payload is not valid JSON for a stream event.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A sink rejected a batch or message.
    #[error("unable to publish content to {destination}: {message}")]
    Publish {
        /// Delivery stream or subject the content was addressed to
        destination: String,
        /// Description of the rejection
        message: String,
    },

    /// Kafka client or producer error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// I/O error, typically from reading the event payload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The accumulator was told to stop before its input was closed.
    ///
    /// The partial batch it held was discarded.
    #[error("batch accumulator cancelled")]
    Cancelled,

    /// The accumulator stopped accepting records.
    ///
    /// Returned by the producer side when the consumer has already
    /// terminated; the terminal error is available from the result channel.
    #[error("batch accumulator is no longer accepting records")]
    PipelineClosed,

    /// The accumulator task ended without reporting a result.
    #[error("batch accumulator stopped without reporting a result")]
    AccumulatorLost,
}

/// A convenient Result type alias for change-relay operations.
///
/// This is equivalent to `std::result::Result<T, change_relay::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
