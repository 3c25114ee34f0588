pub mod batch;
pub mod config;
pub mod error;
pub mod handler;
pub mod sink;

pub mod dynamodb;
pub mod firehose;
pub mod kafka;
pub mod routing;

pub use config::Settings;
pub use error::{Error, Result};
pub use handler::{BatchedHandler, InvocationSummary, Relay, UnbatchedHandler};
