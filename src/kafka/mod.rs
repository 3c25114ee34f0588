pub mod producer;
pub mod url;


pub use producer::{client_config, KafkaProducer};
pub use url::{connection_url, endpoints, Endpoint};
