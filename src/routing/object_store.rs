use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, instrument};

use crate::{Error, Result};

static S3_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^s3://([^/]+)/(.+)$").expect("s3 uri pattern is valid"));

/// Location of an object, parsed from `s3://bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUri {
    pub bucket: String,
    pub key: String,
}

impl ObjectUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let captures = S3_URI
            .captures(uri.trim())
            .ok_or_else(|| Error::InvalidUri(uri.to_string()))?;

        Ok(Self {
            bucket: captures[1].to_string(),
            key: captures[2].to_string(),
        })
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Fetches raw objects from a store.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self, uri: &ObjectUri) -> Result<Vec<u8>>;
}

/// Reads configuration objects from S3.
#[derive(Clone, Debug)]
pub struct S3ConfigSource {
    client: aws_sdk_s3::Client,
}

impl S3ConfigSource {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    pub fn from_conf(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(aws_sdk_s3::Client::new(sdk_config))
    }
}

#[async_trait]
impl ConfigSource for S3ConfigSource {
    #[instrument(skip(self), fields(uri = %uri))]
    async fn fetch(&self, uri: &ObjectUri) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .send()
            .await
            .map_err(|e| Error::ObjectStore {
                uri: uri.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let body = output.body.collect().await.map_err(|e| Error::ObjectStore {
            uri: uri.to_string(),
            message: format!("unable to read content: {}", e),
        })?;

        let data = body.into_bytes().to_vec();
        debug!(bytes = data.len(), "Fetched configuration object");
        Ok(data)
    }
}

/// Fetches the YAML document at `uri` and deserializes it.
///
/// The URI is validated before anything is fetched.
pub async fn load_yaml<T, C>(source: &C, uri: &str) -> Result<T>
where
    T: DeserializeOwned,
    C: ConfigSource + ?Sized,
{
    let object = ObjectUri::parse(uri)?;
    let data = source.fetch(&object).await?;

    serde_yaml::from_slice(&data).map_err(|e| Error::ConfigParse {
        uri: uri.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        content: &'static str,
        fetches: AtomicUsize,
    }

    impl StaticSource {
        fn new(content: &'static str) -> Self {
            Self {
                content,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ConfigSource for StaticSource {
        async fn fetch(&self, uri: &ObjectUri) -> Result<Vec<u8>> {
            assert_eq!(uri.bucket, "sample");
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.content.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_parse_uri() {
        let uri = ObjectUri::parse("s3://sample/config/relay.yaml").unwrap();
        assert_eq!(uri.bucket, "sample");
        assert_eq!(uri.key, "config/relay.yaml");
        assert_eq!(uri.to_string(), "s3://sample/config/relay.yaml");
    }

    #[test]
    fn test_parse_invalid_uri() {
        for uri in ["", "sample/go", "s3://sample", "s3://sample/", "https://sample/go"] {
            let err = ObjectUri::parse(uri).unwrap_err();
            assert!(matches!(err, Error::InvalidUri(_)), "{} should be rejected", uri);
        }
    }

    #[tokio::test]
    async fn test_load_yaml() {
        let source = StaticSource::new(r#"{"hello":"world"}"#);
        let content: HashMap<String, String> = load_yaml(&source, "s3://sample/go").await.unwrap();
        assert_eq!(content, HashMap::from([("hello".to_string(), "world".to_string())]));
    }

    #[tokio::test]
    async fn test_load_yaml_invalid_uri_does_not_fetch() {
        let source = StaticSource::new("hello: world");
        let result: Result<HashMap<String, String>> = load_yaml(&source, "bogus").await;
        assert!(matches!(result, Err(Error::InvalidUri(_))));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_yaml_parse_error() {
        let source = StaticSource::new("- just\n- a list\n");
        let result: Result<HashMap<String, String>> = load_yaml(&source, "s3://sample/go").await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.to_string().contains("s3://sample/go"));
    }
}
