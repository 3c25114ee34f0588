use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::config::BusConfig;
use crate::{Error, Result};

static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-_]*)://(?:([^:@\s]+):([^@\s]+)@)?([^:@\s/]+):(\d+)$")
        .expect("endpoint pattern is valid")
});

/// One broker endpoint, `scheme://[user:pass@]host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn parse(segment: &str) -> Result<Self> {
        let segment = segment.trim();
        let captures = ENDPOINT
            .captures(segment)
            .ok_or_else(|| Error::InvalidBusUrl(segment.to_string()))?;

        let port = captures[5]
            .parse()
            .map_err(|_| Error::InvalidBusUrl(segment.to_string()))?;

        Ok(Self {
            scheme: captures[1].to_string(),
            username: captures.get(2).map(|m| m.as_str().to_string()),
            password: captures.get(3).map(|m| m.as_str().to_string()),
            host: captures[4].to_string(),
            port,
        })
    }

    /// Replaces embedded credentials with configured ones, where set.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        if !username.is_empty() {
            self.username = Some(username.to_string());
        }
        if !password.is_empty() {
            self.password = Some(password.to_string());
        }
        self
    }

    /// Username and password, only when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls(&self) -> bool {
        matches!(
            self.scheme.to_ascii_lowercase().as_str(),
            "ssl" | "tls" | "sasl_ssl" | "kafka+ssl"
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some((username, password)) = self.credentials() {
            write!(f, "{}:{}@", username, password)?;
        }
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Parses the comma-separated endpoint list of a bus configuration,
/// applying the configured credentials to every endpoint.
pub fn endpoints(config: &BusConfig) -> Result<Vec<Endpoint>> {
    config
        .url
        .split(',')
        .map(|segment| {
            Endpoint::parse(segment)
                .map(|e| e.with_credentials(&config.username, &config.password))
        })
        .collect()
}

/// The endpoint list rendered back to a single connection string.
pub fn connection_url(config: &BusConfig) -> Result<String> {
    Ok(endpoints(config)?
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", "))
}
