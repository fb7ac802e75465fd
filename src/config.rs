use std::env;
use std::time::Duration;

use crate::{Result, TsdbError};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4080;
pub const DEFAULT_BASE: &str = "api/v1/";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint and timeout settings for a [`TsdbClient`](crate::TsdbClient).
///
/// The value is copied into the client at construction and never changes
/// afterwards, so one process can talk to several servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix placed between the authority and the operation name.
    pub base: String,
    pub connect_timeout: Duration,
    /// Bound on the whole request, connect included.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base: DEFAULT_BASE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }

    /// Defaults overlaid with `TSDB_HOST`, `TSDB_PORT`, `TSDB_BASE`,
    /// `TSDB_CONNECT_TIMEOUT_SECS` and `TSDB_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("TSDB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("TSDB_PORT") {
            config.port = port
                .parse()
                .map_err(|e| TsdbError::Config(format!("invalid TSDB_PORT {:?}: {}", port, e)))?;
        }
        if let Some(base) = lookup("TSDB_BASE") {
            config.base = base;
        }
        if let Some(secs) = lookup("TSDB_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs("TSDB_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("TSDB_TIMEOUT_SECS") {
            config.timeout = parse_secs("TSDB_TIMEOUT_SECS", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(TsdbError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(TsdbError::Config("port must not be 0".to_string()));
        }
        let url = self.base_url();
        if let Err(e) = reqwest::Url::parse(&url) {
            return Err(TsdbError::Config(format!("invalid endpoint {:?}: {}", url, e)));
        }
        if self.connect_timeout > self.timeout {
            return Err(TsdbError::Config(format!(
                "connect timeout {:?} exceeds total timeout {:?}",
                self.connect_timeout, self.timeout
            )));
        }
        Ok(())
    }

    /// `http://{host}:{port}/{base}` with the base normalised to end in `/`.
    pub fn base_url(&self) -> String {
        let base = self.base.trim_start_matches('/');
        let sep = if base.is_empty() || base.ends_with('/') { "" } else { "/" };
        format!("http://{}:{}/{}{}", self.host, self.port, base, sep)
    }

    pub fn endpoint_url(&self, operation: &str) -> String {
        format!("{}{}", self.base_url(), operation)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| TsdbError::Config(format!("invalid {} {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 4080);
        assert_eq!(config.connect_timeout, Duration::from_secs(4));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.endpoint_url("query"), "http://localhost:4080/api/v1/query");
    }

    #[test]
    fn test_base_normalisation() {
        let config = ClientConfig::new("db.internal", 9000).with_base("/tsdb/api");
        assert_eq!(config.endpoint_url("count"), "http://db.internal:9000/tsdb/api/count");

        let config = ClientConfig::new("db.internal", 9000).with_base("");
        assert_eq!(config.endpoint_url("count"), "http://db.internal:9000/count");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("TSDB_HOST", "10.0.0.7"),
            ("TSDB_PORT", "4081"),
            ("TSDB_TIMEOUT_SECS", "2.5"),
            ("TSDB_CONNECT_TIMEOUT_SECS", "1"),
        ]))
        .unwrap();

        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, 4081);
        assert_eq!(config.base, DEFAULT_BASE);
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(ClientConfig::from_lookup(lookup_from(&[("TSDB_PORT", "http")])).is_err());
        assert!(ClientConfig::from_lookup(lookup_from(&[("TSDB_TIMEOUT_SECS", "-1")])).is_err());
        assert!(matches!(
            ClientConfig::from_lookup(lookup_from(&[("TSDB_TIMEOUT_SECS", "1e20")])),
            Err(TsdbError::Config(_))
        ));
        // connect timeout default is 4s
        assert!(ClientConfig::from_lookup(lookup_from(&[("TSDB_TIMEOUT_SECS", "1")])).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("", 4080).validate().is_err());
        assert!(ClientConfig::new("localhost", 0).validate().is_err());
        assert!(matches!(
            ClientConfig::new("bad host", 4080).validate(),
            Err(TsdbError::Config(_))
        ));
        assert!(ClientConfig::default().validate().is_ok());
    }
}
