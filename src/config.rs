use crate::alert::ContentFormat;
use crate::server::AuthCredentials;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the sender's `nsec`
pub const SENDER_NSEC_VAR: &str = "SENDER_NSEC";
pub const PORT_VAR: &str = "PORT";
pub const WEBHOOK_USERNAME_VAR: &str = "WEBHOOK_USERNAME";
pub const WEBHOOK_PASSWORD_VAR: &str = "WEBHOOK_PASSWORD";

pub const DEFAULT_RELAY: &str = "wss://yabu.me";
pub const DEFAULT_PORT: &str = "8080";

/// How long to wait for the relay's `OK` after sending an event
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(7);

/// Deadline for the relay WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(7);

/// Deadline for a NIP-05 `nostr.json` lookup
pub const DEFAULT_NIP05_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingSenderKey(&'static str),

    #[error("WEBHOOK_USERNAME and WEBHOOK_PASSWORD must be set together")]
    PartialAuth,
}

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub relay_url: String,
    /// Encoded (bech32) sender secret key; decoded per dispatch
    pub sender_nsec: String,
    pub port: String,
    pub content_format: ContentFormat,
    pub auth: Option<AuthCredentials>,
    pub publish_timeout: Duration,
    /// Surface publish rejections to the webhook caller instead of only logging them
    pub strict_publish: bool,
}

impl Config {
    pub fn new(relay_url: impl Into<String>, sender_nsec: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            sender_nsec: sender_nsec.into(),
            port: DEFAULT_PORT.to_string(),
            content_format: ContentFormat::default(),
            auth: None,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            strict_publish: false,
        }
    }

    /// Build config from the process environment
    pub fn from_env(relay_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(relay_url, |key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(relay_url: impl Into<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let sender_nsec = get(SENDER_NSEC_VAR).ok_or(ConfigError::MissingSenderKey(SENDER_NSEC_VAR))?;

        let auth = match (get(WEBHOOK_USERNAME_VAR), get(WEBHOOK_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(AuthCredentials { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialAuth),
        };

        let mut config = Self::new(relay_url, sender_nsec);
        if let Some(port) = get(PORT_VAR) {
            config.port = port;
        }
        config.auth = auth;
        Ok(config)
    }

    pub fn with_content_format(mut self, format: ContentFormat) -> Self {
        self.content_format = format;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn with_strict_publish(mut self, strict: bool) -> Self {
        self.strict_publish = strict;
        self
    }

    /// Listen on all interfaces at the configured port
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(DEFAULT_RELAY, lookup_from(&[("SENDER_NSEC", "nsec1abc")])).unwrap();
        assert_eq!(config.relay_url, "wss://yabu.me");
        assert_eq!(config.sender_nsec, "nsec1abc");
        assert_eq!(config.port, "8080");
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.content_format, ContentFormat::Grafana);
        assert_eq!(config.publish_timeout, Duration::from_secs(7));
        assert!(config.auth.is_none());
        assert!(!config.strict_publish);
    }

    #[test]
    fn test_missing_sender_key() {
        let err = Config::from_lookup(DEFAULT_RELAY, lookup_from(&[("PORT", "9000")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSenderKey("SENDER_NSEC"));
        assert_eq!(err.to_string(), "SENDER_NSEC is not set");
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let err = Config::from_lookup(DEFAULT_RELAY, lookup_from(&[("SENDER_NSEC", "")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSenderKey("SENDER_NSEC"));

        let config = Config::from_lookup(
            DEFAULT_RELAY,
            lookup_from(&[("SENDER_NSEC", "nsec1abc"), ("PORT", "")]),
        )
        .unwrap();
        assert_eq!(config.port, "8080");
    }

    #[test]
    fn test_port_and_auth_from_env() {
        let config = Config::from_lookup(
            "wss://relay.example",
            lookup_from(&[
                ("SENDER_NSEC", "nsec1abc"),
                ("PORT", "9090"),
                ("WEBHOOK_USERNAME", "grafana"),
                ("WEBHOOK_PASSWORD", "hunter2"),
            ]),
        )
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
        let auth = config.auth.unwrap();
        assert_eq!(auth.username, "grafana");
        assert_eq!(auth.password, "hunter2");
    }

    #[test]
    fn test_partial_auth_rejected() {
        let err = Config::from_lookup(
            DEFAULT_RELAY,
            lookup_from(&[("SENDER_NSEC", "nsec1abc"), ("WEBHOOK_USERNAME", "grafana")]),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::PartialAuth);
    }
}
