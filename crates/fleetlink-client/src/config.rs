//! Client configuration loaded from environment variables.

use crate::error::ClientError;

/// Server address offered when none is configured.
pub const DEFAULT_SERVER: &str = "127.0.0.1";

/// Session port used when `FLEETLINK_PORT` is unset.
pub const DEFAULT_PORT: u16 = 65432;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host, or `None` to prompt for it.
    pub server: Option<String>,
    /// Server session port.
    pub port: u16,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// Optional variables:
    /// - `FLEETLINK_SERVER` -- server host (prompted for if unset)
    /// - `FLEETLINK_PORT` -- session port (default 65432)
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's
    /// value if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = lookup("FLEETLINK_SERVER")
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        let port = match lookup("FLEETLINK_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ClientError::Config(format!("invalid FLEETLINK_PORT: {e}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self { server, port })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.server, None);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn reads_server_and_port() {
        let config = ClientConfig::from_lookup(|key| match key {
            "FLEETLINK_SERVER" => Some(String::from(" 10.0.0.7 ")),
            "FLEETLINK_PORT" => Some(String::from("7000")),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.server.as_deref(), Some("10.0.0.7"));
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn blank_server_means_prompt() {
        let config =
            ClientConfig::from_lookup(|key| (key == "FLEETLINK_SERVER").then(String::new)).unwrap();
        assert_eq!(config.server, None);
    }

    #[test]
    fn bad_port_is_an_error() {
        let result =
            ClientConfig::from_lookup(|key| (key == "FLEETLINK_PORT").then(|| String::from("x")));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
