use zplay_session::{ConfigError, SessionConfig};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Where to listen plus the session settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Settings handed to the registry.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read `PORT` and the `ZPLAY_*` session variables from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`ServerConfig::from_env`], reading through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self {
            session: SessionConfig::from_vars(&lookup)?,
            ..Self::default()
        };
        if let Some(value) = lookup("PORT") {
            config.port = value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError {
                key: "PORT",
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(config)
    }

    /// Set the bind address.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replace the session settings.
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use zplay_session::Backend;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ServerConfig::from_vars(|_| None).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.session.backend, Backend::InProcess);
    }

    #[test]
    fn reads_port_and_session_settings() {
        let config =
            ServerConfig::from_vars(vars(&[("PORT", "8080"), ("ZPLAY_BACKEND", "stub")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.session.backend, Backend::Stub);
    }

    #[test]
    fn rejects_a_bad_port() {
        let err = ServerConfig::from_vars(vars(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.key, "PORT");
        assert_eq!(err.value, "eighty");
    }

    #[test]
    fn builders_override() {
        let config = ServerConfig::default().with_host("127.0.0.1").with_port(0);
        assert_eq!(config.bind_address(), "127.0.0.1:0");
    }
}
