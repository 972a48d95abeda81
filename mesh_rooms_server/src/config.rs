//! Startup configuration, read once from the environment

use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 5000;

/// Accept any browser origin
pub const ANY_ORIGIN: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the WebSocket listener binds to (`HOST`, `PORT`)
    pub listen_addr: SocketAddr,
    /// Browser origin allowed to connect (`ALLOWED_ORIGIN`)
    pub allowed_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            allowed_origin: ANY_ORIGIN.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match lookup("HOST") {
            Some(host) => host
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(host))?,
            None => defaults.listen_addr.ip(),
        };
        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port))?,
            None => defaults.listen_addr.port(),
        };
        let allowed_origin = lookup("ALLOWED_ORIGIN")
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .unwrap_or(defaults.allowed_origin);

        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            allowed_origin,
        })
    }

    /// Whether a browser `Origin` header value may open a connection
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origin == ANY_ORIGIN || self.allowed_origin == origin.trim_end_matches('/')
    }
}
