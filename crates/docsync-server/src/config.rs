//! Server configuration.

use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Default listening address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DOCSYNC_ADDR`: listening address, e.g. `127.0.0.1:9000`
    /// - `ADDR`: fallback for `DOCSYNC_ADDR`; a bare `:port` binds all interfaces
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let addr = std::env::var("DOCSYNC_ADDR")
            .or_else(|_| std::env::var("ADDR"))
            .ok();
        Self::from_addr(addr.as_deref())
    }

    /// Build configuration from an optional address string.
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be parsed.
    pub fn from_addr(addr: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = addr.filter(|a| !a.is_empty()) {
            let full = if addr.starts_with(':') {
                format!("0.0.0.0{addr}")
            } else {
                addr.to_string()
            };
            config.addr = full
                .parse()
                .with_context(|| format!("Invalid listen address: {addr}"))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.to_string(), DEFAULT_ADDR);
        assert_eq!(ServerConfig::from_addr(None).unwrap(), config);
        assert_eq!(ServerConfig::from_addr(Some("")).unwrap(), config);
    }

    #[test]
    fn bare_port_binds_all_interfaces() {
        let config = ServerConfig::from_addr(Some(":9090")).unwrap();
        assert_eq!(config.addr.to_string(), "0.0.0.0:9090");
    }

    #[test]
    fn explicit_address() {
        let config = ServerConfig::from_addr(Some("127.0.0.1:3000")).unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn invalid_address_fails() {
        let err = ServerConfig::from_addr(Some("nowhere")).unwrap_err();
        assert!(err.to_string().contains("Invalid listen address"));
    }
}
