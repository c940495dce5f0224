//! # Configuration Management
//!
//! Centralized configuration for the routing server.
//!
//! This module provides structured configuration for the server: bind address,
//! sizes of the three thread pools (acceptor, I/O, business), per-connection
//! queue depth, and the shutdown drain timeout.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Environment overrides via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Pool Sizing
//! The acceptor and I/O pools default to small fixed sizes; the business pool
//! defaults to the number of available processors, since it is the pool that
//! runs arbitrary (possibly blocking) handler code.

use crate::error::{Result, RouterError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Current supported wire protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// Magic bytes identifying protocol frames (0x504B5254 → "PKRT")
pub const MAGIC_BYTES: [u8; 4] = [0x50, 0x4B, 0x52, 0x54];

/// Max allowed packet body size (16 MB)
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Default listen host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 9700;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0")
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Number of worker threads in the acceptor pool
    pub acceptor_threads: usize,

    /// Number of worker threads in the I/O pool (decode/encode, raw read/write)
    pub io_threads: usize,

    /// Number of worker threads in the business pool (dispatch + handler logic).
    /// `0` means "number of available processors".
    pub business_threads: usize,

    /// Depth of each connection's bounded dispatch and write queues
    pub queue_depth: usize,

    /// Bound on how long `stop()` waits for in-flight work to drain
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            acceptor_threads: 1,
            io_threads: 2,
            business_threads: 0,
            queue_depth: 64,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RouterError::ConfigError(format!("Failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| RouterError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables, starting from defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("PACKET_ROUTER_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("PACKET_ROUTER_PORT") {
            config.port = port.parse::<u16>().map_err(|e| {
                RouterError::ConfigError(format!("Invalid PACKET_ROUTER_PORT value {port:?}: {e}"))
            })?;
        }

        if let Ok(threads) = std::env::var("PACKET_ROUTER_BUSINESS_THREADS") {
            config.business_threads = threads.parse::<usize>().map_err(|e| {
                RouterError::ConfigError(format!(
                    "Invalid PACKET_ROUTER_BUSINESS_THREADS value {threads:?}: {e}"
                ))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Effective size of the business pool (`0` resolves to available parallelism)
    pub fn effective_business_threads(&self) -> usize {
        if self.business_threads > 0 {
            self.business_threads
        } else {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
        }
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push("Listen host cannot be empty".to_string());
        }

        if self.acceptor_threads == 0 {
            errors.push("Acceptor thread count must be greater than 0".to_string());
        } else if self.acceptor_threads > 16 {
            errors.push(format!(
                "Acceptor thread count very high: {} (a single thread is usually enough)",
                self.acceptor_threads
            ));
        }

        if self.io_threads == 0 {
            errors.push("I/O thread count must be greater than 0".to_string());
        }

        if self.business_threads > 1024 {
            errors.push(format!(
                "Business thread count too large: {} (max recommended: 1024)",
                self.business_threads
            ));
        }

        if self.queue_depth == 0 {
            errors.push("Queue depth must be greater than 0".to_string());
        } else if self.queue_depth > 65_536 {
            errors.push(format!(
                "Queue depth too large: {} (max recommended: 65,536)",
                self.queue_depth
            ));
        }

        if self.shutdown_timeout.as_millis() < 100 {
            errors.push("Shutdown timeout too short (minimum: 100ms)".to_string());
        } else if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RouterError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Helper module for Duration serialization/deserialization (milliseconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
