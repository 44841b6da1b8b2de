//! Configuration Module
//!
//! Handles loading proxy configuration from the command line and environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

use crate::cache::{DEFAULT_SLOT_COUNT, MAX_OBJECT_SIZE};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "caching_proxy")]
#[command(about = "Forwarding HTTP proxy with an in-memory object cache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Port to listen on for client connections
    pub port: u16,
}

/// Proxy configuration parameters.
///
/// The listening port comes from the command line; everything else can be
/// tuned through environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the proxy listens on
    pub listen_port: u16,
    /// Host used when a request URI carries no authority
    pub default_target_host: String,
    /// Port used when a request URI carries no explicit port
    pub default_target_port: u16,
    /// Number of cache slots
    pub cache_slots: usize,
    /// Largest response, in bytes, that will be cached
    pub max_object_size: usize,
    /// Origin connect timeout
    pub connect_timeout: Duration,
    /// Origin per-read timeout while relaying
    pub read_timeout: Duration,
    /// Port for the read-only admin API, disabled when `None`
    pub admin_port: Option<u16>,
}

impl Config {
    /// Creates a new Config for the given listening port, loading everything
    /// else from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TARGET_HOST` - Fallback origin host (default: localhost)
    /// - `DEFAULT_TARGET_PORT` - Fallback origin port (default: 80)
    /// - `CACHE_SLOTS` - Number of cache slots (default: 10)
    /// - `MAX_OBJECT_SIZE` - Per-object cache ceiling in bytes (default: 102400)
    /// - `CONNECT_TIMEOUT_SECS` - Origin connect timeout (default: 10)
    /// - `READ_TIMEOUT_SECS` - Origin read timeout (default: 30)
    /// - `ADMIN_PORT` - Admin API port (default: disabled)
    pub fn from_env(listen_port: u16) -> Self {
        let defaults = Self::default();
        Self {
            listen_port,
            default_target_host: env::var("DEFAULT_TARGET_HOST")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_target_host),
            default_target_port: env_or("DEFAULT_TARGET_PORT", defaults.default_target_port),
            cache_slots: env_or("CACHE_SLOTS", defaults.cache_slots).max(1),
            max_object_size: env_or("MAX_OBJECT_SIZE", defaults.max_object_size),
            connect_timeout: Duration::from_secs(env_or("CONNECT_TIMEOUT_SECS", 10)),
            read_timeout: Duration::from_secs(env_or("READ_TIMEOUT_SECS", 30)),
            admin_port: env::var("ADMIN_PORT").ok().and_then(|v| v.parse().ok()),
        }
    }

    /// Builds the configuration from parsed command line arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self::from_env(cli.port)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: 0,
            default_target_host: "localhost".to_string(),
            default_target_port: 80,
            cache_slots: DEFAULT_SLOT_COUNT,
            max_object_size: MAX_OBJECT_SIZE,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            admin_port: None,
        }
    }
}
