//! Caching Proxy - A forwarding HTTP/1.0 proxy with an in-memory object cache
//!
//! Relays GET requests to origin servers and keeps small responses in a
//! fixed-slot cache shared by every connection.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod server;

pub use api::AdminState;
pub use cache::CacheStore;
pub use config::Config;
pub use proxy::ProxyState;
pub use server::run_listener;
