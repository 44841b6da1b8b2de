//! Proxy Module
//!
//! One client transaction: request parsing, URI resolution, header rewriting,
//! origin relay and the cache decisions around them.
//!
//! # Flow
//! - Cache hit: the cached bytes are written back verbatim, no origin contact
//! - Cache miss: resolve, rewrite, connect, relay, then cache if small enough

mod handler;
mod headers;
mod relay;
mod response;
mod uri;

pub use handler::{handle_connection, ProxyState};
pub use headers::{read_header_lines, rewrite_headers, USER_AGENT};
pub use relay::{connect_origin, relay_response, RelayOutcome};
pub use response::ClientError;
pub use uri::{resolve, ResolvedUri};

/// Longest single line read from either peer, in bytes
pub const MAX_LINE: u64 = 8192;

/// Largest client header block accepted, terminators included
pub const MAX_HEADER_BYTES: usize = 64 * 1024;
