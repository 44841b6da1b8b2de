//! URI Resolver
//!
//! Splits a request URI into the origin host, port and path.

use crate::error::{ProxyError, Result};

// == Resolved URI ==
/// Where a request should be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUri {
    pub host: String,
    pub port: u16,
    /// Path from the first slash onward, empty when the URI has none
    pub path: String,
}

// == Resolve ==
/// Resolves `uri` into host, port and path.
///
/// A leading `scheme://` (or bare `//`) is skipped. A colon before the first
/// slash introduces an explicit port; otherwise `default_port` is used. An
/// empty host falls back to `default_host`.
///
/// # Errors
/// Returns `ProxyError::InvalidUri` when the explicit port is not a valid
/// port number.
pub fn resolve(uri: &str, default_host: &str, default_port: u16) -> Result<ResolvedUri> {
    let authority = strip_scheme(uri.trim());

    let slash = authority.find('/');
    let colon = authority.find(':');

    let (host, port, path) = match colon {
        Some(colon) if slash.map_or(true, |slash| colon < slash) => {
            let after = &authority[colon + 1..];
            let digits = after
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after.len());
            let port = after[..digits]
                .parse::<u16>()
                .map_err(|_| ProxyError::InvalidUri(uri.to_string()))?;
            (&authority[..colon], port, &after[digits..])
        }
        _ => match slash {
            Some(slash) => (&authority[..slash], default_port, &authority[slash..]),
            None => (authority, default_port, ""),
        },
    };

    let host = if host.is_empty() { default_host } else { host };

    Ok(ResolvedUri {
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

fn strip_scheme(uri: &str) -> &str {
    if let Some(rest) = uri.strip_prefix("//") {
        return rest;
    }
    match uri.find("://") {
        Some(end)
            if end > 0
                && uri[..end]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            &uri[end + 3..]
        }
        _ => uri,
    }
}
