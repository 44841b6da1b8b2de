//! Request Handler
//!
//! Runs one client transaction from request line to close.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::proxy::headers::read_client_line;
use crate::proxy::{connect_origin, read_header_lines, relay_response, resolve, rewrite_headers};

/// State shared by every connection task.
///
/// Holds the cache store and configuration behind Arc for cheap cloning.
#[derive(Clone, Debug)]
pub struct ProxyState {
    pub cache: Arc<CacheStore>,
    pub config: Arc<Config>,
}

impl ProxyState {
    pub fn new(cache: Arc<CacheStore>, config: Config) -> Self {
        Self {
            cache,
            config: Arc::new(config),
        }
    }

    /// Creates the state with a fresh store sized from the configuration.
    pub fn from_config(config: Config) -> Self {
        let cache = CacheStore::new(config.cache_slots, config.max_object_size);
        Self::new(Arc::new(cache), config)
    }
}

/// A parsed request line.
#[derive(Debug, PartialEq, Eq)]
struct RequestLine<'a> {
    method: &'a str,
    uri: &'a str,
    version: &'a str,
}

fn parse_request_line(line: &str) -> Result<RequestLine<'_>> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(uri), Some(version)) => Ok(RequestLine {
            method,
            uri,
            version,
        }),
        _ => Err(ProxyError::MalformedRequest(line.trim().to_string())),
    }
}

// == Handle Connection ==
/// Serves one client connection and closes it.
///
/// Protocol and gateway failures are answered with an HTML error page and
/// count as handled. Only failures of the client socket itself are returned.
pub async fn handle_connection<S>(stream: S, state: &ProxyState) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let result = match transact(&mut reader, &mut writer, state).await {
        Err(err) => match err.client_error() {
            Some(page) => {
                warn!(error = %err, status = page.code, "transaction failed");
                page.write_to(&mut writer).await.map_err(ProxyError::from)
            }
            None => Err(err),
        },
        ok => ok,
    };

    // The peer may already be gone
    let _ = writer.shutdown().await;
    result
}

async fn transact<R, W>(reader: &mut R, writer: &mut W, state: &ProxyState) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    if read_client_line(reader, &mut buf).await? == 0 {
        debug!("client closed before sending a request");
        return Ok(());
    }
    let header_lines = read_header_lines(reader).await?;

    // The URI is the cache key, so it must be taken exactly as sent
    let line = std::str::from_utf8(&buf).map_err(|_| {
        ProxyError::MalformedRequest(String::from_utf8_lossy(&buf).trim().to_string())
    })?;
    let request = parse_request_line(line)?;
    if !request.method.eq_ignore_ascii_case("GET") {
        return Err(ProxyError::NotImplemented(request.method.to_string()));
    }
    info!(uri = request.uri, version = request.version, "GET");

    let cache = &state.cache;
    if let Some(payload) = cache.get(request.uri).await? {
        writer.write_all(&payload).await?;
        writer.flush().await?;
        debug!(uri = request.uri, bytes = payload.len(), "served from cache");
        return Ok(());
    }

    let config = &state.config;
    let target = resolve(
        request.uri,
        &config.default_target_host,
        config.default_target_port,
    )?;
    let outbound = rewrite_headers(&target.path, &target.host, &header_lines);

    let mut origin = connect_origin(&target.host, target.port, config.connect_timeout).await?;
    origin
        .write_all(&outbound)
        .await
        .map_err(|source| ProxyError::OriginUnreachable {
            host: target.host.clone(),
            port: target.port,
            source,
        })?;

    let outcome =
        relay_response(&mut origin, writer, cache.max_object_size(), config.read_timeout).await?;
    drop(origin);

    debug!(
        uri = request.uri,
        origin = %format!("{}:{}", target.host, target.port),
        bytes = outcome.bytes_relayed,
        "relayed from origin"
    );

    if outcome.complete {
        match outcome.cacheable {
            Some(payload) => {
                let inserted = cache.insert(request.uri.to_string(), payload).await?;
                debug!(uri = request.uri, slot = inserted.index, evicted = ?inserted.evicted, "cached");
            }
            None => cache.stats().record_oversized(),
        }
    }

    Ok(())
}
