//! Origin Relay
//!
//! Connects to the origin and streams its response back to the client,
//! keeping a bounded copy for the cache.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ProxyError, Result};
use crate::proxy::MAX_LINE;

// == Relay Outcome ==
/// Result of streaming one origin response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Bytes forwarded to the client
    pub bytes_relayed: usize,
    /// Copy of everything relayed, present while the total stayed within the ceiling
    pub cacheable: Option<Vec<u8>>,
    /// False when the origin stalled or failed before closing cleanly
    pub complete: bool,
}

// == Connect ==
/// Opens a connection to the origin within `connect_timeout`.
pub async fn connect_origin(host: &str, port: u16, connect_timeout: Duration) -> Result<TcpStream> {
    match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(ProxyError::OriginUnreachable {
            host: host.to_string(),
            port,
            source,
        }),
        Err(_) => Err(ProxyError::OriginTimeout {
            host: host.to_string(),
            port,
        }),
    }
}

// == Relay ==
/// Streams the origin's response to `client` line by line until the origin
/// closes the connection.
///
/// Each line is forwarded as soon as it is read. A copy is accumulated while
/// the running total stays at or below `max_object_size` and dropped as soon
/// as it exceeds it. Origin stalls longer than `read_timeout` end the relay
/// early. Only failures writing to the client are returned as errors.
pub async fn relay_response<O, C>(
    origin: O,
    client: &mut C,
    max_object_size: usize,
    read_timeout: Duration,
) -> Result<RelayOutcome>
where
    O: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut origin = BufReader::new(origin);
    let mut line = Vec::new();
    let mut cacheable = Some(Vec::new());
    let mut bytes_relayed = 0;
    let mut complete = true;

    loop {
        line.clear();
        let read = timeout(
            read_timeout,
            (&mut origin).take(MAX_LINE).read_until(b'\n', &mut line),
        )
        .await;

        let n = match read {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
            Ok(Err(err)) => {
                warn!(error = %err, bytes_relayed, "origin read failed");
                complete = false;
                break;
            }
            Err(_) => {
                warn!(?read_timeout, bytes_relayed, "origin stalled");
                complete = false;
                break;
            }
        };

        client.write_all(&line).await?;
        bytes_relayed += n;

        if bytes_relayed <= max_object_size {
            if let Some(copy) = cacheable.as_mut() {
                copy.extend_from_slice(&line);
            }
        } else if cacheable.take().is_some() {
            debug!(bytes_relayed, max_object_size, "response exceeds object ceiling");
        }
    }

    client.flush().await?;

    Ok(RelayOutcome {
        bytes_relayed,
        cacheable: if complete { cacheable } else { None },
        complete,
    })
}
