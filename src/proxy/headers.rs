//! Header Rewriter
//!
//! Turns the client's header block into the canonical HTTP/1.0 request sent
//! to the origin.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{ProxyError, Result};
use crate::proxy::{MAX_HEADER_BYTES, MAX_LINE};

/// User agent announced to every origin
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

/// Headers replaced by fixed values
const REPLACED: [&str; 3] = ["Connection", "Proxy-Connection", "User-Agent"];

// == Read Client Line ==
/// Reads one line from the client into `buf`, terminator included.
///
/// A line that fills `MAX_LINE` without reaching `\n` is rejected rather than
/// split, so its tail can never be read as a separate line.
pub(crate) async fn read_client_line<R>(client: &mut R, buf: &mut Vec<u8>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let n = (&mut *client).take(MAX_LINE).read_until(b'\n', buf).await?;
    if n as u64 == MAX_LINE && buf.last() != Some(&b'\n') {
        return Err(ProxyError::MalformedRequest(format!(
            "line longer than {} bytes",
            MAX_LINE
        )));
    }
    Ok(n)
}

// == Read Header Lines ==
/// Reads header lines up to the blank line that ends the block, or EOF.
///
/// Lines are kept as raw bytes with terminators stripped; the blank line is
/// consumed but not returned. The whole block may not exceed
/// `MAX_HEADER_BYTES`.
pub async fn read_header_lines<R>(client: &mut R) -> Result<Vec<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    let mut total = 0usize;

    loop {
        let mut buf = Vec::new();
        let n = read_client_line(client, &mut buf).await?;
        if n == 0 {
            break;
        }

        total += n;
        if total > MAX_HEADER_BYTES {
            return Err(ProxyError::MalformedRequest(format!(
                "header block longer than {} bytes",
                MAX_HEADER_BYTES
            )));
        }

        while matches!(buf.last(), Some(b'\r' | b'\n')) {
            buf.pop();
        }
        if buf.is_empty() {
            break;
        }
        lines.push(buf);
    }

    Ok(lines)
}

// == Rewrite Headers ==
/// Builds the outbound request for `path` from the client's header lines.
///
/// The first `Host` line is kept verbatim, or one is synthesized from
/// `hostname`. `Connection`, `Proxy-Connection` and `User-Agent` are replaced
/// by fixed values; every other line passes through byte for byte, in order.
pub fn rewrite_headers<I, S>(path: &str, hostname: &str, client_lines: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut host_line: Option<Vec<u8>> = None;
    let mut passthrough = Vec::new();

    for line in client_lines {
        let line = line.as_ref();
        match header_name(line) {
            Some(name) if name.eq_ignore_ascii_case("Host") => {
                if host_line.is_none() {
                    host_line = Some(line.to_vec());
                }
            }
            Some(name) if REPLACED.iter().any(|r| name.eq_ignore_ascii_case(r)) => {}
            _ => {
                passthrough.extend_from_slice(line);
                passthrough.extend_from_slice(b"\r\n");
            }
        }
    }

    let path = if path.is_empty() { "/" } else { path };
    let host_line = host_line.unwrap_or_else(|| format!("Host: {}", hostname).into_bytes());

    let mut out = format!("GET {} HTTP/1.0\r\n", path).into_bytes();
    out.extend_from_slice(&host_line);
    out.extend_from_slice(
        format!(
            "\r\nConnection: close\r\nProxy-Connection: close\r\nUser-Agent: {}\r\n",
            USER_AGENT
        )
        .as_bytes(),
    );
    out.extend_from_slice(&passthrough);
    out.extend_from_slice(b"\r\n");
    out
}

/// Name before the first `:`, if it is text.
fn header_name(line: &[u8]) -> Option<&str> {
    let colon = line.iter().position(|&b| b == b':')?;
    std::str::from_utf8(&line[..colon]).ok().map(str::trim)
}
