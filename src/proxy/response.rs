//! Client error pages
//!
//! Minimal HTTP/1.0 responses sent when a transaction cannot be completed.

use tokio::io::{AsyncWrite, AsyncWriteExt};

// == Client Error ==
/// An HTML error page with its status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub code: u16,
    pub reason: &'static str,
    pub message: &'static str,
    /// What the client sent that caused the error
    pub cause: String,
}

impl ClientError {
    pub fn new(code: u16, reason: &'static str, message: &'static str, cause: &str) -> Self {
        Self {
            code,
            reason,
            message,
            cause: cause.to_string(),
        }
    }

    /// HTML body of the page.
    pub fn body(&self) -> String {
        format!(
            "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
             {}: {}\r\n\
             <p>{}: {}\r\n\
             <hr><em>The caching proxy</em>\r\n",
            self.code,
            self.reason,
            self.message,
            escape_html(&self.cause)
        )
    }

    /// Full response: status line, headers and body.
    pub fn render(&self) -> String {
        let body = self.body();
        format!(
            "HTTP/1.0 {} {}\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n{}",
            self.code,
            self.reason,
            body.len(),
            body
        )
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(self.render().as_bytes()).await?;
        writer.flush().await
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
