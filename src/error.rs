//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::proxy::ClientError;

// == Cache Error Enum ==
/// Errors raised by the cache store itself.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Payload exceeds the per-object ceiling
    #[error("Object of {size} bytes exceeds the {limit} byte ceiling")]
    ObjectTooLarge { size: usize, limit: usize },

    /// A slot's exclusive lock was closed
    #[error("Slot lock closed")]
    LockClosed,
}

// == Proxy Error Enum ==
/// Unified error type for one proxy transaction.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Socket failure on either side of the transaction
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request line could not be parsed
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Any method other than GET
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// URI carries an unusable authority
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Origin refused or could not be resolved
    #[error("Origin {host}:{port} unreachable: {source}")]
    OriginUnreachable {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Origin did not accept the connection in time
    #[error("Timed out connecting to origin {host}:{port}")]
    OriginTimeout { host: String, port: u16 },

    /// Cache store failure
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ProxyError {
    /// Maps the error to the HTML error page sent back to the client.
    ///
    /// Returns `None` for failures where the client socket itself is the
    /// problem or where nothing useful can be reported.
    pub fn client_error(&self) -> Option<ClientError> {
        match self {
            ProxyError::MalformedRequest(line) => Some(ClientError::new(
                400,
                "Bad Request",
                "Proxy could not parse the request line",
                line,
            )),
            ProxyError::NotImplemented(method) => Some(ClientError::new(
                501,
                "Not implemented",
                "Proxy does not implement this method",
                method,
            )),
            ProxyError::InvalidUri(uri) => Some(ClientError::new(
                400,
                "Bad Request",
                "Proxy could not resolve the request URI",
                uri,
            )),
            ProxyError::OriginUnreachable { host, port, .. } => Some(ClientError::new(
                502,
                "Bad Gateway",
                "Proxy could not connect to the origin server",
                &format!("{}:{}", host, port),
            )),
            ProxyError::OriginTimeout { host, port } => Some(ClientError::new(
                504,
                "Gateway Timeout",
                "Origin server did not accept the connection in time",
                &format!("{}:{}", host, port),
            )),
            ProxyError::Cache(_) => Some(ClientError::new(
                500,
                "Internal Server Error",
                "Proxy cache failure",
                "cache",
            )),
            ProxyError::Io(_) => None,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MalformedRequest(_) | ProxyError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            ProxyError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ProxyError::OriginUnreachable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::OriginTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Io(_) | ProxyError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_status_codes() {
        let cases = vec![
            (ProxyError::MalformedRequest("GET".into()), 400),
            (ProxyError::NotImplemented("POST".into()), 501),
            (ProxyError::InvalidUri("a.com:99999".into()), 400),
            (
                ProxyError::OriginUnreachable {
                    host: "a.com".into(),
                    port: 80,
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                },
                502,
            ),
            (
                ProxyError::OriginTimeout {
                    host: "a.com".into(),
                    port: 80,
                },
                504,
            ),
        ];

        for (error, code) in cases {
            let page = error.client_error().expect("should map to an error page");
            assert_eq!(page.code, code, "wrong status for {}", error);
        }
    }

    #[test]
    fn test_io_error_has_no_client_page() {
        let error = ProxyError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(error.client_error().is_none());
    }

    #[test]
    fn test_into_response_status() {
        let response = ProxyError::NotImplemented("PUT".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

        let response = ProxyError::Cache(CacheError::LockClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
