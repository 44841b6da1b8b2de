//! Connection Listener
//!
//! Accepts client connections and hands each one to its own task.

use tokio::net::TcpListener;
use tracing::{info, info_span, warn, Instrument};

use crate::proxy::{handle_connection, ProxyState};

/// Accepts connections forever, spawning one task per client.
///
/// A failing connection only ends its own task.
pub async fn run_listener(listener: TcpListener, state: ProxyState) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };
        info!(%peer, "accepted connection");

        let state = state.clone();
        tokio::spawn(
            async move {
                if let Err(err) = handle_connection(stream, &state).await {
                    warn!(error = %err, "connection failed");
                }
            }
            .instrument(info_span!("connection", %peer)),
        );
    }
}
