//! WebSocket adapter for the push subscription.
//!
//! Messages are JSON text frames decoded as [`PushMessage`]. A close frame
//! or transport error surfaces as a stream error, which the push channel
//! treats as a reconnectable drop; terminal semantics come only from the
//! server's `completed`/`error` messages.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::TransportError;
use crate::model::{JobId, PushMessage};
use crate::ports::{PushPort, PushStream};

/// Tokio-tungstenite implementation of [`PushPort`].
#[derive(Debug, Clone)]
pub struct WebSocketPushClient {
    base_url: String,
}

impl WebSocketPushClient {
    /// Create a client for the given stream base URL (`ws://` or `wss://`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn stream_url(&self, job: &JobId) -> String {
        format!("{}/jobs/{job}/stream", self.base_url)
    }
}

#[async_trait]
impl PushPort for WebSocketPushClient {
    async fn subscribe(&self, job: &JobId) -> Result<PushStream, TransportError> {
        let url = self.stream_url(job);
        let (socket, _response) = connect_async(&url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let stream = socket.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => Some(
                    serde_json::from_str::<PushMessage>(text.as_str())
                        .map_err(|e| TransportError::Decode(e.to_string())),
                ),
                Ok(Message::Close(_)) => Some(Err(TransportError::StreamClosed)),
                // Pings are answered by the transport; binary frames are
                // not part of the protocol.
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::Request(e.to_string()))),
            }
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_joins_base_and_job() {
        let client = WebSocketPushClient::new("ws://localhost:8080/");
        assert_eq!(
            client.stream_url(&JobId::new("bt-9")),
            "ws://localhost:8080/jobs/bt-9/stream"
        );
    }
}
