//! Binary-frame delivery over a WebSocket connection.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::channel::DeliveryChannel;
use crate::supervisor::{SupervisorShared, TransportEvent};
use crate::{Chunk, SendError};

/// Write half of a connected WebSocket.
pub(crate) type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Shared slot holding the current write half, if any.
///
/// The connection supervisor installs a fresh write half here on every
/// successful (re)connect and the reader task clears it on close, so the
/// channel held by the streaming loop never needs replacing.
pub(crate) type SharedSink = Arc<tokio::sync::Mutex<Option<WsSink>>>;

/// Sends each chunk as a single opaque binary WebSocket message.
///
/// The transport library handles segmentation. Created by
/// [`ConnectionSupervisor::channel()`]; the supervisor keeps refreshing the
/// underlying connection behind this handle across reconnects.
///
/// [`ConnectionSupervisor::channel()`]: crate::ConnectionSupervisor::channel
pub struct WebSocketChannel {
    name: String,
    sink: SharedSink,
    shared: Arc<SupervisorShared>,
}

impl WebSocketChannel {
    pub(crate) fn new(sink: SharedSink, shared: Arc<SupervisorShared>) -> Self {
        Self {
            name: "websocket".to_string(),
            sink,
            shared,
        }
    }
}

#[async_trait]
impl DeliveryChannel for WebSocketChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, chunk: &Chunk) -> Result<(), SendError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(SendError::NotConnected)?;

        match sink.send(Message::Binary(chunk.as_bytes().to_vec())).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // A failed write means this connection is done for; mark it
                // closed now instead of waiting for the reader task to
                // observe it. The reader's own Closed is idempotent.
                *guard = None;
                self.shared.apply(TransportEvent::Closed);
                Err(SendError::transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::ConnectionState;
    use futures::StreamExt;
    use std::time::Duration;

    fn disconnected_channel() -> (WebSocketChannel, Arc<SupervisorShared>) {
        let sink: SharedSink = Arc::new(tokio::sync::Mutex::new(None));
        let shared = Arc::new(SupervisorShared::new(None));
        (WebSocketChannel::new(sink, shared.clone()), shared)
    }

    #[tokio::test]
    async fn test_send_without_connection_is_not_connected() {
        let (mut channel, _shared) = disconnected_channel();

        let chunk = Chunk::new(vec![0u8; 16], 0);
        let err = channel.send(&chunk).await.unwrap_err();
        assert!(matches!(err, SendError::NotConnected));
    }

    #[test]
    fn test_channel_name() {
        let sink: SharedSink = Arc::new(tokio::sync::Mutex::new(None));
        let channel = WebSocketChannel::new(sink, Arc::new(SupervisorShared::new(None)));
        assert_eq!(channel.name(), "websocket");
    }

    #[tokio::test]
    async fn test_failed_write_marks_connection_closed() {
        // Server completes the handshake, then drops the socket
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(ws);
        });

        let (ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}/"))
            .await
            .unwrap();
        server.await.unwrap();

        let (write, _read) = ws.split();
        let sink: SharedSink = Arc::new(tokio::sync::Mutex::new(Some(write)));
        let shared = Arc::new(SupervisorShared::new(None));
        shared.apply(TransportEvent::Opened);
        let mut channel = WebSocketChannel::new(sink.clone(), shared.clone());

        // The first write can land in the kernel buffer; keep sending until
        // the dead peer surfaces as an error
        let chunk = Chunk::new(vec![0u8; 8], 0);
        let mut failed = false;
        for _ in 0..50 {
            if channel.send(&chunk).await.is_err() {
                failed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(failed);

        // State enum and liveness flag moved together, and the dead sink
        // was discarded
        assert_eq!(shared.state(), ConnectionState::Disconnected);
        assert!(!shared.liveness().is_live());
        assert!(sink.lock().await.is_none());
    }
}
