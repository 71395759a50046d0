//! Connection lifecycle management, decoupled from the capture cadence.
//!
//! The supervisor owns the transport connection: connect, observe liveness,
//! install the fresh write half on reconnect. Its only coupling with the
//! streaming loop is a single atomic [`Liveness`] flag - the loop never
//! blocks on network events, it just reads the flag once per cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::SplitStream;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::channel::{SharedSink, WebSocketChannel};
use crate::{Endpoint, EventCallback, StreamEvent, UplinkConfig, UplinkError};

/// Connection lifecycle states.
///
/// Owned exclusively by the supervisor; the streaming loop reads only the
/// derived [`Liveness`] flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; the initial state and the state after any closure.
    Disconnected,
    /// A connect request is in flight.
    Connecting,
    /// The transport reported a successful handshake.
    Connected,
}

/// Shared boolean indicating whether the connection is currently believed
/// usable.
///
/// This is a liveness hint, not a lock: a send may still fail if the
/// connection drops between the gate check and the write. One stale read
/// per cycle is the accepted cost of lock-free signaling.
#[derive(Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    /// Creates a flag with the given initial value.
    pub fn new(initial: bool) -> Self {
        Self(Arc::new(AtomicBool::new(initial)))
    }

    /// Returns the current belief about the connection.
    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Updates the flag.
    pub fn set(&self, live: bool) {
        self.0.store(live, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Liveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Liveness").field(&self.is_live()).finish()
    }
}

/// Asynchronous notifications from the transport.
///
/// The WebSocket reader task feeds these into the supervisor; custom
/// transports can do the same via [`ConnectionSupervisor::apply_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed; the connection is usable.
    Opened,
    /// The connection closed or a read/write failed fatally.
    Closed,
    /// Protocol-level liveness probe from the peer.
    Ping,
    /// Reply to our liveness probe.
    Pong,
}

/// State shared between the supervisor handle, its reader task, and the
/// channel handed to the streaming loop.
///
/// Every observer of connection health goes through [`apply`], so the
/// state enum and the liveness flag can never disagree.
///
/// [`apply`]: SupervisorShared::apply
pub(crate) struct SupervisorShared {
    state: parking_lot::Mutex<ConnectionState>,
    liveness: Liveness,
    event_callback: Option<EventCallback>,
}

impl SupervisorShared {
    pub(crate) fn new(event_callback: Option<EventCallback>) -> Self {
        Self {
            state: parking_lot::Mutex::new(ConnectionState::Disconnected),
            liveness: Liveness::new(false),
            event_callback,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub(crate) fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    fn emit(&self, event: StreamEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    pub(crate) fn apply(&self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                let transitioned = {
                    let mut state = self.state.lock();
                    let changed = *state != ConnectionState::Connected;
                    *state = ConnectionState::Connected;
                    changed
                };
                // Duplicate Opened notifications only re-affirm the flag
                self.liveness.set(true);
                if transitioned {
                    tracing::info!("connection opened");
                    self.emit(StreamEvent::ConnectionOpened);
                }
            }
            TransportEvent::Closed => {
                let transitioned = {
                    let mut state = self.state.lock();
                    let changed = *state != ConnectionState::Disconnected;
                    *state = ConnectionState::Disconnected;
                    changed
                };
                self.liveness.set(false);
                if transitioned {
                    tracing::info!("connection closed");
                    self.emit(StreamEvent::ConnectionClosed);
                }
            }
            TransportEvent::Ping => {
                // The transport answers pings itself; nothing to track
                tracing::debug!("got ping");
            }
            TransportEvent::Pong => {
                tracing::debug!("got pong");
            }
        }
    }
}

/// Owns the lifecycle of the uplink connection.
///
/// [`connect()`] blocks until the first successful handshake, retrying with
/// a fixed delay - the startup contract for the bootstrap path. After that,
/// connection loss is observed asynchronously by the reader task, which
/// flips the liveness flag; reconnecting is again the caller's move, on its
/// own schedule, never the streaming loop's.
///
/// [`connect()`]: ConnectionSupervisor::connect
///
/// # Example
///
/// ```ignore
/// let supervisor = ConnectionSupervisor::new(Endpoint::new("10.0.0.2", 42069, "/"));
/// supervisor.connect().await?;          // blocks until first success
/// let channel = supervisor.channel();   // hand to the streaming loop
/// let liveness = supervisor.liveness();
/// ```
pub struct ConnectionSupervisor {
    endpoint: Endpoint,
    config: UplinkConfig,
    shared: Arc<SupervisorShared>,
    sink: SharedSink,
}

impl ConnectionSupervisor {
    /// Creates a supervisor for the given endpoint with default config.
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_config(endpoint, UplinkConfig::default())
    }

    /// Creates a supervisor with explicit connection config.
    pub fn with_config(endpoint: Endpoint, config: UplinkConfig) -> Self {
        Self {
            endpoint,
            config,
            shared: Arc::new(SupervisorShared::new(None)),
            sink: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Registers a callback for connection events.
    ///
    /// Must be called before `connect()`; events from an already-running
    /// reader task will not pick it up.
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        let shared = Arc::new(SupervisorShared {
            state: parking_lot::Mutex::new(self.shared.state()),
            liveness: self.shared.liveness(),
            event_callback: Some(callback),
        });
        self.shared = shared;
        self
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Returns the liveness flag consulted by the streaming loop.
    pub fn liveness(&self) -> Liveness {
        self.shared.liveness()
    }

    /// Returns a binary-frame channel backed by this supervisor's
    /// connection. The handle stays valid across reconnects.
    pub fn channel(&self) -> WebSocketChannel {
        WebSocketChannel::new(self.sink.clone(), self.shared.clone())
    }

    /// Feeds a transport notification into the state machine.
    ///
    /// The built-in WebSocket reader task calls this internally; custom
    /// transports drive the supervisor the same way.
    pub fn apply_event(&self, event: TransportEvent) {
        self.shared.apply(event);
    }

    /// Connects to the endpoint, blocking until the first success.
    ///
    /// Retries with [`UplinkConfig::connect_retry_delay`] between attempts.
    /// On success the write half is installed behind [`channel()`] and a
    /// reader task is spawned to watch for closure.
    ///
    /// [`channel()`]: ConnectionSupervisor::channel
    ///
    /// # Errors
    ///
    /// Returns `InvalidEndpoint` if the endpoint cannot form a valid
    /// request; connection refusals are retried, not returned.
    pub async fn connect(&self) -> Result<(), UplinkError> {
        let url = self.endpoint.ws_url();

        // Validate once up front so a malformed endpoint is an error
        // instead of an infinite retry loop.
        url.as_str()
            .into_client_request()
            .map_err(|e| UplinkError::InvalidEndpoint {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        *self.shared.state.lock() = ConnectionState::Connecting;
        tracing::info!(%url, "connecting");

        let ws = loop {
            match connect_async(url.as_str()).await {
                Ok((ws, _response)) => break ws,
                Err(e) => {
                    tracing::debug!(%url, error = %e, "connect attempt failed, retrying");
                    tokio::time::sleep(self.config.connect_retry_delay).await;
                }
            }
        };

        let (write, read) = ws.split();
        *self.sink.lock().await = Some(write);
        self.shared.apply(TransportEvent::Opened);

        tokio::spawn(run_reader(read, self.shared.clone(), self.sink.clone()));
        Ok(())
    }
}

/// Watches the read half for closure and protocol liveness signals.
///
/// Runs for the lifetime of one connection; exits after applying `Closed`.
async fn run_reader(
    mut read: SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    shared: Arc<SupervisorShared>,
    sink: SharedSink,
) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Ping(_)) => shared.apply(TransportEvent::Ping),
            Ok(Message::Pong(_)) => shared.apply(TransportEvent::Pong),
            Ok(Message::Close(_)) => break,
            // Inbound payloads are not part of this pipeline
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "websocket read failed");
                break;
            }
        }
    }

    sink.lock().await.take();
    shared.apply(TransportEvent::Closed);
}
