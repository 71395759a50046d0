//! Builder for assembling and starting an uplink.

use std::sync::Arc;

use crate::channel::DeliveryChannel;
use crate::pipeline::StreamingLoop;
use crate::session::{Session, SessionState};
use crate::source::PeripheralSource;
use crate::supervisor::Liveness;
use crate::{EventCallback, UplinkError};

/// Entry point for the builder API.
///
/// # Example
///
/// ```ignore
/// use stream_uplink::{ConnectionSupervisor, Endpoint, StreamUplink};
///
/// let supervisor = ConnectionSupervisor::new(Endpoint::new("10.0.0.2", 42069, "/"));
/// supervisor.connect().await?;
///
/// let (stream, source) = AudioDevice::open_default()?.start_capture()?;
///
/// let session = StreamUplink::builder()
///     .source(source)
///     .channel(supervisor.channel())
///     .liveness(supervisor.liveness())
///     .on_event(|e| tracing::warn!(?e, "uplink event"))
///     .start()?;
/// ```
pub struct StreamUplink;

impl StreamUplink {
    /// Creates a new builder.
    pub fn builder() -> StreamUplinkBuilder {
        StreamUplinkBuilder::new()
    }
}

/// Builder for configuring and starting a streaming session.
///
/// Exactly one source and one channel: the pipeline has no fan-out.
#[must_use]
pub struct StreamUplinkBuilder {
    source: Option<Box<dyn PeripheralSource>>,
    channel: Option<Box<dyn DeliveryChannel>>,
    liveness: Option<Liveness>,
    event_callback: Option<EventCallback>,
}

impl Default for StreamUplinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamUplinkBuilder {
    /// Creates a new builder with no source or channel configured.
    pub fn new() -> Self {
        Self {
            source: None,
            channel: None,
            liveness: None,
            event_callback: None,
        }
    }

    /// Sets the peripheral source to capture from.
    pub fn source(mut self, source: impl PeripheralSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Sets the delivery channel to send through.
    pub fn channel(mut self, channel: impl DeliveryChannel + 'static) -> Self {
        self.channel = Some(Box::new(channel));
        self
    }

    /// Sets the liveness flag gating each send.
    ///
    /// Pass [`ConnectionSupervisor::liveness()`] when a supervisor manages
    /// the connection. Defaults to always-live, for transports whose
    /// connection is implicit in the channel itself.
    ///
    /// [`ConnectionSupervisor::liveness()`]: crate::ConnectionSupervisor::liveness
    pub fn liveness(mut self, liveness: Liveness) -> Self {
        self.liveness = Some(liveness);
        self
    }

    /// Registers a callback for runtime events.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::StreamEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(crate::event_callback(f));
        self
    }

    /// Spawns the streaming loop and returns a session handle.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if no source or no channel was configured.
    pub fn start(self) -> Result<Session, UplinkError> {
        let source = self.source.ok_or(UplinkError::NoSourceConfigured)?;
        let channel = self.channel.ok_or(UplinkError::NoChannelConfigured)?;
        let liveness = self.liveness.unwrap_or_else(|| Liveness::new(true));

        let state = Arc::new(SessionState::new());
        let streaming =
            StreamingLoop::with_state(source, channel, liveness, state.clone(), self.event_callback);
        let handle = tokio::spawn(streaming.run());

        Ok(Session::new(state, handle))
    }
}
