//! Runtime events for monitoring pipeline health.
//!
//! Events are non-fatal notifications about pipeline behavior. The loop
//! keeps running after events are emitted - they're for logging/metrics,
//! not error handling.

use std::sync::Arc;

/// Runtime events emitted during streaming.
///
/// These are informational, not errors. Use the [`EventCallback`] to log
/// them or update metrics. The one exception is [`CaptureFailed`], which
/// reports that the streaming loop has ended.
///
/// [`CaptureFailed`]: StreamEvent::CaptureFailed
///
/// # Example
///
/// ```
/// use stream_uplink::StreamEvent;
///
/// fn handle_event(event: StreamEvent) {
///     match event {
///         StreamEvent::ConnectionOpened => eprintln!("link up"),
///         StreamEvent::ConnectionClosed => eprintln!("link down"),
///         StreamEvent::ChunkDropped { seq } => {
///             eprintln!("dropped chunk {seq} while disconnected");
///         }
///         StreamEvent::SendFailed { channel_name, seq, error } => {
///             eprintln!("send of chunk {seq} via '{channel_name}' failed: {error}");
///         }
///         StreamEvent::CaptureFailed { reason } => {
///             eprintln!("capture ended: {reason}");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The transport reported a successful connection.
    ConnectionOpened,

    /// The transport reported closure or a fatal read/write error.
    ///
    /// Chunks captured while disconnected are dropped; streaming resumes
    /// automatically once the supervisor reports reconnection.
    ConnectionClosed,

    /// A chunk was discarded because the liveness flag read false at the
    /// send gate. This is the designed behavior during disconnection, not
    /// an error.
    ChunkDropped {
        /// Sequence number of the dropped chunk.
        seq: u64,
    },

    /// A send attempt failed; the chunk was dropped and the loop moved on.
    ///
    /// The chunk is never retried - there is no queue of pending chunks.
    SendFailed {
        /// Name of the channel that failed.
        channel_name: String,
        /// Sequence number of the chunk that was lost.
        seq: u64,
        /// Description of the failure.
        error: String,
    },

    /// The capture device failed and the streaming loop ended.
    ///
    /// There is no in-loop recovery from a hardware capture failure; the
    /// embedding environment decides whether to restart.
    CaptureFailed {
        /// Description of the hardware failure.
        reason: String,
    },
}

/// Callback type for receiving runtime events.
///
/// Register an event callback via [`StreamUplinkBuilder::on_event()`] to
/// receive notifications about drops, send failures, and connection state
/// changes.
///
/// [`StreamUplinkBuilder::on_event()`]: crate::StreamUplinkBuilder::on_event
///
/// # Example
///
/// ```ignore
/// let session = StreamUplink::builder()
///     .on_event(|event| {
///         tracing::warn!(?event, "uplink event");
///     })
///     .start()?;
/// ```
pub type EventCallback = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// Convenience for creating event callbacks without manually wrapping in
/// `Arc`.
///
/// # Example
///
/// ```
/// use stream_uplink::{event_callback, StreamEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(StreamEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_debug() {
        let event = StreamEvent::ChunkDropped { seq: 42 };
        let debug = format!("{:?}", event);
        assert!(debug.contains("ChunkDropped"));
        assert!(debug.contains("42"));
    }

    #[test]
    fn test_stream_event_clone() {
        let event = StreamEvent::SendFailed {
            channel_name: "ws".to_string(),
            seq: 3,
            error: "broken pipe".to_string(),
        };
        let cloned = event.clone();
        if let StreamEvent::SendFailed {
            channel_name,
            seq,
            error,
        } = cloned
        {
            assert_eq!(channel_name, "ws");
            assert_eq!(seq, 3);
            assert_eq!(error, "broken pipe");
        } else {
            panic!("Expected SendFailed variant");
        }
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(StreamEvent::ConnectionOpened);
        assert!(called.load(Ordering::SeqCst));
    }
}
