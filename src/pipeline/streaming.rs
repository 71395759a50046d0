//! The streaming loop: fetch, gate, send, release, repeat.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::channel::DeliveryChannel;
use crate::pipeline::FrameSlot;
use crate::session::SessionState;
use crate::source::PeripheralSource;
use crate::supervisor::Liveness;
use crate::{EventCallback, StreamEvent};

/// The control loop at the heart of the pipeline.
///
/// Each cycle: fetch a chunk from the source, acquire it into the frame
/// slot, attempt delivery if the liveness flag reads true, release the
/// slot regardless of the send outcome.
///
/// Failure semantics:
/// - A send failure is never fatal. The chunk is dropped and the next
///   capture cycle begins on schedule - an uninterrupted capture cadence
///   matters more than any individual chunk.
/// - A capture failure ends the loop. There is no software path to repair
///   a dead capture device; restart is the embedding environment's call.
///
/// The loop runs until a capture failure or until the shared running flag
/// is cleared (see [`Session::stop`](crate::Session::stop)).
pub struct StreamingLoop<S, C> {
    source: S,
    channel: C,
    slot: FrameSlot,
    liveness: Liveness,
    state: Arc<SessionState>,
    event_callback: Option<EventCallback>,
}

impl<S: PeripheralSource, C: DeliveryChannel> StreamingLoop<S, C> {
    pub(crate) fn with_state(
        source: S,
        channel: C,
        liveness: Liveness,
        state: Arc<SessionState>,
        event_callback: Option<EventCallback>,
    ) -> Self {
        Self {
            source,
            channel,
            slot: FrameSlot::new(),
            liveness,
            state,
            event_callback,
        }
    }

    /// Creates a loop over the given source and channel.
    ///
    /// The liveness flag gates every send; pass the supervisor's flag, or
    /// `Liveness::new(true)` for transports whose connection is implicit
    /// (a multipart response stream exists exactly as long as its client).
    pub fn new(source: S, channel: C, liveness: Liveness) -> Self {
        Self::with_state(source, channel, liveness, Arc::new(SessionState::new()), None)
    }

    /// Registers a callback for drop/failure events.
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    fn emit(&self, event: StreamEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    /// Runs the loop until capture fails or the session is stopped.
    pub async fn run(mut self) {
        tracing::info!(
            source = self.source.name(),
            channel = self.channel.name(),
            "streaming loop started"
        );

        while self.state.running.load(Ordering::SeqCst) {
            let chunk = match self.source.fetch().await {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::error!(
                        source = self.source.name(),
                        error = %e,
                        "capture failed, stopping loop"
                    );
                    self.emit(StreamEvent::CaptureFailed {
                        reason: e.to_string(),
                    });
                    break;
                }
            };
            self.state.chunks_captured.fetch_add(1, Ordering::SeqCst);

            let chunk = self.slot.acquire(chunk);
            let seq = chunk.seq();

            if self.liveness.is_live() {
                match self.channel.send(chunk).await {
                    Ok(()) => {
                        self.state.chunks_sent.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => {
                        // Drop, never retry: the next capture matters more
                        // than this chunk
                        self.state.send_failures.fetch_add(1, Ordering::SeqCst);
                        tracing::warn!(seq, error = %e, "send failed, chunk dropped");
                        self.emit(StreamEvent::SendFailed {
                            channel_name: self.channel.name().to_string(),
                            seq,
                            error: e.to_string(),
                        });
                    }
                }
            } else {
                self.state.chunks_dropped.fetch_add(1, Ordering::SeqCst);
                tracing::trace!(seq, "link down, chunk dropped");
                self.emit(StreamEvent::ChunkDropped { seq });
            }

            // Released regardless of send outcome
            self.slot.release();
        }

        self.state.running.store(false, Ordering::SeqCst);
        tracing::info!("streaming loop ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannel;
    use crate::source::MockSource;
    use crate::{event_callback, Chunk};
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_loop_sends_every_chunk_while_live() {
        let source = MockSource::with_chunks(vec![vec![1], vec![2], vec![3]]);
        let channel = MockChannel::new();
        let sent = channel.sent_handle();

        StreamingLoop::new(source, channel, Liveness::new(true))
            .run()
            .await;

        let sent = sent.lock();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], vec![1]);
        assert_eq!(sent[2], vec![3]);
    }

    #[tokio::test]
    async fn test_no_send_while_disconnected() {
        let source = MockSource::with_chunks(vec![vec![1], vec![2]]);
        let channel = MockChannel::new();
        let sent = channel.sent_handle();

        let state = Arc::new(SessionState::new());
        StreamingLoop::with_state(source, channel, Liveness::new(false), state.clone(), None)
            .run()
            .await;

        assert!(sent.lock().is_empty());
        // Capture cadence uninterrupted: both chunks were still fetched
        assert_eq!(state.chunks_captured.load(Ordering::SeqCst), 2);
        assert_eq!(state.chunks_dropped.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_send_failure_does_not_stop_loop() {
        let source = MockSource::with_chunks(vec![vec![1], vec![2], vec![3]]);
        let channel = MockChannel::failing(1);
        let sent = channel.sent_handle();

        let state = Arc::new(SessionState::new());
        StreamingLoop::with_state(source, channel, Liveness::new(true), state.clone(), None)
            .run()
            .await;

        // First send failed, the other two went through
        assert_eq!(sent.lock().len(), 2);
        assert_eq!(state.send_failures.load(Ordering::SeqCst), 1);
        assert_eq!(state.chunks_captured.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_capture_failure_emits_event_and_stops() {
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();

        let source = MockSource::with_chunks(vec![vec![1]]);
        let channel = MockChannel::new();

        StreamingLoop::new(source, channel, Liveness::new(true))
            .with_event_callback(event_callback(move |event| {
                if matches!(event, StreamEvent::CaptureFailed { .. }) {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }))
            .run()
            .await;

        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_events_carry_sequence_numbers() {
        let dropped = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = dropped.clone();

        let source = MockSource::with_chunks(vec![vec![1], vec![2]]);
        let channel = MockChannel::new();

        StreamingLoop::new(source, channel, Liveness::new(false))
            .with_event_callback(event_callback(move |event| {
                if let StreamEvent::ChunkDropped { seq } = event {
                    sink.lock().push(seq);
                }
            }))
            .run()
            .await;

        assert_eq!(*dropped.lock(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_stop_flag_ends_loop_before_fetch() {
        let mut source = MockSource::with_chunks(vec![]);
        source.push_chunk(Chunk::new(vec![0; 4], 0).as_bytes().to_vec());

        let state = Arc::new(SessionState::new());
        state.running.store(false, Ordering::SeqCst);

        StreamingLoop::with_state(
            source,
            MockChannel::new(),
            Liveness::new(true),
            state.clone(),
            None,
        )
        .run()
        .await;

        assert_eq!(state.chunks_captured.load(Ordering::SeqCst), 0);
    }
}
