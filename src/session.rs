//! Streaming session management.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

/// Statistics about a streaming session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Chunks successfully fetched from the source.
    pub chunks_captured: u64,
    /// Chunks delivered to the remote consumer.
    pub chunks_sent: u64,
    /// Chunks discarded because the link was down at the gate check.
    pub chunks_dropped: u64,
    /// Send attempts that failed mid-write.
    pub send_failures: u64,
}

/// Internal state shared between the session handle and the loop task.
pub(crate) struct SessionState {
    pub running: AtomicBool,
    pub chunks_captured: AtomicU64,
    pub chunks_sent: AtomicU64,
    pub chunks_dropped: AtomicU64,
    pub send_failures: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            chunks_captured: AtomicU64::new(0),
            chunks_sent: AtomicU64::new(0),
            chunks_dropped: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
        }
    }
}

/// Handle to a running streaming session.
///
/// Returned by [`StreamUplinkBuilder::start()`]. The streaming loop runs as
/// a background task until [`stop()`](Session::stop) is called, the source
/// reports a device failure, or the process ends - the loop itself has no
/// terminal state.
///
/// # Example
///
/// ```ignore
/// let session = StreamUplink::builder()
///     .source(source)
///     .channel(channel)
///     .start()?;
///
/// tokio::time::sleep(Duration::from_secs(10)).await;
/// println!("{:?}", session.stats());
/// session.stop().await;
/// ```
///
/// [`StreamUplinkBuilder::start()`]: crate::StreamUplinkBuilder::start
pub struct Session {
    state: Arc<SessionState>,
    loop_handle: Option<JoinHandle<()>>,
}

impl Session {
    pub(crate) fn new(state: Arc<SessionState>, loop_handle: JoinHandle<()>) -> Self {
        Self {
            state,
            loop_handle: Some(loop_handle),
        }
    }

    /// Returns `true` if the streaming loop is still running.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Returns current session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            chunks_captured: self.state.chunks_captured.load(Ordering::SeqCst),
            chunks_sent: self.state.chunks_sent.load(Ordering::SeqCst),
            chunks_dropped: self.state.chunks_dropped.load(Ordering::SeqCst),
            send_failures: self.state.send_failures.load(Ordering::SeqCst),
        }
    }

    /// Stops the streaming loop and waits for it to finish its current
    /// cycle.
    pub async fn stop(mut self) {
        self.state.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.loop_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Dropped without explicit stop() - signal the loop to wind down
        self.state.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_new() {
        let state = SessionState::new();
        assert!(state.running.load(Ordering::SeqCst));
        assert_eq!(state.chunks_captured.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_session_stats_default() {
        let stats = SessionStats::default();
        assert_eq!(stats.chunks_captured, 0);
        assert_eq!(stats.chunks_sent, 0);
        assert_eq!(stats.chunks_dropped, 0);
        assert_eq!(stats.send_failures, 0);
    }
}
