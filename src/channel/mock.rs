//! Mock delivery channel for testing without a network.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::channel::DeliveryChannel;
use crate::{Chunk, SendError};

/// A channel that records every sent payload in memory.
///
/// Can be configured to fail the first N sends, or every send, to exercise
/// the drop-not-crash path of the streaming loop.
///
/// # Example
///
/// ```
/// use stream_uplink::MockChannel;
///
/// let channel = MockChannel::new();
/// let sent = channel.sent_handle();
/// // hand `channel` to the pipeline, inspect `sent` afterwards
/// assert!(sent.lock().is_empty());
/// ```
pub struct MockChannel {
    name: String,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_remaining: Option<usize>,
}

impl MockChannel {
    /// Creates a channel that accepts every send.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_remaining: None,
        }
    }

    /// Creates a channel that fails the first `times` sends with a
    /// transport failure, then succeeds.
    pub fn failing(times: usize) -> Self {
        Self {
            fail_remaining: Some(times),
            ..Self::new()
        }
    }

    /// Creates a channel that fails every send.
    pub fn always_failing() -> Self {
        Self {
            fail_remaining: Some(usize::MAX),
            ..Self::new()
        }
    }

    /// Returns a handle to the recorded payloads, usable after the channel
    /// has been moved into the pipeline.
    pub fn sent_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        self.sent.clone()
    }

    /// Returns the number of successfully sent payloads.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, chunk: &Chunk) -> Result<(), SendError> {
        if let Some(remaining) = self.fail_remaining {
            if remaining > 0 {
                self.fail_remaining = Some(remaining.saturating_sub(1));
                return Err(SendError::transport("intentional failure"));
            }
        }
        self.sent.lock().push(chunk.as_bytes().to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_channel_records_sends() {
        let mut channel = MockChannel::new();
        channel.send(&Chunk::new(vec![1, 2], 0)).await.unwrap();
        channel.send(&Chunk::new(vec![3], 1)).await.unwrap();

        assert_eq!(channel.sent_count(), 2);
        assert_eq!(channel.sent_handle().lock()[0], vec![1, 2]);
    }

    #[tokio::test]
    async fn test_mock_channel_failing_then_succeeding() {
        let mut channel = MockChannel::failing(1);

        let err = channel.send(&Chunk::new(vec![0], 0)).await.unwrap_err();
        assert!(matches!(err, SendError::TransportFailure { .. }));

        channel.send(&Chunk::new(vec![0], 1)).await.unwrap();
        assert_eq!(channel.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_channel_always_failing() {
        let mut channel = MockChannel::always_failing();
        for seq in 0..5 {
            assert!(channel.send(&Chunk::new(vec![0], seq)).await.is_err());
        }
        assert_eq!(channel.sent_count(), 0);
    }
}
