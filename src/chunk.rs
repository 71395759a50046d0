//! Captured payload chunk with metadata.

use std::sync::Arc;

/// One unit of captured payload data moved through the pipeline per cycle.
///
/// A `Chunk` is immutable once captured: the source writes it, every later
/// stage only reads it. Payload bytes are either a fixed-size run of PCM
/// samples (audio variant) or a variable-length pre-encoded image (camera
/// variant) - the pipeline never inspects them.
///
/// Bytes are stored in an `Arc<Vec<u8>>` so cloning a chunk is cheap and
/// "releasing" it back to the source is simply dropping the last reference.
///
/// # Example
///
/// ```
/// use stream_uplink::Chunk;
///
/// let chunk = Chunk::from_samples(&[0i32; 1024], 0);
/// assert_eq!(chunk.len(), 4096);
/// ```
#[derive(Debug, Clone)]
pub struct Chunk {
    bytes: Arc<Vec<u8>>,
    seq: u64,
}

impl Chunk {
    /// Creates a chunk from raw payload bytes.
    ///
    /// `seq` is the logical capture timestamp: a monotonic counter assigned
    /// by the source, one increment per capture cycle.
    pub fn new(bytes: Vec<u8>, seq: u64) -> Self {
        Self {
            bytes: Arc::new(bytes),
            seq,
        }
    }

    /// Creates a chunk from 32-bit PCM samples, serialized little-endian.
    ///
    /// This matches the wire format of a 32-bit I2S capture: each sample
    /// contributes four bytes, so a 1024-sample read becomes a 4096-byte
    /// chunk.
    pub fn from_samples(samples: &[i32], seq: u64) -> Self {
        let mut bytes = Vec::with_capacity(samples.len() * 4);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        Self::new(bytes, seq)
    }

    /// Returns the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the chunk carries no payload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the capture sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}
