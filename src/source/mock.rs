//! Mock peripheral source for testing without hardware.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::source::PeripheralSource;
use crate::{CaptureError, CaptureFormat, Chunk};

/// A mock source that replays a script of chunks.
///
/// This allows testing the full pipeline without capture hardware, making
/// it suitable for CI environments. Once the script is exhausted, `fetch`
/// reports [`CaptureError::DeviceFailure`], which gives tests a
/// deterministic end-of-run and exercises the fatal-capture-error path.
///
/// # Example
///
/// ```
/// use stream_uplink::MockSource;
///
/// // 10 fixed-size audio chunks of deterministic noise
/// let audio = MockSource::audio(10, Default::default());
///
/// // Variable-length "camera frames"
/// let frames = MockSource::frames(&[500, 12000, 300]);
/// ```
pub struct MockSource {
    name: String,
    script: VecDeque<Vec<u8>>,
    seq: u64,
}

impl MockSource {
    /// Creates a mock source from explicit chunk payloads.
    pub fn with_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            name: "mock".to_string(),
            script: chunks.into(),
            seq: 0,
        }
    }

    /// Creates a mock audio source: `count` chunks of deterministic noise,
    /// each exactly `format.chunk_len_bytes()` bytes.
    pub fn audio(count: usize, format: CaptureFormat) -> Self {
        let chunks = (0..count)
            .map(|i| noise_samples(format.samples_per_chunk, i as u32))
            .map(|samples| Chunk::from_samples(&samples, 0).as_bytes().to_vec())
            .collect();
        Self::with_chunks(chunks)
    }

    /// Creates a mock camera source: one pseudo-JPEG payload per entry in
    /// `lengths`, each of exactly that many bytes.
    pub fn frames(lengths: &[usize]) -> Self {
        let chunks = lengths
            .iter()
            .map(|&len| {
                let mut bytes = vec![0u8; len];
                // JPEG SOI marker so payloads look plausible in captures
                if len >= 2 {
                    bytes[0] = 0xFF;
                    bytes[1] = 0xD8;
                }
                bytes
            })
            .collect();
        Self::with_chunks(chunks)
    }

    /// Sets a custom name for logging.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a chunk payload to the script.
    pub fn push_chunk(&mut self, bytes: Vec<u8>) {
        self.script.push_back(bytes);
    }

    /// Returns the number of chunks remaining in the script.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl PeripheralSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&mut self) -> Result<Chunk, CaptureError> {
        match self.script.pop_front() {
            Some(bytes) => {
                let chunk = Chunk::new(bytes, self.seq);
                self.seq += 1;
                Ok(chunk)
            }
            None => Err(CaptureError::device_failure("mock script exhausted")),
        }
    }
}

/// Generates deterministic pseudo-random samples from a seed.
///
/// Simple LCG so tests can regenerate the exact payloads a source produced.
fn noise_samples(count: usize, seed: u32) -> Vec<i32> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(12345);
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            state as i32
        })
        .collect()
}
