//! Configuration types for the uplink pipeline.

use std::time::Duration;

/// The logical connection to one remote consumer.
///
/// At most one endpoint session is active at a time; the pipeline has no
/// multi-client fan-out.
///
/// # Example
///
/// ```
/// use stream_uplink::Endpoint;
///
/// let endpoint = Endpoint::new("10.27.78.151", 42069, "/");
/// assert_eq!(endpoint.ws_url(), "ws://10.27.78.151:42069/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Request path, including the leading slash.
    pub path: String,
}

impl Endpoint {
    /// Creates an endpoint from host, port, and path.
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
        }
    }

    /// Returns the WebSocket URL for this endpoint.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Fixed capture format for the audio variant.
///
/// Every `fetch` on an audio source produces a chunk of exactly
/// `samples_per_chunk` samples at `sample_rate`, so chunk length in bytes
/// and chunk cadence are both compile-time-predictable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per captured chunk.
    pub samples_per_chunk: usize,
}

impl CaptureFormat {
    /// Bytes per sample: 32-bit PCM, matching the I2S capture format.
    pub const BYTES_PER_SAMPLE: usize = 4;

    /// Returns the chunk length in bytes.
    pub fn chunk_len_bytes(&self) -> usize {
        self.samples_per_chunk * Self::BYTES_PER_SAMPLE
    }

    /// Returns the natural capture cadence: how long one chunk's worth of
    /// samples takes to arrive.
    pub fn chunk_duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples_per_chunk as f64 / f64::from(self.sample_rate))
    }
}

impl Default for CaptureFormat {
    /// 16 kHz, 1024 samples per chunk (4096 bytes, 64 ms cadence).
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            samples_per_chunk: 1024,
        }
    }
}

/// Configuration for connection management.
#[derive(Debug, Clone)]
pub struct UplinkConfig {
    /// Delay between connection attempts while blocking on first success.
    ///
    /// Default: 500ms
    pub connect_retry_delay: Duration,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            connect_retry_delay: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ws_url() {
        let endpoint = Endpoint::new("example.local", 8080, "/stream");
        assert_eq!(endpoint.ws_url(), "ws://example.local:8080/stream");
    }

    #[test]
    fn test_capture_format_default() {
        let format = CaptureFormat::default();
        assert_eq!(format.sample_rate, 16000);
        assert_eq!(format.samples_per_chunk, 1024);
        assert_eq!(format.chunk_len_bytes(), 4096);
        assert_eq!(format.chunk_duration(), Duration::from_millis(64));
    }

    #[test]
    fn test_capture_format_zero_rate() {
        let format = CaptureFormat {
            sample_rate: 0,
            samples_per_chunk: 1024,
        };
        assert_eq!(format.chunk_duration(), Duration::ZERO);
    }

    #[test]
    fn test_uplink_config_default() {
        let config = UplinkConfig::default();
        assert_eq!(config.connect_retry_delay, Duration::from_millis(500));
    }
}
