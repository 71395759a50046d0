//! Peripheral source abstraction and capture backends.
//!
//! A [`PeripheralSource`] is anything that can block on "read next chunk"
//! over a capture device. The crate provides two implementations:
//!
//! - [`DeviceSource`]: a CPAL input device feeding a lock-free ring buffer
//! - [`MockSource`]: scripted chunks for tests and CI
//!
//! Implement the trait yourself for other peripherals (a camera frame
//! buffer, a sensor FIFO).

mod device;
mod mock;

pub use device::{AudioDevice, CaptureStream, DeviceSource};
pub use mock::MockSource;

use async_trait::async_trait;

use crate::{CaptureError, Chunk};

/// A blocking "read next chunk" operation over a capture device.
///
/// `fetch` suspends the calling task until the peripheral has a complete
/// chunk - for audio that is one DMA transfer's worth of samples, for a
/// camera it is the next available frame. This suspension is the dominant
/// latency in the streaming loop and sets its natural cadence.
///
/// # Contract
///
/// - Audio variant: every successful `fetch` returns a chunk of the same
///   fixed length at a fixed sample rate.
/// - Camera variant: chunk length varies per call; the returned buffer
///   stays valid and unmodified until the chunk is dropped.
/// - On error the chunk buffer must not be treated as valid. `fetch` does
///   not retry internally - retry policy belongs to the caller, and the
///   streaming loop's policy is to stop.
///
/// # Example
///
/// ```
/// use stream_uplink::{CaptureError, Chunk, PeripheralSource};
/// use async_trait::async_trait;
///
/// struct ZeroSource {
///     seq: u64,
/// }
///
/// #[async_trait]
/// impl PeripheralSource for ZeroSource {
///     fn name(&self) -> &str {
///         "zeros"
///     }
///
///     async fn fetch(&mut self) -> Result<Chunk, CaptureError> {
///         let chunk = Chunk::new(vec![0u8; 4096], self.seq);
///         self.seq += 1;
///         Ok(chunk)
///     }
/// }
/// ```
#[async_trait]
pub trait PeripheralSource: Send {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Reads the next chunk, suspending until one is available.
    async fn fetch(&mut self) -> Result<Chunk, CaptureError>;
}

#[async_trait]
impl PeripheralSource for Box<dyn PeripheralSource> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&mut self) -> Result<Chunk, CaptureError> {
        (**self).fetch().await
    }
}
