//! Error types for stream-uplink.
//!
//! Errors are split into three categories:
//! - **Startup errors** ([`UplinkError`]): prevent the pipeline from starting
//! - **Capture errors** ([`CaptureError`]): fatal to the streaming loop -
//!   there is no software path to repair a dead capture device
//! - **Send errors** ([`SendError`]): never fatal; the chunk is dropped and
//!   the loop proceeds to the next capture cycle

/// Fatal errors that prevent an uplink from starting.
///
/// These are returned from [`StreamUplinkBuilder::start()`] and from device
/// setup. Runtime issues (a failed send, a dropped connection) are surfaced
/// via [`StreamEvent`](crate::StreamEvent) instead.
///
/// [`StreamUplinkBuilder::start()`]: crate::StreamUplinkBuilder::start
#[derive(Debug, thiserror::Error)]
pub enum UplinkError {
    /// No source was configured before starting.
    #[error("no source configured - add a peripheral source before calling start()")]
    NoSourceConfigured,

    /// No delivery channel was configured before starting.
    #[error("no channel configured - add a delivery channel before calling start()")]
    NoChannelConfigured,

    /// The endpoint could not be turned into a valid connection request.
    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// The URL that was rejected.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The requested capture device was not found.
    #[error("device not found: {name}")]
    DeviceNotFound {
        /// Name of the device that wasn't found.
        name: String,
    },

    /// No default capture device is configured on this system.
    #[error("no default capture device configured")]
    NoDefaultDevice,

    /// The device's sample format has no conversion path to 32-bit PCM.
    #[error("unsupported sample format: {format}")]
    UnsupportedFormat {
        /// The format that wasn't supported.
        format: String,
    },

    /// An error from the underlying audio library (CPAL).
    #[error("audio backend error: {0}")]
    BackendError(String),
}

/// A hardware-level capture failure.
///
/// `fetch` returning this means the chunk buffer must not be treated as
/// valid. The streaming loop treats it as fatal: capture state cannot be
/// repaired in software, so the loop ends and the embedding environment
/// decides whether to restart.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The underlying hardware read failed (DMA overrun, sensor disconnect).
    #[error("device failure: {reason}")]
    DeviceFailure {
        /// Description of the hardware-level failure.
        reason: String,
    },
}

impl CaptureError {
    /// Creates a device failure with the given reason.
    pub fn device_failure(reason: impl Into<String>) -> Self {
        Self::DeviceFailure {
            reason: reason.into(),
        }
    }
}

/// A failed delivery attempt.
///
/// Send errors are always recoverable from the pipeline's point of view:
/// the chunk is dropped, never retried (chunks are not queued), and the
/// loop moves on to the next capture cycle.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The liveness flag said connected but the transport has no usable
    /// connection - either the flag was stale or the connection was torn
    /// down between the gate check and the send.
    #[error("not connected")]
    NotConnected,

    /// A write failed part-way, including a partial multipart sequence.
    #[error("transport failure: {reason}")]
    TransportFailure {
        /// Description of the failed write.
        reason: String,
    },
}

impl SendError {
    /// Creates a transport failure with the given reason.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::TransportFailure {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uplink_error_display() {
        let err = UplinkError::DeviceNotFound {
            name: "USB Mic".to_string(),
        };
        assert_eq!(err.to_string(), "device not found: USB Mic");
    }

    #[test]
    fn test_capture_error_helper() {
        let err = CaptureError::device_failure("i2s read overrun");
        assert_eq!(err.to_string(), "device failure: i2s read overrun");
    }

    #[test]
    fn test_send_error_not_connected() {
        assert_eq!(SendError::NotConnected.to_string(), "not connected");
    }

    #[test]
    fn test_send_error_transport_helper() {
        let err = SendError::transport("broken pipe");
        assert_eq!(err.to_string(), "transport failure: broken pipe");
    }
}
