//! # stream-uplink
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Single-buffered capture-to-network streaming.
//!
//! `stream-uplink` forwards a continuous real-time signal - raw PCM audio
//! chunks or pre-encoded JPEG camera frames - over a connection-oriented
//! transport with minimal latency and no unbounded buffering. Connection
//! loss never stalls or corrupts the capture loop: chunks produced while
//! the link is down are dropped, and streaming resumes by itself once the
//! connection is back.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stream_uplink::{
//!     AudioDevice, ConnectionSupervisor, Endpoint, StreamUplink,
//! };
//!
//! let supervisor = ConnectionSupervisor::new(Endpoint::new("10.27.78.151", 42069, "/"));
//! supervisor.connect().await?;   // blocks until the first success
//!
//! let (stream, source) = AudioDevice::open_default()?.start_capture()?;
//!
//! let session = StreamUplink::builder()
//!     .source(source)
//!     .channel(supervisor.channel())
//!     .liveness(supervisor.liveness())
//!     .on_event(|e| tracing::warn!(?e, "uplink event"))
//!     .start()?;
//!
//! // Streaming runs in the background; `stream` must stay alive.
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict boundary between two execution contexts:
//!
//! - **Streaming loop**: a dedicated task doing blocking hardware reads and
//!   best-effort network writes, one chunk in flight at a time
//! - **Connection supervisor**: observes transport events asynchronously
//!   and flips a single atomic liveness flag
//!
//! The flag is the only shared state between the two - the capture cadence
//! never blocks on network events, and a dead connection costs exactly the
//! chunks captured while it was down.

#![warn(missing_docs)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
pub mod channel;
mod chunk;
mod config;
mod error;
mod event;
pub mod pipeline;
mod session;
pub mod source;
mod supervisor;

pub use builder::{StreamUplink, StreamUplinkBuilder};
pub use channel::{
    ChunkWriter, DeliveryChannel, IoChunkWriter, MockChannel, MultipartChannel, WebSocketChannel,
};
pub use chunk::Chunk;
pub use config::{CaptureFormat, Endpoint, UplinkConfig};
pub use error::{CaptureError, SendError, UplinkError};
pub use event::{event_callback, EventCallback, StreamEvent};
pub use pipeline::{FrameSlot, StreamingLoop};
pub use session::{Session, SessionStats};
pub use source::{AudioDevice, CaptureStream, DeviceSource, MockSource, PeripheralSource};
pub use supervisor::{ConnectionState, ConnectionSupervisor, Liveness, TransportEvent};
