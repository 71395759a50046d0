//! Delivery channel abstraction and transport framings.
//!
//! A [`DeliveryChannel`] is "send this chunk now" over a connection-oriented
//! transport. Two framings are provided:
//!
//! - [`WebSocketChannel`]: one opaque binary message per chunk
//! - [`MultipartChannel`]: three-phase multipart boundary framing for
//!   discrete frames over a chunked HTTP response
//!
//! Channels never retry and never buffer: a failed send loses exactly that
//! chunk, and the streaming loop moves on.

mod binary;
mod mock;
mod multipart;

pub(crate) use binary::SharedSink;
pub use binary::WebSocketChannel;
pub use mock::MockChannel;
pub use multipart::{ChunkWriter, IoChunkWriter, MultipartChannel};

use async_trait::async_trait;

use crate::{Chunk, SendError};

/// A destination that transmits one chunk per call.
///
/// # Contract
///
/// - `send` has no side effect beyond the network write.
/// - A failed send means this chunk is lost; it does not by itself mean the
///   session is dead - session-level liveness is owned by the connection
///   supervisor, not by this call.
/// - Implementations must not queue the chunk for later.
#[async_trait]
pub trait DeliveryChannel: Send {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Transmits the chunk now.
    async fn send(&mut self, chunk: &Chunk) -> Result<(), SendError>;
}

#[async_trait]
impl DeliveryChannel for Box<dyn DeliveryChannel> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn send(&mut self, chunk: &Chunk) -> Result<(), SendError> {
        (**self).send(chunk).await
    }
}
