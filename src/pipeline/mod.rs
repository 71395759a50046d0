//! The capture-to-network pipeline core.
//!
//! [`StreamingLoop`] ties the pieces together: pull a chunk from the
//! peripheral source, hold it in the single-slot [`FrameSlot`], send it if
//! the connection is believed live, release it, repeat. There is no queue
//! anywhere - the pipeline is strictly single-buffered, trading throughput
//! for bounded memory.

mod frame_slot;
mod streaming;

pub use frame_slot::FrameSlot;
pub use streaming::StreamingLoop;
