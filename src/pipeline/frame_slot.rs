//! Single-slot holding area for the one in-flight chunk.

use crate::Chunk;

/// Holds exactly one chunk between capture and the send attempt.
///
/// The pipeline is strictly single-buffered: at most one chunk is ever
/// "in flight" (captured but not yet released). The strictly sequential
/// streaming loop guarantees `acquire` is never called while a chunk is
/// held; `acquire` asserts that invariant rather than silently dropping
/// the prior chunk.
#[derive(Debug, Default)]
pub struct FrameSlot {
    slot: Option<Chunk>,
}

impl FrameSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the chunk and returns a reference for the send attempt.
    ///
    /// # Panics
    ///
    /// Panics if the prior chunk was not released - that is a bug in the
    /// caller's control flow, not a runtime condition.
    pub fn acquire(&mut self, chunk: Chunk) -> &Chunk {
        assert!(
            self.slot.is_none(),
            "frame slot acquired twice without release"
        );
        self.slot.insert(chunk)
    }

    /// Releases the held chunk, returning ownership to the caller.
    ///
    /// Dropping the returned chunk releases the payload buffer back to the
    /// source (last Arc reference).
    pub fn release(&mut self) -> Option<Chunk> {
        self.slot.take()
    }

    /// Returns `true` if a chunk is currently held.
    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Returns the held chunk, if any.
    pub fn current(&self) -> Option<&Chunk> {
        self.slot.as_ref()
    }
}
