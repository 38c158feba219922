//! Append-only chunk storage for an active recording
//!
//! Chunks arrive from the platform callback in order and are only read back,
//! concatenated, when the session stops.

use std::time::Instant;

/// One block of encoded bytes as delivered by the device.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub bytes: Vec<u8>,
    /// Monotonic timestamp when this chunk was captured
    pub captured_at: Instant,
    /// Sequence number for ordering (monotonically increasing)
    pub sequence: u64,
}

/// Thread-safety: not internally synchronized; the capture sink wraps it in
/// a mutex shared with the callback thread.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<AudioChunk>,
    next_sequence: u64,
    byte_len: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; returns its sequence number. Empty chunks are kept so
    /// sequence numbers match callback invocations.
    pub fn push(&mut self, bytes: Vec<u8>) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.byte_len += bytes.len();
        self.chunks.push(AudioChunk {
            bytes,
            captured_at: Instant::now(),
            sequence,
        });
        sequence
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total bytes across all chunks.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioChunk> {
        self.chunks.iter()
    }

    /// Concatenate every chunk in arrival order.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len);
        for chunk in self.chunks {
            out.extend_from_slice(&chunk.bytes);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_increase() {
        let mut buffer = ChunkBuffer::new();
        assert_eq!(buffer.push(vec![1]), 0);
        assert_eq!(buffer.push(vec![]), 1);
        assert_eq!(buffer.push(vec![2, 3]), 2);
        assert_eq!(buffer.len(), 3);
        let seqs: Vec<u64> = buffer.iter().map(|c| c.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn concatenates_in_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1, 2]);
        buffer.push(vec![3]);
        buffer.push(vec![4, 5, 6]);
        assert_eq!(buffer.byte_len(), 6);
        assert_eq!(buffer.into_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_buffer_yields_no_bytes() {
        let buffer = ChunkBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.into_bytes().is_empty());
    }
}
