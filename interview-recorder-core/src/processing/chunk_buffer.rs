/// Append-only buffer of encoded segments, kept in arrival order.
///
/// Concatenation order equals append order; the container format depends
/// on it.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment. Empty segments are ignored; returns whether the
    /// segment was kept.
    pub fn push(&mut self, chunk: Vec<u8>) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    /// Number of segments buffered.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Drain into one payload, leaving the buffer empty.
    pub fn take_payload(&mut self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            payload.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;
        payload
    }

    /// Drop everything buffered.
    pub fn discard(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }
}
