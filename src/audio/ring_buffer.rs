// Drop-oldest ring buffer of audio chunks
//
// A bounded FIFO of recent capture chunks shared between the audio callback
// (writer) and the recognition loop (reader). The mutex is held only for the
// append and the snapshot copy, never across FFT work; the capture callback
// therefore blocks for at most one short critical section.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Fixed-capacity FIFO of audio chunks. When full, the oldest chunk is
/// evicted first.
pub struct RingBuffer {
    chunks: Mutex<VecDeque<Vec<f32>>>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity_chunks: usize) -> Self {
        let capacity = capacity_chunks.max(1);
        Self {
            chunks: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Capacity sized to retain `ring_seconds` of audio in chunks of
    /// `chunk_seconds`.
    pub fn for_durations(ring_seconds: f64, chunk_seconds: f64) -> Self {
        let chunks = if chunk_seconds > 0.0 {
            (ring_seconds / chunk_seconds).round() as usize
        } else {
            1
        };
        Self::new(chunks)
    }

    pub fn capacity_chunks(&self) -> usize {
        self.capacity
    }

    /// Append a chunk, evicting the oldest when at capacity. Called from the
    /// capture callback; must not block beyond the lock.
    pub fn push(&self, chunk: Vec<f32>) {
        let mut chunks = self.lock();
        if chunks.len() == self.capacity {
            chunks.pop_front();
        }
        chunks.push_back(chunk);
    }

    /// Copy out the most recent `num_samples` samples in arrival order.
    /// Returns fewer when less audio is buffered; the caller checks the
    /// length.
    pub fn snapshot_last(&self, num_samples: usize) -> Vec<f32> {
        let chunks = self.lock();
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let take = total.min(num_samples);
        let mut out = Vec::with_capacity(take);
        let mut skip = total - take;
        for chunk in chunks.iter() {
            if skip >= chunk.len() {
                skip -= chunk.len();
                continue;
            }
            out.extend_from_slice(&chunk[skip..]);
            skip = 0;
        }
        out
    }

    /// Total buffered samples.
    pub fn len_samples(&self) -> usize {
        self.lock().iter().map(|c| c.len()).sum()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Vec<f32>>> {
        // A panicked writer leaves the data structurally intact; recover.
        self.chunks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
