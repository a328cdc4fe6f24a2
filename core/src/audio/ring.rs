use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Result of [`SampleRing::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The whole (even-truncated) batch was enqueued.
    Accepted(usize),
    /// The batch did not fit and was dropped as a unit; the ring is unchanged.
    Overflow { buffered: usize, rejected: usize },
}

/// Result of [`SampleRing::pop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    /// Every requested sample came from the ring.
    Filled,
    /// Only `available` samples were buffered; the rest of the
    /// destination was filled with silence.
    Underrun { available: usize, requested: usize },
}

struct RingState {
    storage: Box<[i16]>,
    head: usize,
    len: usize,
}

/// Fixed-capacity circular queue of interleaved i16 samples shared between
/// the emulation thread (producer) and the audio callback (consumer).
///
/// Both sides go through one mutex held only for the index bookkeeping and
/// the sample copy. Neither side ever waits on the other's progress: a full
/// ring drops the incoming batch, an empty ring plays silence.
pub struct SampleRing {
    state: Mutex<RingState>,
    capacity: usize,
    len_hint: AtomicUsize,
    overflows: AtomicU64,
    underruns: AtomicU64,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RingState {
                storage: vec![0; capacity].into_boxed_slice(),
                head: 0,
                len: 0,
            }),
            capacity,
            len_hint: AtomicUsize::new(0),
            overflows: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered sample count as of the last push/pop. Lock-free and
    /// possibly stale; meant for on-screen estimates only.
    pub fn len(&self) -> usize {
        self.len_hint.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total batches rejected since creation.
    pub fn overflows(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }

    /// Total `pop` calls that had to pad with silence since creation.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Enqueue a batch of interleaved samples. Producer side only.
    ///
    /// An odd trailing sample is dropped to keep stereo pairs aligned. If
    /// the batch does not fit in the remaining space it is rejected whole.
    pub fn push(&self, samples: &[i16]) -> PushOutcome {
        let count = samples.len() & !1;
        if count == 0 {
            return PushOutcome::Accepted(0);
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.len + count > self.capacity {
            let buffered = state.len;
            drop(state);
            self.overflows.fetch_add(1, Ordering::Relaxed);
            return PushOutcome::Overflow {
                buffered,
                rejected: count,
            };
        }

        let tail = (state.head + state.len) % self.capacity;
        let first = count.min(self.capacity - tail);
        state.storage[tail..tail + first].copy_from_slice(&samples[..first]);
        state.storage[..count - first].copy_from_slice(&samples[first..count]);
        state.len += count;
        self.len_hint.store(state.len, Ordering::Relaxed);

        PushOutcome::Accepted(count)
    }

    /// Fill `out` completely. Consumer side only; never waits.
    ///
    /// Whatever is buffered is consumed in order; any shortfall at the end
    /// of `out` is zero-filled and reported as an underrun.
    pub fn pop(&self, out: &mut [i16]) -> PopOutcome {
        let requested = out.len();
        if requested == 0 {
            return PopOutcome::Filled;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let available = state.len;
        let take = requested.min(available);
        if take > 0 {
            let head = state.head;
            let first = take.min(self.capacity - head);
            out[..first].copy_from_slice(&state.storage[head..head + first]);
            out[first..take].copy_from_slice(&state.storage[..take - first]);
            state.head = (head + take) % self.capacity;
            state.len -= take;
            self.len_hint.store(state.len, Ordering::Relaxed);
        }
        drop(state);

        out[take..].fill(0);
        if take < requested {
            self.underruns.fetch_add(1, Ordering::Relaxed);
            PopOutcome::Underrun {
                available,
                requested,
            }
        } else {
            PopOutcome::Filled
        }
    }
}
