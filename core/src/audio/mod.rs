pub mod ring;

pub use ring::{PopOutcome, PushOutcome, SampleRing};

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Accelerated-mode flag shared with the audio callback. While set, the
/// callback plays silence and leaves the ring untouched.
pub type TurboFlag = Arc<AtomicBool>;

/// Default ring size in samples (about 85 ms of 48 kHz stereo).
pub const DEFAULT_RING_CAPACITY: usize = 8192;
