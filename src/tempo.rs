//! Lock-free tempo cell shared between the audio thread and the
//! notification thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// A single `f64` tempo stored as its bit pattern.
///
/// Writers publish with a release store, the audio thread reads with an
/// acquire load. No other field crosses threads, so nothing stronger is
/// required.
#[derive(Debug)]
pub struct TempoCell {
    bits: AtomicU64,
}

impl TempoCell {
    pub fn new(bpm: f64) -> Self {
        Self {
            bits: AtomicU64::new(bpm.to_bits()),
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, bpm: f64) {
        self.bits.store(bpm.to_bits(), Ordering::Release);
    }
}

impl Default for TempoCell {
    fn default() -> Self {
        Self::new(120.0)
    }
}
