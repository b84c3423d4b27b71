// Atomic parameters - Lock-free communication console ↔ audio thread

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe f32 parameter, stored as its bit pattern
#[derive(Debug, Clone)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

pub const DEFAULT_MASTER_VOLUME: f32 = 0.5;

/// Master gain in [0, 1]; clones share the same value
#[derive(Debug, Clone)]
pub struct MasterVolume(AtomicF32);

impl MasterVolume {
    pub fn new(volume: f32) -> Self {
        Self(AtomicF32::new(clamp_volume(volume)))
    }

    /// Out-of-range values are clamped, NaN is ignored
    pub fn set(&self, volume: f32) {
        if !volume.is_nan() {
            self.0.set(clamp_volume(volume));
        }
    }

    pub fn get(&self) -> f32 {
        self.0.get()
    }
}

impl Default for MasterVolume {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_VOLUME)
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        DEFAULT_MASTER_VOLUME
    } else {
        volume.clamp(0.0, 1.0)
    }
}
