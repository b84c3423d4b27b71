use std::fmt;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 999.0;
pub const DEFAULT_BPM: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TempoError {
    #[error("tempo {0} BPM is out of range ({MIN_BPM}-{MAX_BPM})")]
    OutOfRange(f64),
}

/// Tempo in BPM (Beats Per Minute), always within [20, 999]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub fn new(bpm: f64) -> Result<Self, TempoError> {
        // NaN fails the range check too
        if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            return Err(TempoError::OutOfRange(bpm));
        }
        Ok(Self { bpm })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// `60000 / (bpm * tpqn)`; zero tpqn is rejected upstream by `TimeSignature`
    pub fn tick_time_ms(&self, ticks_per_quarter_note: u32) -> f64 {
        60_000.0 / (self.bpm * ticks_per_quarter_note as f64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: DEFAULT_BPM }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}
