// Module synthèse - Oscillateurs, voix et synthés échangeables à chaud
//
// The sequencer only sees the `Synthesizer` trait. The concrete instance lives in a
// `SynthSlot` so the console can swap FM <-> RM while the audio thread renders.

pub mod envelope;
pub mod modulation_synth;
pub mod oscillator;
pub mod slot;
pub mod voice;
pub mod voice_manager;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::buffer::AudioBuffer;
use crate::midi::buffer::MidiBuffer;
use envelope::AdsrParams;

pub use modulation_synth::ModulationSynth;
pub use slot::SynthSlot;

/// Errors raised by synth parameter changes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthError {
    #[error("at least one modulator ratio is required")]
    NoRatios,

    #[error("invalid modulator ratio {0}: ratios must be finite and positive")]
    InvalidRatio(f64),

    #[error("unknown synth type '{0}' (expected fm or rm)")]
    UnknownKind(String),
}

/// Contract between a track and its sound generator
pub trait Synthesizer: Send {
    /// Called before playback and whenever the device format changes
    fn prepare(&mut self, sample_rate: f64, max_block_size: usize);

    /// Add this block's audio to `audio`, applying `midi` at its sample offsets
    fn process(&mut self, audio: &mut AudioBuffer, midi: &MidiBuffer);

    /// Stop every voice and free playback resources
    fn release(&mut self);

    fn set_ratios(&mut self, _ratios: &[f32]) {}

    fn set_envelope(&mut self, _params: AdsrParams) {}
}

/// Which built-in synth occupies a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthKind {
    #[default]
    Fm,
    Rm,
}

impl SynthKind {
    /// Modulator ratios a freshly built synth of this kind starts with
    pub fn default_ratios(self) -> &'static [f32] {
        match self {
            SynthKind::Fm => &[0.125, 0.25, 0.5],
            SynthKind::Rm => &[0.5, 2.0],
        }
    }
}

impl fmt::Display for SynthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthKind::Fm => write!(f, "fm"),
            SynthKind::Rm => write!(f, "rm"),
        }
    }
}

impl FromStr for SynthKind {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fm" => Ok(SynthKind::Fm),
            "rm" => Ok(SynthKind::Rm),
            other => Err(SynthError::UnknownKind(other.to_string())),
        }
    }
}

/// Validate user-supplied ratios and convert them for the oscillators
pub fn validate_ratios(ratios: &[f64]) -> Result<Vec<f32>, SynthError> {
    if ratios.is_empty() {
        return Err(SynthError::NoRatios);
    }
    ratios
        .iter()
        .map(|&r| {
            if r.is_finite() && r > 0.0 {
                Ok(r as f32)
            } else {
                Err(SynthError::InvalidRatio(r))
            }
        })
        .collect()
}
