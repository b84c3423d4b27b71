// ADSR Envelope implementation
//
// Linear Attack-Decay-Sustain-Release generator shaping each voice's amplitude.
// Ramps are expressed as per-sample increments so retriggering and releasing
// continue from the current level instead of jumping.

use serde::{Deserialize, Serialize};

const MIN_TIME_SECONDS: f32 = 0.001;
const MAX_TIME_SECONDS: f32 = 5.0;

/// ADSR Envelope parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsrParams {
    /// Attack time in seconds (0.001 to 5.0)
    pub attack: f32,
    /// Decay time in seconds (0.001 to 5.0)
    pub decay: f32,
    /// Sustain level (0.0 to 1.0)
    pub sustain: f32,
    /// Release time in seconds (0.001 to 5.0)
    pub release: f32,
}

impl AdsrParams {
    /// Create ADSR parameters, clamping every value into its valid range
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: clamp_time(attack),
            decay: clamp_time(decay),
            sustain: if sustain.is_finite() { sustain.clamp(0.0, 1.0) } else { 1.0 },
            release: clamp_time(release),
        }
    }

    /// Same values passed through the clamping rules (used after deserializing)
    pub fn sanitized(self) -> Self {
        Self::new(self.attack, self.decay, self.sustain, self.release)
    }
}

fn clamp_time(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.clamp(MIN_TIME_SECONDS, MAX_TIME_SECONDS)
    } else {
        MIN_TIME_SECONDS
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.01, // 10ms attack
            decay: 0.1,   // 100ms decay
            sustain: 0.7, // 70% sustain level
            release: 0.2, // 200ms release
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct AdsrEnvelope {
    params: AdsrParams,
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,
    release_step: f32,
}

impl AdsrEnvelope {
    pub fn new(params: AdsrParams, sample_rate: f32) -> Self {
        Self {
            params: params.sanitized(),
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate,
            release_step: 0.0,
        }
    }

    pub fn set_params(&mut self, params: AdsrParams) {
        self.params = params.sanitized();
    }

    pub fn params(&self) -> AdsrParams {
        self.params
    }

    /// Start (or restart) the attack from the current level
    pub fn note_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    pub fn note_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
            self.release_step = self.level / self.samples(self.params.release);
        }
    }

    fn samples(&self, seconds: f32) -> f32 {
        (seconds * self.sample_rate).max(1.0)
    }

    /// Advance one sample, returning the gain in [0, 1]
    pub fn process(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => self.level = 0.0,
            EnvelopeState::Attack => {
                self.level += 1.0 / self.samples(self.params.attack);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                let sustain = self.params.sustain;
                self.level -= (1.0 - sustain) / self.samples(self.params.decay);
                if self.level <= sustain {
                    self.level = sustain;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => self.level = self.params.sustain,
            EnvelopeState::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 || self.release_step <= 0.0 {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }
        self.level
    }

    /// Active while not idle, including the release tail
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    pub fn is_releasing(&self) -> bool {
        self.state == EnvelopeState::Release
    }

    pub fn current_value(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }
}
