// Voice - Une note jouée

use super::envelope::{AdsrEnvelope, AdsrParams};
use super::oscillator::{ModulationOscillator, Oscillator};

/// Convert MIDI note to frequency: 440 * 2^((note - 69) / 12)
#[inline]
pub fn midi_note_to_frequency(note: u8) -> f32 {
    440.0 * 2_f32.powf((note as f32 - 69.0) / 12.0)
}

pub struct Voice {
    oscillator: ModulationOscillator,
    envelope: AdsrEnvelope,
    note: u8,
    velocity: f32,
    held: bool,
    /// Age counter for voice stealing priority (lower = older)
    age: u64,
}

impl Voice {
    pub fn new(oscillator: ModulationOscillator, adsr: AdsrParams, sample_rate: f32) -> Self {
        Self {
            oscillator,
            envelope: AdsrEnvelope::new(adsr, sample_rate),
            note: 0,
            velocity: 0.0,
            held: false,
            age: 0,
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: u8, age: u64) {
        // Only restart the phase when the voice was silent, to avoid clicks on steals
        if !self.envelope.is_active() {
            self.oscillator.reset();
        }
        self.note = note;
        self.velocity = velocity as f32 / 127.0;
        self.held = true;
        self.age = age;
        self.oscillator.set_frequency(midi_note_to_frequency(note));
        self.envelope.note_on();
    }

    pub fn note_off(&mut self) {
        self.held = false;
        self.envelope.note_off();
    }

    /// Voice is active if envelope is still running (even during release)
    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    /// Key still held (note-on received, no note-off yet)
    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_releasing(&self) -> bool {
        !self.held && self.envelope.is_active()
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn set_adsr(&mut self, params: AdsrParams) {
        self.envelope.set_params(params);
    }

    pub fn set_ratios(&mut self, ratios: &[f32]) {
        self.oscillator.set_ratios(ratios);
    }

    pub fn kill(&mut self) {
        self.held = false;
        self.envelope.reset();
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }
        let envelope_value = self.envelope.process();
        self.oscillator.next_sample() * self.velocity * envelope_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::oscillator::{ModulationMode, WaveformType};

    const SAMPLE_RATE: f32 = 44100.0;

    fn voice() -> Voice {
        let osc = ModulationOscillator::new(
            ModulationMode::Frequency,
            WaveformType::Square,
            &[WaveformType::Sine; 3],
            &[0.125, 0.25, 0.5],
            SAMPLE_RATE,
        );
        Voice::new(osc, AdsrParams::new(0.001, 0.01, 0.8, 0.01), SAMPLE_RATE)
    }

    #[test]
    fn test_midi_note_to_frequency() {
        assert!((midi_note_to_frequency(69) - 440.0).abs() < 0.001);
        assert!((midi_note_to_frequency(81) - 880.0).abs() < 0.01);
        assert!((midi_note_to_frequency(60) - 261.63).abs() < 0.01);
    }

    #[test]
    fn test_idle_voice_is_silent() {
        let mut voice = voice();
        assert!(!voice.is_active());
        assert_eq!(voice.next_sample(), 0.0);
    }

    #[test]
    fn test_note_lifecycle() {
        let mut voice = voice();
        voice.note_on(60, 127, 1);
        assert!(voice.is_held());
        assert_eq!(voice.note(), 60);

        let energy: f32 = (0..1000).map(|_| voice.next_sample().abs()).sum();
        assert!(energy > 0.0);

        voice.note_off();
        assert!(voice.is_releasing());
        for _ in 0..2000 {
            voice.next_sample();
        }
        assert!(!voice.is_active());
    }
}
