// Voice Manager - Polyphony handling

use super::envelope::AdsrParams;
use super::oscillator::ModulationOscillator;
use super::voice::Voice;

/// Gain applied to the voice sum (gain constant raisonnable)
const MIX_GAIN: f32 = 0.25;

pub struct VoiceManager {
    voices: Vec<Voice>,
    /// Age counter incremented on each note_on for voice stealing priority
    age_counter: u64,
}

impl VoiceManager {
    /// Pre-allocate `num_voices` voices, each built by `make_oscillator`
    pub fn new(
        num_voices: usize,
        adsr: AdsrParams,
        sample_rate: f32,
        mut make_oscillator: impl FnMut() -> ModulationOscillator,
    ) -> Self {
        let voices = (0..num_voices.max(1))
            .map(|_| Voice::new(make_oscillator(), adsr, sample_rate))
            .collect();

        Self {
            voices,
            age_counter: 0,
        }
    }

    pub fn num_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.age_counter = self.age_counter.wrapping_add(1);
        let index = self
            .voices
            .iter()
            .position(|v| !v.is_active())
            .unwrap_or_else(|| self.find_voice_to_steal());
        self.voices[index].note_on(note, velocity, self.age_counter);
    }

    /// Priority (best to worst):
    /// 1. Voice in release phase (already fading out - least perceptible)
    /// 2. Oldest voice (played longest ago)
    fn find_voice_to_steal(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (!v.is_releasing(), v.age()))
            .map_or(0, |(i, _)| i)
    }

    pub fn note_off(&mut self, note: u8) {
        for voice in &mut self.voices {
            if voice.is_held() && voice.note() == note {
                voice.note_off();
            }
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            if voice.is_held() {
                voice.note_off();
            }
        }
    }

    pub fn kill_all(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
    }

    pub fn set_adsr(&mut self, params: AdsrParams) {
        for voice in &mut self.voices {
            voice.set_adsr(params);
        }
    }

    pub fn set_ratios(&mut self, ratios: &[f32]) {
        for voice in &mut self.voices {
            voice.set_ratios(ratios);
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        self.voices.iter_mut().map(|v| v.next_sample()).sum::<f32>() * MIX_GAIN
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn held_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_held()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::oscillator::{ModulationMode, WaveformType};

    const SAMPLE_RATE: f32 = 44100.0;

    fn manager(num_voices: usize) -> VoiceManager {
        VoiceManager::new(num_voices, AdsrParams::default(), SAMPLE_RATE, || {
            ModulationOscillator::new(
                ModulationMode::Ring,
                WaveformType::Sine,
                &[WaveformType::Triangle, WaveformType::Saw],
                &[0.5, 2.0],
                SAMPLE_RATE,
            )
        })
    }

    #[test]
    fn test_voice_allocation() {
        let mut vm = manager(4);
        assert_eq!(vm.active_voice_count(), 0);

        vm.note_on(60, 100);
        vm.note_on(64, 100);
        vm.note_on(67, 100);
        assert_eq!(vm.active_voice_count(), 3);
    }

    #[test]
    fn test_note_off_releases_voice() {
        let mut vm = manager(4);
        vm.note_on(60, 100);
        vm.note_on(64, 100);

        // Avec ADSR, la voix reste active pendant le release
        vm.note_off(64);
        assert_eq!(vm.active_voice_count(), 2);

        // Default release is 0.2s = 8820 samples
        for _ in 0..10000 {
            vm.next_sample();
        }
        assert_eq!(vm.active_voice_count(), 1);
    }

    #[test]
    fn test_voice_stealing_keeps_polyphony() {
        let mut vm = manager(4);
        for i in 0..4 {
            vm.note_on(60 + i, 100);
        }
        vm.note_on(80, 100);
        assert_eq!(vm.active_voice_count(), 4);
        assert!(vm.voices.iter().any(|v| v.note() == 80));
        // Oldest voice (note 60) was stolen
        assert!(!vm.voices.iter().any(|v| v.note() == 60));
    }

    #[test]
    fn test_voice_stealing_prioritizes_releasing() {
        let mut vm = manager(4);
        for i in 0..4 {
            vm.note_on(60 + i, 100);
        }
        vm.note_off(62);
        vm.note_on(90, 100);

        assert!(vm.voices.iter().any(|v| v.note() == 60));
        assert!(!vm.voices.iter().any(|v| v.note() == 62));
    }

    #[test]
    fn test_zero_voices_clamped_to_one() {
        let vm = manager(0);
        assert_eq!(vm.num_voices(), 1);
    }
}
