// ModulationSynth - polyphonic FM / RM synth
//
// FM: square carrier phase-modulated by three sines.
// RM: sine carrier ring-modulated by a triangle and a saw.
// MIDI is applied sample-accurately: the block is rendered in segments
// between consecutive events.

use super::envelope::AdsrParams;
use super::oscillator::{ModulationMode, ModulationOscillator, WaveformType};
use super::voice_manager::VoiceManager;
use super::{SynthKind, Synthesizer};
use crate::audio::buffer::AudioBuffer;
use crate::midi::buffer::MidiBuffer;
use crate::midi::event::MidiEvent;

/// CC 123 - All Notes Off
const CC_ALL_NOTES_OFF: u8 = 123;

pub const DEFAULT_NUM_VOICES: usize = 4;

pub struct ModulationSynth {
    kind: SynthKind,
    num_voices: usize,
    adsr: AdsrParams,
    ratios: Vec<f32>,
    sample_rate: f32,
    voices: VoiceManager,
}

impl ModulationSynth {
    pub fn new(kind: SynthKind, num_voices: usize, adsr: AdsrParams) -> Self {
        let ratios = kind.default_ratios().to_vec();
        let sample_rate = 44100.0;
        let voices = build_voices(kind, num_voices, adsr, &ratios, sample_rate);
        Self {
            kind,
            num_voices,
            adsr,
            ratios,
            sample_rate,
            voices,
        }
    }

    pub fn kind(&self) -> SynthKind {
        self.kind
    }

    pub fn ratios(&self) -> &[f32] {
        &self.ratios
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.active_voice_count()
    }

    fn handle_event(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn { note, velocity } => self.voices.note_on(note, velocity),
            MidiEvent::NoteOff { note } => self.voices.note_off(note),
            MidiEvent::ControlChange {
                controller: CC_ALL_NOTES_OFF,
                ..
            } => self.voices.all_notes_off(),
            _ => {}
        }
    }

    fn render(&mut self, audio: &mut AudioBuffer, range: std::ops::Range<usize>) {
        for index in range {
            let sample = self.voices.next_sample();
            audio.add_sample(index, sample);
        }
    }
}

fn build_voices(
    kind: SynthKind,
    num_voices: usize,
    adsr: AdsrParams,
    ratios: &[f32],
    sample_rate: f32,
) -> VoiceManager {
    VoiceManager::new(num_voices, adsr, sample_rate, || match kind {
        SynthKind::Fm => ModulationOscillator::new(
            ModulationMode::Frequency,
            WaveformType::Square,
            &[WaveformType::Sine; 3],
            ratios,
            sample_rate,
        ),
        SynthKind::Rm => ModulationOscillator::new(
            ModulationMode::Ring,
            WaveformType::Sine,
            &[WaveformType::Triangle, WaveformType::Saw],
            ratios,
            sample_rate,
        ),
    })
}

impl Synthesizer for ModulationSynth {
    fn prepare(&mut self, sample_rate: f64, _max_block_size: usize) {
        let sample_rate = sample_rate as f32;
        if sample_rate > 0.0 && sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.voices = build_voices(
                self.kind,
                self.num_voices,
                self.adsr,
                &self.ratios,
                sample_rate,
            );
        }
    }

    fn process(&mut self, audio: &mut AudioBuffer, midi: &MidiBuffer) {
        let num_samples = audio.num_samples();
        let mut position = 0;

        for timed in midi {
            let at = (timed.samples_from_now as usize).min(num_samples);
            self.render(audio, position..at);
            position = at;
            self.handle_event(timed.event);
        }

        self.render(audio, position..num_samples);
    }

    fn release(&mut self) {
        self.voices.kill_all();
    }

    fn set_ratios(&mut self, ratios: &[f32]) {
        for (slot, &ratio) in self.ratios.iter_mut().zip(ratios) {
            *slot = ratio;
        }
        self.voices.set_ratios(&self.ratios);
    }

    fn set_envelope(&mut self, params: AdsrParams) {
        self.adsr = params.sanitized();
        self.voices.set_adsr(self.adsr);
    }
}
