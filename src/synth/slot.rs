// SynthSlot - the track's synthesizer, swappable from the control thread
//
// One mutex guards the instance together with its kind tag and the settings a
// replacement must inherit. Switching builds and prepares the new synth with the
// lock released, swaps it in, then releases the old one after unlocking.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::envelope::AdsrParams;
use super::modulation_synth::{DEFAULT_NUM_VOICES, ModulationSynth};
use super::{SynthError, SynthKind, Synthesizer, validate_ratios};
use crate::audio::buffer::AudioBuffer;
use crate::midi::buffer::MidiBuffer;

#[derive(Debug, Clone, Copy)]
struct SlotSettings {
    sample_rate: f64,
    max_block_size: usize,
    num_voices: usize,
    envelope: AdsrParams,
}

struct SlotInner {
    /// `None` when a custom synthesizer was installed
    kind: Option<SynthKind>,
    synth: Box<dyn Synthesizer>,
    settings: SlotSettings,
}

pub struct SynthSlot {
    inner: Mutex<SlotInner>,
}

impl SynthSlot {
    pub fn new(kind: SynthKind, num_voices: usize, envelope: AdsrParams) -> Self {
        let settings = SlotSettings {
            sample_rate: 0.0,
            max_block_size: 0,
            num_voices,
            envelope,
        };
        Self {
            inner: Mutex::new(SlotInner {
                kind: Some(kind),
                synth: Box::new(ModulationSynth::new(kind, num_voices, envelope)),
                settings,
            }),
        }
    }

    /// Slot holding an arbitrary synthesizer (tests, offline tools)
    pub fn custom(synth: Box<dyn Synthesizer>) -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                kind: None,
                synth,
                settings: SlotSettings {
                    sample_rate: 0.0,
                    max_block_size: 0,
                    num_voices: DEFAULT_NUM_VOICES,
                    envelope: AdsrParams::default(),
                },
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        // A panic while rendering must not take the audio thread down with it
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self) -> Option<SynthKind> {
        self.lock().kind
    }

    pub fn prepare(&self, sample_rate: f64, max_block_size: usize) {
        let mut inner = self.lock();
        inner.settings.sample_rate = sample_rate;
        inner.settings.max_block_size = max_block_size;
        inner.synth.prepare(sample_rate, max_block_size);
    }

    pub fn release(&self) {
        self.lock().synth.release();
    }

    /// Render one block (audio thread)
    pub fn process(&self, audio: &mut AudioBuffer, midi: &MidiBuffer) {
        self.lock().synth.process(audio, midi);
    }

    /// Replace the synth with a fresh one of `kind`.
    /// Returns false when that kind is already installed.
    pub fn switch(&self, kind: SynthKind) -> bool {
        let settings = {
            let inner = self.lock();
            if inner.kind == Some(kind) {
                return false;
            }
            inner.settings
        };

        let mut replacement: Box<dyn Synthesizer> =
            Box::new(ModulationSynth::new(kind, settings.num_voices, settings.envelope));
        if settings.sample_rate > 0.0 {
            replacement.prepare(settings.sample_rate, settings.max_block_size);
        }

        self.install(Some(kind), replacement);
        log::info!("Synth switched to {}", kind);
        true
    }

    /// Install an arbitrary synthesizer, preparing it with the current settings
    pub fn replace(&self, mut synth: Box<dyn Synthesizer>) {
        let settings = self.lock().settings;
        if settings.sample_rate > 0.0 {
            synth.prepare(settings.sample_rate, settings.max_block_size);
        }
        self.install(None, synth);
    }

    fn install(&self, kind: Option<SynthKind>, synth: Box<dyn Synthesizer>) {
        let mut old = {
            let mut inner = self.lock();
            inner.kind = kind;
            std::mem::replace(&mut inner.synth, synth)
        };
        old.release();
    }

    pub fn set_ratios(&self, ratios: &[f64]) -> Result<(), SynthError> {
        let ratios = validate_ratios(ratios)?;
        self.lock().synth.set_ratios(&ratios);
        Ok(())
    }

    pub fn set_envelope(&self, params: AdsrParams) {
        let params = params.sanitized();
        let mut inner = self.lock();
        inner.settings.envelope = params;
        inner.synth.set_envelope(params);
    }

    pub fn envelope(&self) -> AdsrParams {
        self.lock().settings.envelope
    }
}
