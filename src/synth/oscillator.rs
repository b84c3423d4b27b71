// Oscillateurs - Générateurs de formes d'onde
//
// SimpleOscillator produces the four basic waveforms. ModulationOscillator stacks
// a carrier with a few modulators tuned at ratios of the played frequency, either
// phase-modulating the carrier (FM) or multiplying with it (RM).

use std::f32::consts::PI;

pub trait Oscillator {
    fn next_sample(&mut self) -> f32;
    fn set_frequency(&mut self, freq: f32);
    fn reset(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WaveformType {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl WaveformType {
    /// Valeur de la forme d'onde pour une phase normalisée dans [0, 1)
    #[inline]
    pub fn evaluate(self, phase: f32) -> f32 {
        match self {
            WaveformType::Sine => (phase * 2.0 * PI).sin(),
            WaveformType::Square => {
                if phase < 0.5 { 1.0 } else { -1.0 }
            }
            WaveformType::Saw => (phase * 2.0) - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 {
                    (phase * 4.0) - 1.0
                } else {
                    3.0 - (phase * 4.0)
                }
            }
        }
    }
}

pub struct SimpleOscillator {
    waveform: WaveformType,
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
}

impl SimpleOscillator {
    pub fn new(waveform: WaveformType, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate,
        }
    }

    pub fn waveform(&self) -> WaveformType {
        self.waveform
    }

    /// Like `next_sample`, reading the waveform `offset` cycles ahead of the phase
    #[inline]
    pub fn next_sample_with_phase_offset(&mut self, offset: f32) -> f32 {
        let sample = self.waveform.evaluate((self.phase + offset).rem_euclid(1.0));
        self.advance();
        sample
    }

    #[inline]
    fn advance(&mut self) {
        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }
}

impl Oscillator for SimpleOscillator {
    fn next_sample(&mut self) -> f32 {
        let sample = self.waveform.evaluate(self.phase);
        self.advance();
        sample
    }

    fn set_frequency(&mut self, freq: f32) {
        // Fréquences négatives ou NaN -> silence plutôt qu'une phase invalide
        let freq = if freq.is_finite() { freq.max(0.0) } else { 0.0 };
        self.phase_increment = (freq / self.sample_rate).min(1.0);
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// How the modulators are combined with the carrier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModulationMode {
    /// Phase modulation of the carrier by the sum of the modulators
    Frequency,
    /// Carrier multiplied by every modulator
    Ring,
}

/// Phase deviation (in cycles) contributed by each FM modulator at full level
const FM_DEPTH_PER_MODULATOR: f32 = 0.25;

pub struct ModulationOscillator {
    mode: ModulationMode,
    carrier: SimpleOscillator,
    modulators: Vec<SimpleOscillator>,
    ratios: Vec<f32>,
    frequency: f32,
}

impl ModulationOscillator {
    pub fn new(
        mode: ModulationMode,
        carrier: WaveformType,
        modulators: &[WaveformType],
        ratios: &[f32],
        sample_rate: f32,
    ) -> Self {
        let mut osc = Self {
            mode,
            carrier: SimpleOscillator::new(carrier, sample_rate),
            modulators: modulators
                .iter()
                .map(|&w| SimpleOscillator::new(w, sample_rate))
                .collect(),
            ratios: vec![1.0; modulators.len()],
            frequency: 0.0,
        };
        osc.set_ratios(ratios);
        osc
    }

    pub fn mode(&self) -> ModulationMode {
        self.mode
    }

    pub fn num_modulators(&self) -> usize {
        self.modulators.len()
    }

    pub fn ratios(&self) -> &[f32] {
        &self.ratios
    }

    /// Copy the first ratios into place; extra values are ignored and
    /// modulators without a new value keep their ratio.
    pub fn set_ratios(&mut self, ratios: &[f32]) {
        for (slot, &ratio) in self.ratios.iter_mut().zip(ratios) {
            *slot = ratio;
        }
        self.retune();
    }

    fn retune(&mut self) {
        self.carrier.set_frequency(self.frequency);
        for (modulator, ratio) in self.modulators.iter_mut().zip(&self.ratios) {
            modulator.set_frequency(self.frequency * ratio);
        }
    }
}

impl Oscillator for ModulationOscillator {
    fn next_sample(&mut self) -> f32 {
        match self.mode {
            ModulationMode::Frequency => {
                let deviation: f32 = self
                    .modulators
                    .iter_mut()
                    .map(|m| m.next_sample() * FM_DEPTH_PER_MODULATOR)
                    .sum();
                self.carrier.next_sample_with_phase_offset(deviation)
            }
            ModulationMode::Ring => self
                .modulators
                .iter_mut()
                .fold(self.carrier.next_sample(), |acc, m| acc * m.next_sample()),
        }
    }

    fn set_frequency(&mut self, freq: f32) {
        self.frequency = freq;
        self.retune();
    }

    fn reset(&mut self) {
        self.carrier.reset();
        for modulator in &mut self.modulators {
            modulator.reset();
        }
    }
}
