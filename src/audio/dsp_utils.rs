// Utilitaires DSP - Hygiène audio du dernier étage de sortie
//
// Appliqués au mix juste avant la conversion vers le format du device.

/// Seuil sous lequel une valeur est traitée comme un dénormal
const DENORMAL_THRESHOLD: f32 = 1e-15;

/// Flush denormals to zero (anti-dénormaux)
///
/// Les dénormaux peuvent ralentir fortement certains CPU; le release d'une
/// enveloppe en produit naturellement en fin de queue.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Soft clipping avec tanh, sortie toujours dans [-1, 1]
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Smoother 1-pole: y[n] = y[n-1] + α * (x[n] - y[n-1])
///
/// Used on the master volume so that console changes do not click.
#[derive(Debug, Clone)]
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// `time_constant_ms`: temps pour atteindre ~63% de la cible
    ///
    /// ```
    /// use console_synth::audio::dsp_utils::OnePoleSmoother;
    /// let mut smoother = OnePoleSmoother::new(0.5, 10.0, 44100.0);
    /// assert!(smoother.process(1.0) > 0.5);
    /// ```
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let mut smoother = Self {
            current: initial_value,
            coefficient: 1.0,
        };
        smoother.set_time_constant(time_constant_ms, sample_rate);
        smoother
    }

    /// α ≈ 1 / (τ * sr); a zero or invalid constant means no smoothing
    pub fn set_time_constant(&mut self, time_constant_ms: f32, sample_rate: f32) {
        let time_constant_samples = time_constant_ms * 0.001 * sample_rate;
        self.coefficient = if time_constant_samples > 1.0 {
            1.0 / time_constant_samples
        } else {
            1.0
        };
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }

    /// Jump to `value` without smoothing
    pub fn reset(&mut self, value: f32) {
        self.current = value;
    }

    pub fn get(&self) -> f32 {
        self.current
    }
}
