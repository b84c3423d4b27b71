// Gestion des buffers audio
//
// Planar f32 buffer (one Vec per channel). The active length can shrink and grow
// inside the reserved capacity without touching the allocator, which is what the
// audio callback relies on when the device changes its block size.

#[derive(Debug, Clone)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    num_samples: usize,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            channels: (0..num_channels).map(|_| vec![0.0; num_samples]).collect(),
            num_samples,
        }
    }

    /// Resize to `num_channels` x `num_samples`, zeroing the content.
    /// Only allocates when the request exceeds what was reserved before.
    pub fn resize(&mut self, num_channels: usize, num_samples: usize) {
        self.channels.resize_with(num_channels, Vec::new);
        for channel in &mut self.channels {
            channel.resize(num_samples, 0.0);
        }
        self.num_samples = num_samples;
        self.clear();
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel[..self.num_samples].fill(0.0);
        }
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index][..self.num_samples]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        let len = self.num_samples;
        &mut self.channels[index][..len]
    }

    /// Add `value` to the sample at `index` on every channel
    #[inline]
    pub fn add_sample(&mut self, index: usize, value: f32) {
        for channel in &mut self.channels {
            channel[index] += value;
        }
    }

    /// Mono mix of one frame (moyenne des canaux)
    #[inline]
    pub fn mixdown_frame(&self, index: usize) -> f32 {
        if self.channels.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.channels.iter().map(|c| c[index]).sum();
        sum / self.channels.len() as f32
    }

    /// Read one sample with a fallback for missing channels (mono buffer on a stereo device)
    #[inline]
    pub fn sample_or_mono(&self, channel: usize, index: usize) -> f32 {
        match self.channels.get(channel) {
            Some(samples) => samples[index],
            None => self.channels.first().map_or(0.0, |c| c[index]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_silent() {
        let buffer = AudioBuffer::new(2, 64);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.num_samples(), 64);
        assert!(buffer.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_add_sample_writes_all_channels() {
        let mut buffer = AudioBuffer::new(2, 8);
        buffer.add_sample(3, 0.25);
        buffer.add_sample(3, 0.25);
        assert_eq!(buffer.channel(0)[3], 0.5);
        assert_eq!(buffer.channel(1)[3], 0.5);
        assert_eq!(buffer.mixdown_frame(3), 0.5);
    }

    #[test]
    fn test_resize_shrinks_view_and_clears() {
        let mut buffer = AudioBuffer::new(2, 512);
        buffer.add_sample(10, 1.0);
        buffer.resize(2, 128);
        assert_eq!(buffer.channel(0).len(), 128);
        assert_eq!(buffer.channel(0)[10], 0.0);
    }

    #[test]
    fn test_sample_or_mono_falls_back() {
        let mut buffer = AudioBuffer::new(1, 4);
        buffer.add_sample(1, 0.5);
        assert_eq!(buffer.sample_or_mono(0, 1), 0.5);
        assert_eq!(buffer.sample_or_mono(1, 1), 0.5);
    }
}
