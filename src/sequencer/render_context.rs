// Per-callback view handed to the track

use super::play_head::PlayHead;
use super::time_signature::TimeSignature;
use super::transport::PlayState;
use crate::audio::buffer::AudioBuffer;
use crate::midi::buffer::MidiBuffer;

/// Everything one block of rendering needs. Built at the start of the device
/// callback and dropped before it returns.
pub struct RenderContext<'a> {
    pub audio: &'a mut AudioBuffer,
    /// Live MIDI collected for this block
    pub external_midi: &'a MidiBuffer,
    pub play_head: &'a PlayHead,
    pub time_signature: &'a TimeSignature,
    pub play_state: PlayState,
    pub sample_rate: f64,
}

impl RenderContext<'_> {
    pub fn num_samples(&self) -> usize {
        self.audio.num_samples()
    }

    pub fn is_stopped(&self) -> bool {
        self.play_state.is_stopped()
    }

    pub fn is_exporting(&self) -> bool {
        self.play_state.is_exporting()
    }
}
