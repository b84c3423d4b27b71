// MIDI sources - anything that can write a block of sequenced MIDI

use std::sync::Arc;

use super::melody::Melody;
use super::note::Event;
use super::play_head::PlayHead;
use crate::midi::buffer::MidiBuffer;
use crate::midi::event::MidiEvent;

pub trait MidiSource: Send {
    /// Add the events due in the current device buffer at their sample offsets
    fn fill_next_midi_buffer(
        &mut self,
        play_head: &PlayHead,
        buffer: &mut MidiBuffer,
        num_samples: usize,
    );
}

/// Position in a filled buffer right after the events of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickMark {
    /// Number of events written up to and including the marked tick
    pub events: usize,
    pub sample: u32,
}

/// Plays a melody's event snapshot
pub struct MelodyPlayer {
    melody: Arc<Melody>,
}

impl MelodyPlayer {
    pub fn new(melody: Arc<Melody>) -> Self {
        Self { melody }
    }

    pub fn melody(&self) -> &Arc<Melody> {
        &self.melody
    }

    /// Same as `fill_next_midi_buffer`, also recording a mark each time
    /// `marked_tick` comes round. Expects `buffer` to start empty.
    pub fn fill_marking(
        &mut self,
        play_head: &PlayHead,
        buffer: &mut MidiBuffer,
        num_samples: usize,
        marked_tick: Option<u64>,
        marks: &mut Vec<TickMark>,
    ) {
        self.melody.with_events(|events| {
            if events.is_empty() && marked_tick.is_none() {
                return;
            }
            for (tick, offset_ms) in play_head.ticks() {
                let sample = play_head.sample_offset(offset_ms, num_samples);
                if !events.is_empty() {
                    // Snapshot is sorted by tick
                    let first = events.partition_point(|e| e.timestamp_ticks < tick);
                    for event in events[first..]
                        .iter()
                        .take_while(|e| e.timestamp_ticks == tick)
                    {
                        buffer.add_event(to_midi(event), sample);
                    }
                }
                if marked_tick == Some(tick) {
                    marks.push(TickMark {
                        events: buffer.len(),
                        sample,
                    });
                }
            }
        });
    }
}

fn to_midi(event: &Event) -> MidiEvent {
    // velocity 0 note-on is a note-off in MIDI
    if event.is_note_on && event.velocity > 0 {
        MidiEvent::NoteOn {
            note: event.note_number,
            velocity: event.velocity,
        }
    } else {
        MidiEvent::NoteOff {
            note: event.note_number,
        }
    }
}

impl MidiSource for MelodyPlayer {
    fn fill_next_midi_buffer(
        &mut self,
        play_head: &PlayHead,
        buffer: &mut MidiBuffer,
        num_samples: usize,
    ) {
        let mut no_marks = Vec::new();
        self.fill_marking(play_head, buffer, num_samples, None, &mut no_marks);
    }
}
