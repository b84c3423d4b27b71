// MidiBuffer - MIDI events for one audio block, ordered by sample offset
//
// Events sharing a sample offset keep their insertion order, so a note-off
// added before a note-on at the same position is also processed first.

use std::ops::Range;

use crate::midi::event::{MidiEvent, MidiEventTimed};

/// Default capacity, large enough for one block of dense sequencer output
pub const DEFAULT_MIDI_BUFFER_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default)]
pub struct MidiBuffer {
    events: Vec<MidiEventTimed>,
}

impl MidiBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MIDI_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Make sure at least `capacity` events fit without reallocating
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if self.events.capacity() < capacity {
            self.events.reserve(capacity - self.events.len());
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Insert an event after every event already at or before `sample`
    pub fn add_event(&mut self, event: MidiEvent, sample: u32) {
        let index = self.events.partition_point(|e| e.samples_from_now <= sample);
        self.events.insert(
            index,
            MidiEventTimed {
                event,
                samples_from_now: sample,
            },
        );
    }

    /// Copy events of `other` whose offset lies in `range`, shifted by `offset`
    pub fn add_events(&mut self, other: &MidiBuffer, range: Range<u32>, offset: i64) {
        for timed in other.iter().filter(|e| range.contains(&e.samples_from_now)) {
            let shifted = (timed.samples_from_now as i64 + offset).max(0) as u32;
            self.add_event(timed.event, shifted);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MidiEventTimed> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[MidiEventTimed] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a MidiBuffer {
    type Item = &'a MidiEventTimed;
    type IntoIter = std::slice::Iter<'a, MidiEventTimed>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
