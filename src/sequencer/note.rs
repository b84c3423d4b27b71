// Note representation for the sequencer
// A note is a pitch held for a span of ticks; the melody turns it into two events

use std::fmt;

/// Opaque handle to a note inside one melody
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub(crate) u64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("invalid MIDI note number {0} (0-127)")]
    InvalidNoteNumber(u8),

    #[error("invalid MIDI velocity {0} (0-127)")]
    InvalidVelocity(u8),

    #[error("note length must be at least one tick")]
    ZeroLength,
}

/// A musical note in the sequencer, positioned in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    /// MIDI note number (0-127, where 60 = C4)
    note_number: u8,

    /// MIDI velocity (0-127)
    velocity: u8,

    start_ticks: u64,
    length_ticks: u64,
}

impl Note {
    pub fn new(
        note_number: u8,
        velocity: u8,
        start_ticks: u64,
        length_ticks: u64,
    ) -> Result<Self, NoteError> {
        if note_number > 127 {
            return Err(NoteError::InvalidNoteNumber(note_number));
        }
        if velocity > 127 {
            return Err(NoteError::InvalidVelocity(velocity));
        }
        if length_ticks == 0 {
            return Err(NoteError::ZeroLength);
        }

        Ok(Self {
            note_number,
            velocity,
            start_ticks,
            length_ticks,
        })
    }

    pub fn note_number(&self) -> u8 {
        self.note_number
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn start_ticks(&self) -> u64 {
        self.start_ticks
    }

    pub fn length_ticks(&self) -> u64 {
        self.length_ticks
    }

    /// Tick of the note-off
    pub fn end_ticks(&self) -> u64 {
        self.start_ticks.saturating_add(self.length_ticks)
    }

    /// Note-on at the start tick, note-off at the end tick
    pub fn events(&self) -> [Event; 2] {
        [
            Event {
                note_number: self.note_number,
                velocity: self.velocity,
                timestamp_ticks: self.start_ticks,
                is_note_on: true,
            },
            Event {
                note_number: self.note_number,
                velocity: 0,
                timestamp_ticks: self.end_ticks(),
                is_note_on: false,
            },
        ]
    }

    /// Get the note name (e.g., "C4", "A#5")
    pub fn note_name(&self) -> String {
        note_name(self.note_number)
    }
}

pub fn note_name(note_number: u8) -> String {
    const NOTE_NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];

    let octave = (note_number / 12) as i32 - 1;
    let note_index = (note_number % 12) as usize;

    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// One scheduled note-on or note-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub note_number: u8,
    pub velocity: u8,
    pub timestamp_ticks: u64,
    pub is_note_on: bool,
}

impl Event {
    /// Sort key of the melody snapshot: by tick, note-offs before note-ons
    pub(crate) fn order_key(&self) -> (u64, bool, u8) {
        (self.timestamp_ticks, self.is_note_on, self.note_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation() {
        let note = Note::new(60, 100, 48, 24).unwrap();

        assert_eq!(note.note_number(), 60);
        assert_eq!(note.velocity(), 100);
        assert_eq!(note.start_ticks(), 48);
        assert_eq!(note.length_ticks(), 24);
        assert_eq!(note.end_ticks(), 72);
    }

    #[test]
    fn test_note_events() {
        let note = Note::new(64, 90, 10, 5).unwrap();
        let [on, off] = note.events();

        assert!(on.is_note_on);
        assert_eq!(on.timestamp_ticks, 10);
        assert_eq!(on.velocity, 90);

        assert!(!off.is_note_on);
        assert_eq!(off.timestamp_ticks, 15);
        assert_eq!(off.note_number, 64);
    }

    #[test]
    fn test_note_name() {
        // Middle C (C4) = MIDI note 60
        assert_eq!(Note::new(60, 100, 0, 1).unwrap().note_name(), "C4");
        // A4 (440 Hz) = MIDI note 69
        assert_eq!(Note::new(69, 100, 0, 1).unwrap().note_name(), "A4");
        assert_eq!(note_name(73), "C#5");
        assert_eq!(note_name(0), "C-1");
    }

    #[test]
    fn test_invalid_notes() {
        assert_eq!(Note::new(128, 100, 0, 1), Err(NoteError::InvalidNoteNumber(128)));
        assert_eq!(Note::new(60, 128, 0, 1), Err(NoteError::InvalidVelocity(128)));
        assert_eq!(Note::new(60, 100, 0, 0), Err(NoteError::ZeroLength));
    }

    #[test]
    fn test_note_off_sorts_first_at_equal_tick() {
        let first = Note::new(60, 100, 0, 10).unwrap();
        let second = Note::new(60, 100, 10, 10).unwrap();
        let off = first.events()[1];
        let on = second.events()[0];
        assert!(off.order_key() < on.order_key());
    }
}
