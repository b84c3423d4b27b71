// MIDI event types

/// Channel voice messages understood by the synth and the sequencer.
/// The MIDI channel is ignored: the console synth has a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    ControlChange { controller: u8, value: u8 },
    PitchBend { value: i16 },
}

/// MIDI event placed inside the current audio block.
/// `samples_from_now` is the offset from the block's first sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEventTimed {
    pub event: MidiEvent,
    pub samples_from_now: u32,
}

impl MidiEvent {
    /// Parse a raw MIDI message
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        if data.len() < 2 {
            return None;
        }
        let (first, second) = (data[0] & 0x7F, data[1] & 0x7F);

        match status & 0xF0 {
            // Velocity 0 = Note Off
            0x90 if second == 0 => Some(MidiEvent::NoteOff { note: first }),
            0x90 => Some(MidiEvent::NoteOn {
                note: first,
                velocity: second,
            }),
            0x80 => Some(MidiEvent::NoteOff { note: first }),
            0xB0 => Some(MidiEvent::ControlChange {
                controller: first,
                value: second,
            }),
            0xE0 => {
                let value = ((second as i16) << 7) | first as i16;
                Some(MidiEvent::PitchBend { value })
            }
            _ => None,
        }
    }

    /// Note number for note messages, `None` for everything else
    pub fn note_number(&self) -> Option<u8> {
        match *self {
            MidiEvent::NoteOn { note, .. } | MidiEvent::NoteOff { note } => Some(note),
            _ => None,
        }
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { .. })
    }

    pub fn is_note_off(&self) -> bool {
        matches!(self, MidiEvent::NoteOff { .. })
    }
}
