// Module MIDI - Events, per-block buffers, capture queue and input ports

pub mod buffer;
pub mod collector;
pub mod device;
pub mod event;
pub mod input;

pub use buffer::MidiBuffer;
pub use collector::{MidiCollector, MidiQueueProducer, TimedMidiMessage, create_midi_queue};
pub use event::{MidiEvent, MidiEventTimed};
pub use input::{MidiError, MidiInput};
