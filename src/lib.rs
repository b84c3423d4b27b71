// console_synth - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod command;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod messaging;
pub mod midi;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::buffer::AudioBuffer;
pub use audio::engine::AudioEngine;
pub use command::{CommandManager, UndoableCommand};
pub use config::EngineConfig;
pub use console::{Console, ConsoleCommand};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use midi::{MidiBuffer, MidiEvent, MidiEventTimed};
pub use sequencer::{
    Melody, Note, NoteId, PlayHead, PlayState, Sequencer, SequencerHandle, SequencerSettings,
    Tempo, TimeSignature, Track,
};
pub use synth::envelope::AdsrParams;
pub use synth::{SynthKind, SynthSlot, Synthesizer};
