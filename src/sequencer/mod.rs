// Sequencer module
// Musical clock, notes and the per-callback track rendering

pub mod melody;
pub mod melody_generator;
pub mod midi_source;
pub mod note;
pub mod play_head;
pub mod render_context;
#[allow(clippy::module_inception)]
pub mod sequencer;
pub mod tempo;
pub mod time_signature;
pub mod track;
pub mod transport;

pub use melody::Melody;
pub use melody_generator::MelodyGenerator;
pub use midi_source::{MelodyPlayer, MidiSource, TickMark};
pub use note::{Event, Note, NoteError, NoteId};
pub use play_head::{LoopRange, PlayHead, PlayHeadError, Ticks, for_each_tick};
pub use render_context::RenderContext;
pub use sequencer::{
    DEFAULT_NOTE_VELOCITY, Sequencer, SequencerError, SequencerHandle, SequencerSettings,
    SequencerSnapshot, SharedSequencerState,
};
pub use tempo::{Tempo, TempoError};
pub use time_signature::{TimeSignature, TimeSignatureError};
pub use track::{ActiveNotes, Track};
pub use transport::{PlayState, SharedTransport};
