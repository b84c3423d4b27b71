// Command Pattern for Undo/Redo
//
// Console edits that change the musical content (notes, tempo, synth) go through
// `UndoableCommand` and the `CommandManager`. Commands act on a `SequencerHandle`,
// so they run on the console thread like any other control call and keep what
// they replaced for undo.

pub mod commands;
pub mod manager;
pub mod trait_def;

pub use commands::{
    AddNoteCommand, RemoveNoteCommand, ReplaceMelodyCommand, SetTempoCommand, SwitchSynthCommand,
};
pub use manager::CommandManager;
pub use trait_def::{CommandError, CommandResult, UndoableCommand};
