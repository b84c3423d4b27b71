// Console - text commands dispatched to the engine
//
// Edits to notes, tempo and the synth type go through the `CommandManager` so
// they can be undone. Transport, device and sound-parameter commands act directly.

pub mod parser;

pub use parser::{ConsoleCommand, HELP, ParseError, parse};

use std::fmt::Write;

use crate::command::{
    AddNoteCommand, CommandManager, RemoveNoteCommand, ReplaceMelodyCommand, SetTempoCommand,
    SwitchSynthCommand, UndoableCommand,
};
use crate::engine::Engine;
use crate::sequencer::{DEFAULT_NOTE_VELOCITY, MelodyGenerator, Note, SequencerHandle};

pub struct Console {
    history: CommandManager,
    generator: MelodyGenerator,
}

impl Console {
    pub fn new() -> Self {
        Self::with_generator(MelodyGenerator::new())
    }

    /// Console with a seeded generator, for reproducible melodies
    pub fn with_generator(generator: MelodyGenerator) -> Self {
        Self {
            history: CommandManager::new(),
            generator,
        }
    }

    pub fn history(&self) -> &CommandManager {
        &self.history
    }

    /// Parse and run one line, returning the text to show
    pub fn handle_line(&mut self, engine: &Engine, line: &str) -> String {
        match parse(line) {
            Ok(command) => self.execute(engine, command),
            Err(e) => e.to_string(),
        }
    }

    pub fn execute(&mut self, engine: &Engine, command: ConsoleCommand) -> String {
        let sequencer = engine.sequencer();

        match command {
            ConsoleCommand::Play => {
                sequencer.start_playback();
                "started playback".into()
            }
            ConsoleCommand::Stop => {
                sequencer.stop_playback();
                "stopped playback".into()
            }
            ConsoleCommand::Record => {
                sequencer.start_recording();
                "started recording".into()
            }
            ConsoleCommand::Tempo(bpm) => self.run(sequencer, SetTempoCommand::new(bpm)),
            ConsoleCommand::AddNote {
                number,
                start,
                length,
                velocity,
            } => {
                let length =
                    length.unwrap_or_else(|| sequencer.time_signature().ticks_per_denominator());
                let velocity = velocity.unwrap_or(DEFAULT_NOTE_VELOCITY);
                match Note::new(number, velocity, start, length) {
                    Ok(note) => self.run(sequencer, AddNoteCommand::new(note)),
                    Err(e) => format!("could not add note: {}", e),
                }
            }
            ConsoleCommand::RemoveNote(index) => match sequencer.notes().get(index) {
                Some((id, _)) => self.run(sequencer, RemoveNoteCommand::new(*id)),
                None => format!("no note at index {}", index),
            },
            ConsoleCommand::ListNotes => list_notes(sequencer),
            ConsoleCommand::ListAudioDevices => bullet_list(&engine.audio_device_names()),
            ConsoleCommand::ListMidiDevices => bullet_list(&engine.midi_device_names()),
            ConsoleCommand::OpenMidi(name) => match sequencer.open_midi_input(&name) {
                Ok(port) => format!("opened MIDI input '{}'", port),
                Err(e) => format!("failed to open '{}': {}", name, e),
            },
            ConsoleCommand::Synth(kind) => self.run(sequencer, SwitchSynthCommand::new(kind)),
            ConsoleCommand::Ratios(ratios) => match sequencer.set_ratios(&ratios) {
                Ok(()) => format!("ratios set to {:?}", ratios),
                Err(e) => e.to_string(),
            },
            ConsoleCommand::Envelope {
                attack,
                decay,
                sustain,
                release,
            } => {
                sequencer.set_envelope(attack, decay, sustain, release);
                let env = sequencer.envelope();
                format!(
                    "envelope set: a {}s d {}s s {} r {}s",
                    env.attack, env.decay, env.sustain, env.release
                )
            }
            ConsoleCommand::Loop(Some(bars)) => match sequencer.set_loop_bars(bars) {
                Ok(()) => format!("looping {} bar(s)", bars),
                Err(e) => e.to_string(),
            },
            ConsoleCommand::Loop(None) => {
                sequencer.clear_looping();
                "looping off".into()
            }
            ConsoleCommand::Generate => {
                let notes = self.generator.generate(&sequencer.time_signature());
                self.run(
                    sequencer,
                    ReplaceMelodyCommand::new("Generate melody", notes),
                )
            }
            ConsoleCommand::Clear => self.run(sequencer, ReplaceMelodyCommand::clear()),
            ConsoleCommand::Volume(volume) => {
                engine.set_master_volume(volume);
                format!("volume set to {:.2}", engine.master_volume())
            }
            ConsoleCommand::Undo => match self.history.undo(sequencer) {
                Ok(description) => format!("undid: {}", description),
                Err(e) => format!("undo failed: {}", e),
            },
            ConsoleCommand::Redo => match self.history.redo(sequencer) {
                Ok(description) => format!("redid: {}", description),
                Err(e) => format!("redo failed: {}", e),
            },
            ConsoleCommand::Help => help_text(),
            ConsoleCommand::Quit => "bye".into(),
        }
    }

    fn run(&mut self, sequencer: &SequencerHandle, command: impl UndoableCommand + 'static) -> String {
        match self.history.execute(Box::new(command), sequencer) {
            Ok(description) => description,
            Err(e) => {
                log::debug!("Command failed: {}", e);
                e.to_string()
            }
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

fn list_notes(sequencer: &SequencerHandle) -> String {
    let notes = sequencer.notes();
    if notes.is_empty() {
        return "melody is empty".into();
    }

    let mut text = String::new();
    for (index, (_, note)) in notes.iter().enumerate() {
        let _ = writeln!(
            text,
            "{:>3}: {:<4} number: {},\tstart: {},\tlength: {},\tvelocity: {}",
            index,
            note.note_name(),
            note.note_number(),
            note.start_ticks(),
            note.length_ticks(),
            note.velocity()
        );
    }
    text
}

fn bullet_list(names: &[String]) -> String {
    if names.is_empty() {
        return "no devices found".into();
    }
    names.iter().fold(String::new(), |mut text, name| {
        let _ = writeln!(text, " - {}", name);
        text
    })
}

pub fn help_text() -> String {
    HELP.iter().fold(String::new(), |mut text, (usage, description)| {
        let _ = writeln!(text, " - {:<42} {}", usage, description);
        text
    })
}
