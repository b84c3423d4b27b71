// Concrete command implementations

use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use crate::sequencer::{Note, NoteId, SequencerHandle};
use crate::synth::SynthKind;

/// Add one note to the melody. Redo brings the note back under the same id,
/// so later commands referring to it stay valid.
pub struct AddNoteCommand {
    note: Note,
    id: Option<NoteId>,
    in_melody: bool,
}

impl AddNoteCommand {
    pub fn new(note: Note) -> Self {
        Self {
            note,
            id: None,
            in_melody: false,
        }
    }

    /// Id of the note while it is in the melody
    pub fn note_id(&self) -> Option<NoteId> {
        self.id.filter(|_| self.in_melody)
    }
}

impl UndoableCommand for AddNoteCommand {
    fn execute(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        match self.id {
            Some(id) => {
                if !sequencer.melody().restore(id, self.note) {
                    return Err(CommandError::InvalidState(format!(
                        "Note {} is already in the melody",
                        id
                    )));
                }
            }
            None => self.id = Some(sequencer.insert_note(self.note)),
        }
        self.in_melody = true;
        Ok(())
    }

    fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let id = self
            .id
            .filter(|_| self.in_melody)
            .ok_or_else(|| CommandError::UndoFailed("Note was never added".into()))?;
        sequencer
            .remove_note(id)
            .ok_or_else(|| {
                CommandError::UndoFailed(format!("Note {} is no longer in the melody", id))
            })?;
        self.in_melody = false;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Add note {} at tick {}",
            self.note.note_name(),
            self.note.start_ticks()
        )
    }
}

/// Remove one note from the melody
pub struct RemoveNoteCommand {
    id: NoteId,
    removed: Option<Note>,
    in_melody: bool,
}

impl RemoveNoteCommand {
    pub fn new(id: NoteId) -> Self {
        Self {
            id,
            removed: None,
            in_melody: true,
        }
    }
}

impl UndoableCommand for RemoveNoteCommand {
    fn execute(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let note = sequencer
            .remove_note(self.id)
            .ok_or_else(|| CommandError::InvalidState(format!("No note {}", self.id)))?;
        self.removed = Some(note);
        self.in_melody = false;
        Ok(())
    }

    fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let note = self
            .removed
            .filter(|_| !self.in_melody)
            .ok_or_else(|| CommandError::UndoFailed("Nothing was removed".into()))?;
        if !sequencer.melody().restore(self.id, note) {
            return Err(CommandError::UndoFailed(format!(
                "Note {} is already back",
                self.id
            )));
        }
        self.in_melody = true;
        Ok(())
    }

    fn description(&self) -> String {
        match &self.removed {
            Some(note) => format!(
                "Remove note {} at tick {}",
                note.note_name(),
                note.start_ticks()
            ),
            None => format!("Remove note {}", self.id),
        }
    }
}

pub struct SetTempoCommand {
    new_bpm: f64,
    old_bpm: Option<f64>,
}

impl SetTempoCommand {
    pub fn new(bpm: f64) -> Self {
        Self {
            new_bpm: bpm,
            old_bpm: None,
        }
    }
}

impl UndoableCommand for SetTempoCommand {
    fn execute(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let old = sequencer.tempo_bpm();
        sequencer
            .set_tempo_bpm(self.new_bpm)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        self.old_bpm = Some(old);
        Ok(())
    }

    fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let old = self
            .old_bpm
            .ok_or_else(|| CommandError::UndoFailed("No previous tempo stored".into()))?;
        sequencer
            .set_tempo_bpm(old)
            .map_err(|e| CommandError::UndoFailed(e.to_string()))
    }

    fn description(&self) -> String {
        format!("Set tempo to {} BPM", self.new_bpm)
    }
}

pub struct SwitchSynthCommand {
    new_kind: SynthKind,
    old_kind: Option<SynthKind>,
}

impl SwitchSynthCommand {
    pub fn new(kind: SynthKind) -> Self {
        Self {
            new_kind: kind,
            old_kind: None,
        }
    }
}

impl UndoableCommand for SwitchSynthCommand {
    fn execute(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let current = sequencer.synth_kind().ok_or_else(|| {
            CommandError::InvalidState("The track plays a custom synthesizer".into())
        })?;
        self.old_kind = Some(current);
        sequencer.switch_synth(self.new_kind);
        Ok(())
    }

    fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let old = self
            .old_kind
            .ok_or_else(|| CommandError::UndoFailed("No previous synth stored".into()))?;
        sequencer.switch_synth(old);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Switch synth to {}", self.new_kind)
    }
}

/// Swap the whole melody (generate, clear)
pub struct ReplaceMelodyCommand {
    label: String,
    new_notes: Vec<Note>,
    /// Ids the new notes got on the first run, reused on redo
    new_entries: Option<Vec<(NoteId, Note)>>,
    old_entries: Option<Vec<(NoteId, Note)>>,
}

impl ReplaceMelodyCommand {
    pub fn new(label: impl Into<String>, notes: Vec<Note>) -> Self {
        Self {
            label: label.into(),
            new_notes: notes,
            new_entries: None,
            old_entries: None,
        }
    }

    pub fn clear() -> Self {
        Self::new("Clear melody", Vec::new())
    }
}

impl UndoableCommand for ReplaceMelodyCommand {
    fn execute(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let old = sequencer.notes();
        match &self.new_entries {
            Some(entries) => sequencer.melody().replace_entries(entries.iter().copied()),
            None => {
                let ids = sequencer
                    .melody()
                    .replace_notes(self.new_notes.iter().copied());
                let entries = ids.into_iter().zip(self.new_notes.iter().copied());
                self.new_entries = Some(entries.collect());
            }
        }
        self.old_entries = Some(old);
        Ok(())
    }

    fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
        let old = self
            .old_entries
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No previous melody stored".into()))?;
        sequencer.melody().replace_entries(old);
        Ok(())
    }

    fn description(&self) -> String {
        format!("{} ({} notes)", self.label, self.new_notes.len())
    }
}
