//! Undo/redo integration tests
//!
//! Edits made through the `CommandManager` must be reflected in what the
//! sequencer plays, and undoing them must restore it.

use console_synth::command::{
    AddNoteCommand, CommandManager, RemoveNoteCommand, ReplaceMelodyCommand, SetTempoCommand,
    SwitchSynthCommand,
};
use console_synth::sequencer::{
    MelodyGenerator, Note, Sequencer, SequencerHandle, SequencerSettings, TimeSignature,
};
use console_synth::synth::SynthKind;

fn handle() -> SequencerHandle {
    Sequencer::new(&SequencerSettings::default()).unwrap().1
}

fn numbers(sequencer: &SequencerHandle) -> Vec<u8> {
    sequencer
        .notes()
        .iter()
        .map(|(_, note)| note.note_number())
        .collect()
}

#[test]
fn test_note_edits_undo_in_reverse_order() {
    let sequencer = handle();
    let mut manager = CommandManager::new();

    for (number, start) in [(60, 0), (62, 48), (64, 96)] {
        let note = Note::new(number, 100, start, 48).unwrap();
        manager
            .execute(Box::new(AddNoteCommand::new(note)), &sequencer)
            .unwrap();
    }
    let (second, _) = sequencer.notes()[1];
    manager
        .execute(Box::new(RemoveNoteCommand::new(second)), &sequencer)
        .unwrap();
    assert_eq!(numbers(&sequencer), vec![60, 64]);

    manager.undo(&sequencer).unwrap();
    assert_eq!(numbers(&sequencer).len(), 3);
    manager.undo(&sequencer).unwrap();
    assert_eq!(numbers(&sequencer), vec![60, 62]);

    manager.redo(&sequencer).unwrap();
    manager.redo(&sequencer).unwrap();
    assert_eq!(numbers(&sequencer), vec![60, 64]);
    assert!(!manager.can_redo());

    // All the way back, past the restored note
    while manager.can_undo() {
        manager.undo(&sequencer).unwrap();
    }
    assert!(sequencer.notes().is_empty());

    while manager.can_redo() {
        manager.redo(&sequencer).unwrap();
    }
    assert_eq!(numbers(&sequencer), vec![60, 64]);
}

#[test]
fn test_add_then_remove_undoes_to_empty() {
    let sequencer = handle();
    let mut manager = CommandManager::new();

    let note = Note::new(60, 100, 0, 48).unwrap();
    manager
        .execute(Box::new(AddNoteCommand::new(note)), &sequencer)
        .unwrap();
    let (id, _) = sequencer.notes()[0];
    manager
        .execute(Box::new(RemoveNoteCommand::new(id)), &sequencer)
        .unwrap();

    assert_eq!(
        manager.undo(&sequencer).unwrap(),
        "Remove note C4 at tick 0"
    );
    assert_eq!(sequencer.notes(), vec![(id, note)]);
    assert_eq!(manager.undo(&sequencer).unwrap(), "Add note C4 at tick 0");
    assert!(sequencer.notes().is_empty());
    assert!(!manager.can_undo());
}

#[test]
fn test_add_then_generate_undoes_to_empty() {
    let sequencer = handle();
    let mut manager = CommandManager::new();

    let note = Note::new(60, 100, 0, 48).unwrap();
    manager
        .execute(Box::new(AddNoteCommand::new(note)), &sequencer)
        .unwrap();
    let notes = MelodyGenerator::with_seed(3).generate(&TimeSignature::default());
    manager
        .execute(
            Box::new(ReplaceMelodyCommand::new("Generate melody", notes.clone())),
            &sequencer,
        )
        .unwrap();

    manager.undo(&sequencer).unwrap();
    assert_eq!(numbers(&sequencer), vec![60]);
    manager.undo(&sequencer).unwrap();
    assert!(sequencer.notes().is_empty());

    // Redo both, then step back over the generated melody again
    manager.redo(&sequencer).unwrap();
    manager.redo(&sequencer).unwrap();
    let played: Vec<Note> = sequencer.notes().into_iter().map(|(_, n)| n).collect();
    assert_eq!(played, notes);
    manager.undo(&sequencer).unwrap();
    manager.undo(&sequencer).unwrap();
    assert!(sequencer.notes().is_empty());
}

#[test]
fn test_failed_command_is_not_recorded() {
    let sequencer = handle();
    let mut manager = CommandManager::new();

    manager
        .execute(Box::new(SetTempoCommand::new(120.0)), &sequencer)
        .unwrap();
    assert!(
        manager
            .execute(Box::new(SetTempoCommand::new(1_000.0)), &sequencer)
            .is_err()
    );
    assert_eq!(manager.undo_count(), 1);
    assert_eq!(sequencer.tempo_bpm(), 120.0);

    manager.undo(&sequencer).unwrap();
    assert_eq!(sequencer.tempo_bpm(), 100.0);
}

#[test]
fn test_generated_melody_can_be_undone() {
    let sequencer = handle();
    let mut manager = CommandManager::new();
    sequencer.add_note(48, 0).unwrap();

    let notes = MelodyGenerator::with_seed(11).generate(&TimeSignature::default());
    manager
        .execute(
            Box::new(ReplaceMelodyCommand::new("Generate melody", notes.clone())),
            &sequencer,
        )
        .unwrap();
    let played: Vec<Note> = sequencer.notes().into_iter().map(|(_, n)| n).collect();
    assert_eq!(played, notes);

    manager.undo(&sequencer).unwrap();
    assert_eq!(numbers(&sequencer), vec![48]);
    assert_eq!(
        manager.redo_description().as_deref(),
        Some("Generate melody (8 notes)")
    );
}

#[test]
fn test_synth_switch_history() {
    let sequencer = handle();
    let mut manager = CommandManager::new();

    manager
        .execute(Box::new(SwitchSynthCommand::new(SynthKind::Rm)), &sequencer)
        .unwrap();
    manager
        .execute(Box::new(SwitchSynthCommand::new(SynthKind::Fm)), &sequencer)
        .unwrap();
    manager.undo(&sequencer).unwrap();
    assert_eq!(sequencer.synth_kind(), Some(SynthKind::Rm));
    manager.undo(&sequencer).unwrap();
    assert_eq!(sequencer.synth_kind(), Some(SynthKind::Fm));
}

#[test]
fn test_history_bounded() {
    let sequencer = handle();
    let mut manager = CommandManager::new();

    for i in 0..150u64 {
        let note = Note::new(60, 100, i, 1).unwrap();
        manager
            .execute(Box::new(AddNoteCommand::new(note)), &sequencer)
            .unwrap();
    }
    assert_eq!(manager.undo_count(), 100);

    while manager.can_undo() {
        manager.undo(&sequencer).unwrap();
    }
    // The 50 oldest edits fell out of the history
    assert_eq!(sequencer.notes().len(), 50);
}
