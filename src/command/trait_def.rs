// UndoableCommand trait definition

use crate::sequencer::SequencerHandle;

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Undo failed: {0}")]
    UndoFailed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Trait for commands that support undo/redo
///
/// `execute` stores whatever it replaces so that `undo` can put it back.
/// `execute` is called again on redo, after an `undo`.
///
/// # Example
/// ```no_run
/// use console_synth::command::{CommandError, CommandResult, UndoableCommand};
/// use console_synth::sequencer::SequencerHandle;
///
/// struct StartPlayback {
///     was_stopped: Option<bool>,
/// }
///
/// impl UndoableCommand for StartPlayback {
///     fn execute(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
///         self.was_stopped = Some(sequencer.play_state().is_stopped());
///         sequencer.start_playback();
///         Ok(())
///     }
///
///     fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<()> {
///         match self.was_stopped {
///             Some(true) => sequencer.stop_playback(),
///             Some(false) => {}
///             None => return Err(CommandError::UndoFailed("never executed".into())),
///         }
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         "Start playback".to_string()
///     }
/// }
/// ```
pub trait UndoableCommand: Send {
    fn execute(&mut self, sequencer: &SequencerHandle) -> CommandResult<()>;

    fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<()>;

    /// Human-readable description (e.g., "Add note C4 at tick 0")
    fn description(&self) -> String;
}
