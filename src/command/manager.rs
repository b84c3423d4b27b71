// CommandManager - Manages undo/redo stacks

use std::collections::VecDeque;

use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use crate::sequencer::SequencerHandle;

/// Default maximum number of commands to keep in history
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Undo stack and redo stack, most recent at the back.
/// Executing a new command clears the redo stack; the oldest entry is dropped
/// once the history limit is reached.
pub struct CommandManager {
    undo_stack: VecDeque<Box<dyn UndoableCommand>>,
    redo_stack: VecDeque<Box<dyn UndoableCommand>>,
    max_history: usize,
}

impl CommandManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    pub fn with_capacity(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Execute `command` and record it. A failed command is not recorded.
    pub fn execute(
        &mut self,
        mut command: Box<dyn UndoableCommand>,
        sequencer: &SequencerHandle,
    ) -> CommandResult<String> {
        command.execute(sequencer)?;
        let description = command.description();
        log::debug!("Executed: {}", description);

        self.undo_stack.push_back(command);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }

        Ok(description)
    }

    /// Undo the last command and move it to the redo stack
    pub fn undo(&mut self, sequencer: &SequencerHandle) -> CommandResult<String> {
        let mut command = self
            .undo_stack
            .pop_back()
            .ok_or_else(|| CommandError::UndoFailed("Nothing to undo".into()))?;

        let description = command.description();
        if let Err(err) = command.undo(sequencer) {
            // Keep it so the history stays consistent with what is playing
            self.undo_stack.push_back(command);
            return Err(err);
        }

        self.redo_stack.push_back(command);
        if self.redo_stack.len() > self.max_history {
            self.redo_stack.pop_front();
        }
        Ok(description)
    }

    /// Re-execute the last undone command
    pub fn redo(&mut self, sequencer: &SequencerHandle) -> CommandResult<String> {
        let mut command = self
            .redo_stack
            .pop_back()
            .ok_or_else(|| CommandError::ExecutionFailed("Nothing to redo".into()))?;

        let description = command.description();
        if let Err(err) = command.execute(sequencer) {
            self.redo_stack.push_back(command);
            return Err(err);
        }

        self.undo_stack.push_back(command);
        Ok(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|cmd| cmd.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|cmd| cmd.description())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}
