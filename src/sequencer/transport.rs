// Transport - Playback state shared between console and audio thread

use std::sync::atomic::{AtomicU8, Ordering};

/// Transport state (play/stop/record/export)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PlayState {
    #[default]
    Stopped = 0,
    Playing = 1,
    Recording = 2,
    Exporting = 3,
}

impl PlayState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, PlayState::Stopped)
    }

    /// Playing or Recording
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayState::Playing | PlayState::Recording)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, PlayState::Recording)
    }

    pub fn is_exporting(&self) -> bool {
        matches!(self, PlayState::Exporting)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlayState::Playing,
            2 => PlayState::Recording,
            3 => PlayState::Exporting,
            _ => PlayState::Stopped,
        }
    }
}

impl std::fmt::Display for PlayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlayState::Stopped => "stopped",
            PlayState::Playing => "playing",
            PlayState::Recording => "recording",
            PlayState::Exporting => "exporting",
        };
        f.write_str(name)
    }
}

/// Shared transport state
/// Thread-safe via atomics for communication with audio thread
#[derive(Debug, Default)]
pub struct SharedTransport {
    state: AtomicU8,
}

impl SharedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayState {
        PlayState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: PlayState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn start_playback(&self) {
        self.set_state(PlayState::Playing);
    }

    pub fn stop_playback(&self) {
        self.set_state(PlayState::Stopped);
    }

    pub fn start_recording(&self) {
        self.set_state(PlayState::Recording);
    }

    pub fn start_export(&self) {
        self.set_state(PlayState::Exporting);
    }
}
