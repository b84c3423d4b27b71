// Erreurs de haut niveau

pub use crate::sequencer::SequencerError;

use crate::audio::engine::AudioError;
use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

pub type EngineResult<T> = Result<T, EngineError>;
