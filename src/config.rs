// Engine configuration - RON file under the user config directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::engine::AudioEngineOptions;
use crate::audio::parameters::DEFAULT_MASTER_VOLUME;
use crate::messaging::channels::DEFAULT_NOTIFICATION_CAPACITY;
use crate::midi::collector::DEFAULT_MIDI_QUEUE_CAPACITY;
use crate::sequencer::SequencerSettings;
use crate::sequencer::tempo::DEFAULT_BPM;
use crate::sequencer::time_signature::TimeSignature;
use crate::synth::SynthKind;
use crate::synth::envelope::AdsrParams;
use crate::synth::modulation_synth::DEFAULT_NUM_VOICES;

const CONFIG_DIR_NAME: &str = "console_synth";
const CONFIG_FILE_NAME: &str = "config.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("could not serialize configuration: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    /// Loop the first N bars at start-up; `None` disables looping
    pub loop_bars: Option<u64>,
    pub synth: SynthKind,
    pub num_voices: usize,
    pub envelope: AdsrParams,
    pub master_volume: f32,
    pub audio_device: Option<String>,
    pub buffer_size: Option<u32>,
    /// Opened at start-up when set
    pub midi_input: Option<String>,
    pub midi_queue_capacity: usize,
    pub notification_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: DEFAULT_BPM,
            time_signature: TimeSignature::default(),
            loop_bars: Some(1),
            synth: SynthKind::default(),
            num_voices: DEFAULT_NUM_VOICES,
            envelope: AdsrParams::default(),
            master_volume: DEFAULT_MASTER_VOLUME,
            audio_device: None,
            buffer_size: None,
            midi_input: None,
            midi_queue_capacity: DEFAULT_MIDI_QUEUE_CAPACITY,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// `<config dir>/console_synth/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Default location; a missing file means defaults, a broken one is an error
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text).map_err(io_error)
    }

    pub fn sequencer_settings(&self) -> SequencerSettings {
        SequencerSettings {
            tempo_bpm: self.tempo_bpm,
            time_signature: self.time_signature,
            loop_bars: self.loop_bars,
            synth: self.synth,
            num_voices: self.num_voices,
            envelope: self.envelope,
            midi_queue_capacity: self.midi_queue_capacity,
        }
    }

    pub fn audio_options(&self) -> AudioEngineOptions {
        AudioEngineOptions {
            device_name: self.audio_device.clone(),
            buffer_size: self.buffer_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: EngineConfig = ron::from_str("(tempo_bpm: 128.0, synth: rm)").unwrap();
        assert_eq!(config.tempo_bpm, 128.0);
        assert_eq!(config.synth, SynthKind::Rm);
        assert_eq!(config.num_voices, DEFAULT_NUM_VOICES);
        assert_eq!(config.loop_bars, Some(1));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ron");

        let config = EngineConfig {
            tempo_bpm: 90.0,
            time_signature: TimeSignature::new(3, 4, 96).unwrap(),
            loop_bars: None,
            midi_input: Some("Keystation".to_string()),
            ..EngineConfig::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(EngineConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_time_signature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        fs::write(
            &path,
            "(time_signature: (numerator: 4, denominator: 3, ticks_per_quarter_note: 48))",
        )
        .unwrap();
        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineConfig::load_from(&dir.path().join("absent.ron"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_settings_mapping() {
        let config = EngineConfig::default();
        let settings = config.sequencer_settings();
        assert_eq!(settings.tempo_bpm, config.tempo_bpm);
        assert_eq!(settings.num_voices, config.num_voices);
        assert_eq!(config.audio_options(), AudioEngineOptions::default());
    }
}
