// Engine - sequencer, audio output and MIDI input wired together

use std::sync::{Arc, Mutex, PoisonError};

use crate::audio::device::AudioDeviceManager;
use crate::audio::engine::AudioEngine;
use crate::audio::parameters::MasterVolume;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::messaging::channels::{
    NotificationConsumer, NotificationProducer, create_notification_channel, drain_notifications,
    send_notification,
};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::midi::device::MidiDeviceManager;
use crate::sequencer::{Sequencer, SequencerHandle};

pub struct Engine {
    sequencer: SequencerHandle,
    audio: Option<AudioEngine>,
    volume: MasterVolume,
    notification_tx: Arc<Mutex<NotificationProducer>>,
    notification_rx: NotificationConsumer,
    audio_devices: AudioDeviceManager,
    midi_devices: MidiDeviceManager,
}

impl Engine {
    /// Build the sequencer, start audio output and open the configured MIDI input.
    /// Missing devices are reported as notifications, only an invalid musical setup fails.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let (sequencer, handle) = Sequencer::new(&config.sequencer_settings())?;
        let mut engine = Self::assemble(&config, handle);

        match AudioEngine::start(
            sequencer,
            &config.audio_options(),
            engine.volume.clone(),
            Arc::clone(&engine.notification_tx),
        ) {
            Ok(audio) => engine.audio = Some(audio),
            Err(e) => {
                log::warn!("Running without audio output: {}", e);
                engine.notify(Notification::warning(
                    NotificationCategory::Audio,
                    format!("No audio output: {}", e),
                ));
            }
        }

        if let Some(name) = &config.midi_input {
            engine.open_configured_midi(name);
        }

        Ok(engine)
    }

    /// Engine with no audio stream; the sequencer state is fully usable but nothing renders
    pub fn without_audio(config: EngineConfig) -> EngineResult<Self> {
        let (_sequencer, handle) = Sequencer::new(&config.sequencer_settings())?;
        Ok(Self::assemble(&config, handle))
    }

    fn assemble(config: &EngineConfig, sequencer: SequencerHandle) -> Self {
        let (notification_tx, notification_rx) =
            create_notification_channel(config.notification_capacity);

        Self {
            sequencer,
            audio: None,
            volume: MasterVolume::new(config.master_volume),
            notification_tx: Arc::new(Mutex::new(notification_tx)),
            notification_rx,
            audio_devices: AudioDeviceManager::new(),
            midi_devices: MidiDeviceManager::new(),
        }
    }

    fn open_configured_midi(&mut self, name: &str) {
        match self.sequencer.open_midi_input(name) {
            Ok(port) => self.notify(Notification::info(
                NotificationCategory::Midi,
                format!("MIDI input connected: {}", port),
            )),
            Err(e) => {
                log::warn!("Could not open MIDI input '{}': {}", name, e);
                self.notify(Notification::warning(
                    NotificationCategory::Midi,
                    format!("MIDI input '{}' unavailable: {}", name, e),
                ));
            }
        }
    }

    pub fn sequencer(&self) -> &SequencerHandle {
        &self.sequencer
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn audio(&self) -> Option<&AudioEngine> {
        self.audio.as_ref()
    }

    /// Output device names, the default one marked with `*`
    pub fn audio_device_names(&self) -> Vec<String> {
        self.audio_devices
            .list_output_devices()
            .into_iter()
            .map(|device| {
                if device.is_default {
                    format!("{} *", device.name)
                } else {
                    device.name
                }
            })
            .collect()
    }

    pub fn midi_device_names(&self) -> Vec<String> {
        self.midi_devices
            .list_input_ports()
            .into_iter()
            .map(|port| port.name)
            .collect()
    }

    pub fn set_master_volume(&self, volume: f32) {
        self.volume.set(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.volume.get()
    }

    pub fn notify(&self, notification: Notification) {
        let mut tx = self
            .notification_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !send_notification(&mut tx, notification) {
            log::debug!("Notification channel full, message dropped");
        }
    }

    /// Notifications queued since the last call, oldest first
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        drain_notifications(&mut self.notification_rx)
    }
}
