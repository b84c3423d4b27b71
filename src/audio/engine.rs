// Moteur audio - Callback CPAL temps-réel
//
// # Format Support
//
// Le stream est construit dans le format préféré du device (F32, I16 ou U16).
// Tout le rendu se fait en f32 planaire dans un `AudioBuffer`, puis chaque frame
// est convertie au moment de l'écriture dans le buffer interleaved du device.
//
// # Stream Limitations
//
// Sur macOS (CoreAudio) le `Stream` n'est pas Send : l'`AudioEngine` doit rester
// sur le thread qui l'a créé. Les erreurs de stream sont journalisées et envoyées
// à la console comme notifications ; il n'y a pas de reconnexion automatique.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::Producer;

use crate::audio::buffer::AudioBuffer;
use crate::audio::device::AudioDeviceManager;
use crate::audio::dsp_utils::{OnePoleSmoother, flush_denormals_to_zero, soft_clip};
use crate::audio::format_conversion::{write_silence, write_stereo_to_interleaved_frame};
use crate::audio::parameters::MasterVolume;
use crate::messaging::channels::NotificationProducer;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::sequencer::Sequencer;

/// Buffer size assumed when the device does not report a fixed one
pub const DEFAULT_BUFFER_FRAMES: usize = 512;

/// Volume smoothing time constant (10ms évite les clics)
const VOLUME_SMOOTHING_MS: f32 = 10.0;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoDevice,

    #[error("audio output device '{0}' not found")]
    DeviceNotFound(String),

    #[error("could not read the device configuration: {0}")]
    Config(String),

    #[error("unsupported sample format {0} (supported: f32, i16, u16)")]
    UnsupportedFormat(String),

    #[error("could not build the output stream: {0}")]
    BuildStream(String),

    #[error("could not start the output stream: {0}")]
    PlayStream(String),
}

/// Stream options chosen by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioEngineOptions {
    /// Output device name; `None` uses the host default
    pub device_name: Option<String>,
    /// Fixed buffer size in frames; `None` lets the device decide
    pub buffer_size: Option<u32>,
}

/// Everything the device callback owns: the sequencer plus the output stage
/// (volume smoothing, denormal flush, soft clip, format conversion).
pub struct OutputRenderer {
    sequencer: Sequencer,
    buffer: AudioBuffer,
    volume: MasterVolume,
    smoother: OnePoleSmoother,
}

impl OutputRenderer {
    pub fn new(sequencer: Sequencer, volume: MasterVolume, sample_rate: f32) -> Self {
        let initial = volume.get();
        Self {
            sequencer,
            buffer: AudioBuffer::new(2, DEFAULT_BUFFER_FRAMES),
            volume,
            smoother: OnePoleSmoother::new(initial, VOLUME_SMOOTHING_MS, sample_rate),
        }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    /// Render one callback into an interleaved device buffer
    pub fn render_interleaved<T>(&mut self, data: &mut [T], channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        if channels == 0 {
            return;
        }
        let num_frames = data.len() / channels;

        // Grows only when the device hands a larger block than ever before
        self.buffer.resize(2, num_frames);
        self.sequencer.get_next_audio_block(&mut self.buffer);

        for (index, frame) in data.chunks_mut(channels).enumerate() {
            if index >= num_frames {
                write_silence(frame);
                continue;
            }
            let gain = self.smoother.process(self.volume.get());
            let left = flush_denormals_to_zero(self.buffer.sample_or_mono(0, index)) * gain;
            let right = flush_denormals_to_zero(self.buffer.sample_or_mono(1, index)) * gain;

            write_stereo_to_interleaved_frame((soft_clip(left), soft_clip(right)), frame);
        }
    }
}

pub struct AudioEngine {
    _stream: Stream,
    device_name: String,
    sample_rate: f32,
    channels: usize,
    volume: MasterVolume,
}

impl AudioEngine {
    /// Open the output device, prepare the sequencer for its format and start the stream
    pub fn start(
        mut sequencer: Sequencer,
        options: &AudioEngineOptions,
        volume: MasterVolume,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Self, AudioError> {
        let manager = AudioDeviceManager::new();
        let device = match &options.device_name {
            Some(name) => manager
                .output_device_by_name(name)
                .ok_or_else(|| AudioError::DeviceNotFound(name.clone()))?,
            None => manager
                .default_output_device()
                .ok_or(AudioError::NoDevice)?,
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Audio device: {}", device_name);

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        log::debug!("Audio config: {:?}", supported_config);

        let mut config: StreamConfig = supported_config.into();
        if let Some(frames) = options.buffer_size {
            config.buffer_size = cpal::BufferSize::Fixed(frames);
        }

        let buffer_frames = match config.buffer_size {
            cpal::BufferSize::Fixed(size) => size as usize,
            cpal::BufferSize::Default => DEFAULT_BUFFER_FRAMES,
        };

        sequencer.prepare(sample_rate as f64, buffer_frames);
        let renderer = OutputRenderer::new(sequencer, volume.clone(), sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                renderer,
                Arc::clone(&notification_tx),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                renderer,
                Arc::clone(&notification_tx),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                renderer,
                Arc::clone(&notification_tx),
            ),
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))?;

        log::info!(
            "Audio engine started: {} Hz, {} channels, {:?} format",
            sample_rate,
            channels,
            sample_format
        );

        if let Ok(mut tx) = notification_tx.try_lock() {
            let _ = tx.try_push(Notification::info(
                NotificationCategory::Audio,
                format!("Audio connected: {} @ {} Hz", device_name, sample_rate),
            ));
        }

        Ok(Self {
            _stream: stream,
            device_name,
            sample_rate,
            channels,
            volume,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn volume(&self) -> &MasterVolume {
        &self.volume
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut renderer: OutputRenderer,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // ========== SACRED ZONE ==========
                    // No allocations, No I/O, No logging
                    renderer.render_interleaved(data, channels);
                    // ========== SACRED ZONE END ==========
                },
                move |err| {
                    // ========== ERROR CALLBACK ==========
                    // Runs outside the render path, I/O is fine here
                    log::error!("Audio stream error: {}", err);

                    if let Ok(mut tx) = notification_tx.try_lock() {
                        let _ = tx.try_push(Notification::error(
                            NotificationCategory::Audio,
                            format!("Audio stream error: {}", err),
                        ));
                    }
                },
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::SequencerSettings;

    fn renderer(volume: f32) -> (OutputRenderer, crate::sequencer::SequencerHandle) {
        let (mut sequencer, handle) = Sequencer::new(&SequencerSettings::default()).unwrap();
        sequencer.prepare(48_000.0, 256);
        (
            OutputRenderer::new(sequencer, MasterVolume::new(volume), 48_000.0),
            handle,
        )
    }

    #[test]
    fn test_silent_when_stopped() {
        let (mut renderer, _handle) = renderer(1.0);
        let mut data = [1.0f32; 512];
        renderer.render_interleaved(&mut data, 2);
        assert!(data.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_playing_note_reaches_output_within_bounds() {
        let (mut renderer, handle) = renderer(1.0);
        handle.add_note(69, 0).unwrap();
        handle.start_playback();

        let mut data = [0i16; 512];
        let mut heard = false;
        for _ in 0..8 {
            renderer.render_interleaved(&mut data, 2);
            heard |= data.iter().any(|&s| s != 0);
        }
        assert!(heard);
    }

    #[test]
    fn test_zero_volume_mutes() {
        let (mut renderer, handle) = renderer(0.0);
        handle.add_note(69, 0).unwrap();
        handle.start_playback();

        let mut data = [0.0f32; 256];
        for _ in 0..4 {
            renderer.render_interleaved(&mut data, 1);
            assert!(data.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_block_size_follows_device() {
        let (mut renderer, _handle) = renderer(0.5);
        let mut data = [0.0f32; 3 * 100];
        renderer.render_interleaved(&mut data, 3);
        assert_eq!(renderer.buffer().num_samples(), 100);
    }
}
