// Module audio - Backend CPAL, buffers et étage de sortie temps-réel

pub mod buffer;
pub mod device;
pub mod dsp_utils;
pub mod engine;
pub mod format_conversion;
pub mod parameters;

pub use buffer::AudioBuffer;
pub use device::{AudioDeviceInfo, AudioDeviceManager};
pub use engine::{AudioEngine, AudioEngineOptions, AudioError, OutputRenderer};
pub use parameters::{AtomicF32, MasterVolume};
