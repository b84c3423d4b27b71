// Format conversion for CPAL output streams
//
// The render path works in planar f32; these helpers write one frame into the
// device's interleaved buffer, converting through cpal's `FromSample<f32>`
// (f32, i16 and u16 devices). Allocation-free.

use cpal::{FromSample, Sample};

/// Write `sample` to every channel of the frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = T::from_sample(sample);
    }
}

/// Write L/R to the first two channels, silence the others.
/// A mono device receives the average of both.
#[inline]
pub fn write_stereo_to_interleaved_frame<T>((left, right): (f32, f32), output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    match output_frame {
        [] => {}
        [mono] => *mono = T::from_sample((left + right) * 0.5),
        [first, second, rest @ ..] => {
            *first = T::from_sample(left);
            *second = T::from_sample(right);
            for channel_sample in rest {
                *channel_sample = T::from_sample(0.0f32);
            }
        }
    }
}

/// Fill an interleaved buffer with the device's silence value
pub fn write_silence<T>(output: &mut [T])
where
    T: Sample,
{
    output.fill(T::EQUILIBRIUM);
}
