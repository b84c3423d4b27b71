use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use console_synth::audio::buffer::AudioBuffer;
use console_synth::sequencer::{MelodyGenerator, PlayHead, Sequencer, SequencerSettings};
use console_synth::synth::SynthKind;

const SAMPLE_RATE: f64 = 48_000.0;

/// Full callback: MIDI collection, tick iteration, track and synth render
fn bench_sequencer_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequencer_block");

    for kind in [SynthKind::Fm, SynthKind::Rm] {
        for buffer_size in [128usize, 512] {
            let settings = SequencerSettings {
                synth: kind,
                ..SequencerSettings::default()
            };
            let (mut sequencer, handle) = Sequencer::new(&settings).unwrap();
            sequencer.prepare(SAMPLE_RATE, buffer_size);
            handle
                .melody()
                .replace_notes(MelodyGenerator::with_seed(1).generate(&handle.time_signature()));
            handle.start_playback();

            let mut audio = AudioBuffer::new(2, buffer_size);
            group.bench_with_input(
                BenchmarkId::new(kind.to_string(), buffer_size),
                &buffer_size,
                |b, _| {
                    b.iter(|| {
                        sequencer.get_next_audio_block(&mut audio);
                        black_box(audio.channel(0)[0]);
                    });
                },
            );
        }
    }
    group.finish();
}

/// Tick iteration alone, dense ticks over a looped range
fn bench_tick_iteration(c: &mut Criterion) {
    let mut play_head = PlayHead::new();
    play_head.set_tick_time_ms(0.5).unwrap();
    play_head.set_device_callback_duration_ms(512.0 / SAMPLE_RATE * 1000.0);
    play_head.set_looping(0, 192).unwrap();

    c.bench_function("tick_iteration_512", |b| {
        b.iter(|| {
            let sum: u64 = play_head.ticks().map(|(tick, _)| tick).sum();
            play_head.advance_device_buffer();
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_sequencer_block, bench_tick_iteration);
criterion_main!(benches);
