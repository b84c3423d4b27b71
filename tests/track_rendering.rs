//! Track rendering tests
//!
//! Drives `Track::render_next_block` with hand-built render contexts and a
//! recording synthesizer, checking the MIDI the synth receives for each block.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use console_synth::audio::buffer::AudioBuffer;
use console_synth::midi::{MidiBuffer, MidiEvent, MidiEventTimed};
use console_synth::sequencer::{
    Melody, Note, PlayHead, PlayState, RenderContext, TimeSignature, Track,
};
use console_synth::synth::{SynthSlot, Synthesizer};

type MidiLog = Arc<Mutex<Vec<Vec<MidiEventTimed>>>>;

/// Keeps every block of MIDI it is handed
struct RecordingSynth {
    blocks: MidiLog,
}

impl Synthesizer for RecordingSynth {
    fn prepare(&mut self, _sample_rate: f64, _max_block_size: usize) {}

    fn process(&mut self, _audio: &mut AudioBuffer, midi: &MidiBuffer) {
        self.blocks.lock().unwrap().push(midi.iter().copied().collect());
    }

    fn release(&mut self) {}
}

const SAMPLE_RATE: f64 = 10_000.0;
const BLOCK: usize = 100;

struct Rig {
    track: Track,
    melody: Arc<Melody>,
    record_enabled: Arc<AtomicBool>,
    blocks: MidiLog,
    audio: AudioBuffer,
    play_head: PlayHead,
    time_signature: TimeSignature,
}

impl Rig {
    /// 1ms ticks, 10ms blocks of 100 samples: tick n of a block is at sample 10n
    fn new() -> Self {
        let blocks = MidiLog::default();
        let melody = Arc::new(Melody::new());
        let synth = Arc::new(SynthSlot::custom(Box::new(RecordingSynth {
            blocks: Arc::clone(&blocks),
        })));
        let record_enabled = Arc::new(AtomicBool::new(true));
        let mut track = Track::new(Arc::clone(&melody), synth, Arc::clone(&record_enabled));
        track.prepare(SAMPLE_RATE, BLOCK);

        let mut play_head = PlayHead::new();
        play_head.set_tick_time_ms(1.0).unwrap();
        play_head.set_device_callback_duration_ms(10.0);

        Self {
            track,
            melody,
            record_enabled,
            blocks,
            audio: AudioBuffer::new(2, BLOCK),
            play_head,
            time_signature: TimeSignature::default(),
        }
    }

    fn render_with(&mut self, state: PlayState, external: &MidiBuffer) -> Vec<MidiEventTimed> {
        let mut context = RenderContext {
            audio: &mut self.audio,
            external_midi: external,
            play_head: &self.play_head,
            time_signature: &self.time_signature,
            play_state: state,
            sample_rate: SAMPLE_RATE,
        };
        self.track.render_next_block(&mut context);
        if !state.is_stopped() {
            self.play_head.advance_device_buffer();
        }
        self.blocks.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn render(&mut self, state: PlayState) -> Vec<MidiEventTimed> {
        self.render_with(state, &MidiBuffer::new())
    }
}

fn on(note: u8, velocity: u8, sample: u32) -> MidiEventTimed {
    MidiEventTimed {
        event: MidiEvent::NoteOn { note, velocity },
        samples_from_now: sample,
    }
}

fn off(note: u8, sample: u32) -> MidiEventTimed {
    MidiEventTimed {
        event: MidiEvent::NoteOff { note },
        samples_from_now: sample,
    }
}

#[test]
fn test_melody_events_at_tick_offsets() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(60, 100, 2, 3).unwrap());

    let midi = rig.render(PlayState::Playing);
    assert_eq!(midi, vec![on(60, 100, 20), off(60, 50)]);
    assert!(rig.track.active_notes().is_empty());
}

#[test]
fn test_note_spanning_blocks_stays_active() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(62, 90, 5, 10).unwrap());

    assert_eq!(rig.render(PlayState::Playing), vec![on(62, 90, 50)]);
    assert!(rig.track.active_notes().contains(62));

    assert_eq!(rig.render(PlayState::Playing), vec![off(62, 50)]);
    assert!(rig.track.active_notes().is_empty());
}

#[test]
fn test_note_off_sorted_before_note_on_on_same_tick() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(60, 100, 4, 4).unwrap());
    rig.melody.add_note(Note::new(60, 100, 0, 4).unwrap());

    let midi = rig.render(PlayState::Playing);
    assert_eq!(
        midi,
        vec![on(60, 100, 0), off(60, 40), on(60, 100, 40), off(60, 80)]
    );
}

#[test]
fn test_stop_cuts_sounding_notes_at_block_start() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(60, 100, 0, 50).unwrap());
    rig.melody.add_note(Note::new(67, 100, 3, 50).unwrap());

    rig.render(PlayState::Playing);
    assert_eq!(rig.track.active_notes().len(), 2);

    let midi = rig.render(PlayState::Stopped);
    assert_eq!(midi, vec![off(60, 0), off(67, 0)]);
    assert!(rig.track.active_notes().is_empty());

    // Already stopped: nothing more to cut
    assert!(rig.render(PlayState::Stopped).is_empty());
}

#[test]
fn test_stop_cut_precedes_live_midi_of_the_same_block() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(60, 100, 0, 50).unwrap());
    rig.render(PlayState::Playing);

    let mut external = MidiBuffer::new();
    external.add_event(MidiEvent::NoteOn { note: 60, velocity: 70 }, 0);
    let midi = rig.render_with(PlayState::Stopped, &external);

    assert_eq!(midi, vec![off(60, 0), on(60, 70, 0)]);
    // The live note keeps sounding while stopped
    assert!(rig.track.active_notes().contains(60));
}

#[test]
fn test_stopped_track_plays_no_melody() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(60, 100, 0, 5).unwrap());
    assert!(rig.render(PlayState::Stopped).is_empty());
    assert_eq!(rig.play_head.current_tick(), 0);
}

#[test]
fn test_loop_seam_cuts_notes_crossing_the_loop_end() {
    let mut rig = Rig::new();
    rig.play_head.set_looping(0, 8).unwrap();
    // Ends after the loop, its note-off is never reached
    rig.melody.add_note(Note::new(60, 100, 6, 10).unwrap());

    // Ticks 0..=7, then 0 and 1; the seam is tick 7 at sample 70
    let midi = rig.render(PlayState::Playing);
    assert_eq!(midi, vec![on(60, 100, 60), off(60, 70)]);
    assert!(rig.track.active_notes().is_empty());
}

#[test]
fn test_loop_seam_keeps_events_on_the_seam_tick_before_the_cut() {
    let mut rig = Rig::new();
    rig.play_head.set_looping(0, 8).unwrap();
    rig.melody.add_note(Note::new(64, 100, 7, 4).unwrap());
    rig.melody.add_note(Note::new(60, 100, 0, 2).unwrap());

    let midi = rig.render(PlayState::Playing);
    assert_eq!(
        midi,
        vec![
            on(60, 100, 0),
            off(60, 20),
            on(64, 100, 70),
            off(64, 70),
            on(60, 100, 80),
        ]
    );
    assert_eq!(rig.track.active_notes().iter().collect::<Vec<_>>(), vec![60]);
}

#[test]
fn test_loop_seam_shorter_than_a_sample_keeps_the_restart() {
    let mut rig = Rig::new();
    // 0.04ms ticks against 0.1ms samples: several ticks share a sample
    rig.play_head.set_tick_time_ms(0.04).unwrap();
    rig.play_head.set_looping(0, 2).unwrap();
    rig.melody.add_note(Note::new(60, 100, 0, 2).unwrap());

    let midi = rig.render(PlayState::Playing);
    // Pass k starts at 0.08k ms; the seam of pass 0 and the restart of
    // pass 1 both floor to sample 0
    assert_eq!(
        &midi[..5],
        &[
            on(60, 100, 0),
            off(60, 0),
            on(60, 100, 0),
            off(60, 1),
            on(60, 100, 1),
        ]
    );
    // Every restart gets its own note-on, every seam its own cut
    assert!(midi.windows(2).all(|w| w[0].event != w[1].event));
}

#[test]
fn test_live_midi_merged_in_sample_order() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(60, 100, 2, 3).unwrap());

    let mut external = MidiBuffer::new();
    external.add_event(MidiEvent::NoteOn { note: 72, velocity: 64 }, 30);
    external.add_event(MidiEvent::NoteOff { note: 72 }, 99);

    let midi = rig.render_with(PlayState::Playing, &external);
    assert_eq!(
        midi,
        vec![on(60, 100, 20), on(72, 64, 30), off(60, 50), off(72, 99)]
    );
}

#[test]
fn test_live_midi_dropped_when_disabled_or_exporting() {
    let mut rig = Rig::new();
    let mut external = MidiBuffer::new();
    external.add_event(MidiEvent::NoteOn { note: 72, velocity: 64 }, 10);

    rig.record_enabled
        .store(false, std::sync::atomic::Ordering::Release);
    assert!(rig.render_with(PlayState::Playing, &external).is_empty());

    rig.record_enabled
        .store(true, std::sync::atomic::Ordering::Release);
    assert!(rig.render_with(PlayState::Exporting, &external).is_empty());
    assert_eq!(
        rig.render_with(PlayState::Recording, &external),
        vec![on(72, 64, 10)]
    );
}

#[test]
fn test_zero_velocity_event_becomes_note_off() {
    let mut rig = Rig::new();
    rig.melody.add_note(Note::new(60, 0, 1, 2).unwrap());

    let midi = rig.render(PlayState::Playing);
    assert_eq!(midi, vec![off(60, 10), off(60, 30)]);
}
