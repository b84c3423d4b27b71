// Track - melody + live MIDI into one synthesizer
//
// Runs on the audio thread once per device callback. Besides merging the melody
// with external MIDI, the track keeps the set of sounding notes so that it can cut
// them when the transport stops and when the play head wraps around the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::melody::Melody;
use super::midi_source::{MelodyPlayer, TickMark};
use super::render_context::RenderContext;
use super::transport::PlayState;
use crate::midi::buffer::{DEFAULT_MIDI_BUFFER_CAPACITY, MidiBuffer};
use crate::midi::event::{MidiEvent, MidiEventTimed};
use crate::synth::SynthSlot;

/// Set of sounding MIDI note numbers (one bit per note)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveNotes(u128);

impl ActiveNotes {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn set(&mut self, note: u8, on: bool) {
        let bit = 1u128 << (note & 0x7F);
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn contains(&self, note: u8) -> bool {
        note < 128 && self.0 & (1u128 << note) != 0
    }

    /// Track note messages, ignore everything else
    pub fn apply(&mut self, event: &MidiEvent) {
        match *event {
            MidiEvent::NoteOn { note, .. } => self.set(note, true),
            MidiEvent::NoteOff { note } => self.set(note, false),
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Ascending note numbers
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let bits = self.0;
        (0u8..128).filter(move |&note| bits & (1u128 << note) != 0)
    }
}

/// Seam marks reserved up front; a block rarely wraps more than a few times
const SEAM_CAPACITY: usize = 16;

/// Note-off for every sounding note at `sample`
fn cut_all(buffer: &mut MidiBuffer, active: &mut ActiveNotes, sample: u32) {
    for note in active.iter() {
        buffer.add_event(MidiEvent::NoteOff { note }, sample);
    }
    active.clear();
}

/// Append two sample-ordered runs, melody first on equal samples
fn merge_sorted(
    buffer: &mut MidiBuffer,
    active: &mut ActiveNotes,
    melody: &[MidiEventTimed],
    live: &[MidiEventTimed],
) {
    let (mut melody, mut live) = (melody.iter().peekable(), live.iter().peekable());
    loop {
        let take_live = match (melody.peek(), live.peek()) {
            (Some(m), Some(l)) => l.samples_from_now < m.samples_from_now,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let Some(timed) = (if take_live { live.next() } else { melody.next() }) else {
            break;
        };
        active.apply(&timed.event);
        buffer.add_event(timed.event, timed.samples_from_now);
    }
}

pub struct Track {
    melody_player: MelodyPlayer,
    synth: Arc<SynthSlot>,
    /// Melody events of the current block, before live MIDI and cuts
    sequenced: MidiBuffer,
    /// Where the loop's last tick came round in `sequenced`
    seams: Vec<TickMark>,
    /// What the synth receives
    scratch: MidiBuffer,
    /// Notes sounding at the end of the last rendered block
    active_notes: ActiveNotes,
    record_enabled: Arc<AtomicBool>,
    previous_state: PlayState,
}

impl Track {
    pub fn new(melody: Arc<Melody>, synth: Arc<SynthSlot>, record_enabled: Arc<AtomicBool>) -> Self {
        Self {
            melody_player: MelodyPlayer::new(melody),
            synth,
            sequenced: MidiBuffer::with_capacity(DEFAULT_MIDI_BUFFER_CAPACITY),
            seams: Vec::with_capacity(SEAM_CAPACITY),
            scratch: MidiBuffer::with_capacity(DEFAULT_MIDI_BUFFER_CAPACITY),
            active_notes: ActiveNotes::new(),
            record_enabled,
            previous_state: PlayState::Stopped,
        }
    }

    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.synth.prepare(sample_rate, max_block_size);
        self.sequenced.ensure_capacity(DEFAULT_MIDI_BUFFER_CAPACITY);
        self.scratch.ensure_capacity(DEFAULT_MIDI_BUFFER_CAPACITY);
    }

    pub fn release(&mut self) {
        self.synth.release();
        self.active_notes.clear();
    }

    pub fn render_next_block(&mut self, context: &mut RenderContext<'_>) {
        let num_samples = context.num_samples();
        self.sequenced.clear();
        self.seams.clear();
        self.scratch.clear();

        let play_head = context.play_head;
        if !context.is_stopped() {
            let seam_tick = play_head.loop_end().map(|end| end - 1);
            self.melody_player.fill_marking(
                play_head,
                &mut self.sequenced,
                num_samples,
                seam_tick,
                &mut self.seams,
            );
        }

        let live: &[MidiEventTimed] = if self.is_record_enabled() && !context.is_exporting() {
            let events = context.external_midi.as_slice();
            let end = events.partition_point(|e| (e.samples_from_now as usize) < num_samples);
            &events[..end]
        } else {
            &[]
        };

        self.active_notes = self.merge_with_cuts(context.is_stopped(), live);

        self.synth.process(context.audio, &self.scratch);

        self.previous_state = context.play_state;
    }

    /// Merge melody and live MIDI into the scratch buffer, with the forced
    /// note-offs (transport stop, loop seam) in between. Returns the notes still
    /// sounding at the end of the block.
    fn merge_with_cuts(&mut self, stopped: bool, mut live: &[MidiEventTimed]) -> ActiveNotes {
        let mut active = self.active_notes;

        if !self.previous_state.is_stopped() && stopped {
            cut_all(&mut self.scratch, &mut active, 0);
        }

        let sequenced = self.sequenced.as_slice();
        let mut consumed = 0;
        for seam in &self.seams {
            // Melody up to the seam tick itself, live MIDI up to its sample
            let live_count = live.partition_point(|e| e.samples_from_now <= seam.sample);
            merge_sorted(
                &mut self.scratch,
                &mut active,
                &sequenced[consumed..seam.events],
                &live[..live_count],
            );
            cut_all(&mut self.scratch, &mut active, seam.sample);

            consumed = seam.events;
            live = &live[live_count..];
        }

        merge_sorted(&mut self.scratch, &mut active, &sequenced[consumed..], live);
        active
    }

    /// MIDI sent to the synth during the last block
    pub fn scratch_midi(&self) -> &MidiBuffer {
        &self.scratch
    }

    pub fn active_notes(&self) -> ActiveNotes {
        self.active_notes
    }

    pub fn previous_state(&self) -> PlayState {
        self.previous_state
    }

    pub fn set_record_enabled(&self, enabled: bool) {
        self.record_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_record_enabled(&self) -> bool {
        self.record_enabled.load(Ordering::Acquire)
    }

    /// Flag shared with the control side
    pub fn record_enable_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.record_enabled)
    }

    pub fn synth(&self) -> &Arc<SynthSlot> {
        &self.synth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_notes_set_and_clear() {
        let mut notes = ActiveNotes::new();
        notes.set(0, true);
        notes.set(60, true);
        notes.set(127, true);
        assert_eq!(notes.len(), 3);
        assert!(notes.contains(127));
        assert_eq!(notes.iter().collect::<Vec<_>>(), vec![0, 60, 127]);

        notes.set(60, false);
        assert!(!notes.contains(60));
        notes.clear();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_active_notes_apply_ignores_controllers() {
        let mut notes = ActiveNotes::new();
        notes.apply(&MidiEvent::NoteOn { note: 64, velocity: 80 });
        notes.apply(&MidiEvent::ControlChange { controller: 7, value: 100 });
        assert_eq!(notes.iter().collect::<Vec<_>>(), vec![64]);

        notes.apply(&MidiEvent::NoteOff { note: 64 });
        assert!(notes.is_empty());
    }
}
